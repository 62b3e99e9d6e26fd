//! Deterministic field identity hashes.
//!
//! Identical field semantics on the same domain with the same option list must
//! always hash identically, so every text component is normalized (trimmed,
//! lower-cased, internal whitespace collapsed) before hashing.

use sha2::{Digest, Sha256};

use crate::models::field::FieldDescriptor;

/// Separates hashed components so ("ab", "c") and ("a", "bc") differ.
const UNIT_SEPARATOR: u8 = 0x1f;

/// Trim, lowercase, collapse runs of whitespace to one space.
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn hash_parts<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            hasher.update([UNIT_SEPARATOR]);
        }
        hasher.update(normalize_text(part).as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

pub fn fingerprint(
    domain: &str,
    label: &str,
    name: &str,
    placeholder: &str,
    field_type: &str,
    html_type: &str,
) -> String {
    hash_parts([domain, label, name, placeholder, field_type, html_type])
}

/// Order-preserving hash of the option list. An empty list hashes to a fixed value.
pub fn options_hash(options: &[String]) -> String {
    hash_parts(options.iter().map(String::as_str))
}

/// Identity of one field on one domain: the correction store's primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrectionKey {
    pub domain: String,
    pub fingerprint: String,
    pub options_hash: String,
}

impl CorrectionKey {
    pub fn for_field(domain: &str, field: &FieldDescriptor) -> Self {
        let domain = normalize_domain(domain);
        Self {
            fingerprint: fingerprint(
                &domain,
                &field.label,
                &field.name,
                &field.placeholder,
                &field.tag,
                &field.html_type,
            ),
            options_hash: options_hash(&field.options),
            domain,
        }
    }
}

/// `https://www.Jobs.Acme.com/apply?x=1` → `jobs.acme.com`. Anything that does not
/// parse as a URL is treated as a bare host.
pub fn domain_from_url(raw: &str) -> String {
    match url::Url::parse(raw.trim()) {
        Ok(url) => url.host_str().map(normalize_domain).unwrap_or_default(),
        Err(_) => normalize_domain(raw),
    }
}

pub fn normalize_domain(raw: &str) -> String {
    let host = normalize_text(raw);
    host.strip_prefix("www.").map(String::from).unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_ignores_case_and_whitespace() {
        let a = fingerprint("Acme", "First Name", " first_name ", "", "input", "text");
        let b = fingerprint("Acme", "first name", "first_name", "", "input", "text");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_collapses_internal_whitespace() {
        let a = fingerprint("acme", "First   \n Name", "", "", "input", "text");
        let b = fingerprint("acme", "first name", "", "", "input", "text");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_separates_components() {
        let a = fingerprint("acme", "ab", "c", "", "input", "text");
        let b = fingerprint("acme", "a", "bc", "", "input", "text");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_depends_on_domain() {
        let a = fingerprint("acme.com", "Email", "", "", "input", "email");
        let b = fingerprint("globex.com", "Email", "", "", "input", "email");
        assert_ne!(a, b);
    }

    #[test]
    fn test_options_hash_preserves_order() {
        let yes_no = vec!["Yes".to_string(), "No".to_string()];
        let no_yes = vec!["No".to_string(), "Yes".to_string()];
        let yes_no_spaced = vec![" yes ".to_string(), "NO".to_string()];
        assert_ne!(options_hash(&yes_no), options_hash(&no_yes));
        assert_eq!(options_hash(&yes_no), options_hash(&yes_no_spaced));
    }

    #[test]
    fn test_empty_options_hash_is_stable() {
        assert_eq!(options_hash(&[]), options_hash(&[]));
        assert_eq!(options_hash(&[]).len(), 64);
    }

    #[test]
    fn test_domain_from_url() {
        assert_eq!(
            domain_from_url("https://www.Jobs.Acme.com/apply?x=1"),
            "jobs.acme.com"
        );
        assert_eq!(domain_from_url("boards.greenhouse.io"), "boards.greenhouse.io");
        assert_eq!(domain_from_url(""), "");
    }

    #[test]
    fn test_correction_key_for_field() {
        let field = FieldDescriptor {
            id: "x".to_string(),
            label: "Work  Authorization".to_string(),
            tag: "select".to_string(),
            options: vec!["Yes".to_string(), "No".to_string()],
            ..Default::default()
        };
        let other_id = FieldDescriptor {
            id: "y".to_string(),
            label: "work authorization".to_string(),
            ..field.clone()
        };
        assert_eq!(
            CorrectionKey::for_field("www.acme.com", &field),
            CorrectionKey::for_field("acme.com", &other_id)
        );
    }
}
