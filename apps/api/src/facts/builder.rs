use serde::Serialize;
use serde_json::{Map, Value};

use crate::canonical::FieldSource;

/// One flattened, human-labelled leaf of the profile or preferences map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fact {
    /// Dotted path, e.g. `profile.firstName`.
    pub key: String,
    pub label: String,
    pub value: String,
}

impl Fact {
    /// Text embedded for retrieval.
    pub fn embedding_text(&self) -> String {
        format!("{}: {}", self.label, self.value)
    }
}

/// Renders a scalar leaf as text. Strings are trimmed; empty strings, null,
/// arrays and objects yield `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// `firstName` / `profile.first_name` → `First Name`.
pub fn humanize(key: &str) -> String {
    let attr = key.rsplit('.').next().unwrap_or(key);

    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in attr.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_facts(prefix: &str, map: &Map<String, Value>, facts: &mut Vec<Fact>) {
    for (attr, value) in map {
        if let Some(text) = scalar_text(value) {
            facts.push(Fact {
                key: format!("{prefix}.{attr}"),
                label: humanize(attr),
                value: text,
            });
        }
    }
}

/// One fact per non-empty scalar leaf, profile first, each map in its own order.
pub fn build_facts(profile: &Map<String, Value>, preferences: &Map<String, Value>) -> Vec<Fact> {
    let mut facts = Vec::with_capacity(profile.len() + preferences.len());
    push_facts("profile", profile, &mut facts);
    push_facts("preferences", preferences, &mut facts);
    facts
}

/// Reads the stored value a canonical source points at, if it is a non-empty scalar.
pub fn source_value(
    source: FieldSource,
    profile: &Map<String, Value>,
    preferences: &Map<String, Value>,
) -> Option<String> {
    match source {
        FieldSource::Profile(attr) => profile.get(attr).and_then(scalar_text),
        FieldSource::Preferences(attr) => preferences.get(attr).and_then(scalar_text),
        FieldSource::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("firstName"), "First Name");
        assert_eq!(humanize("profile.firstName"), "First Name");
        assert_eq!(humanize("linkedin_url"), "Linkedin Url");
        assert_eq!(humanize("gpa"), "Gpa");
        assert_eq!(humanize("travelPercentMax"), "Travel Percent Max");
    }

    #[test]
    fn test_build_facts_skips_empty_and_non_scalar() {
        let profile = map(json!({
            "firstName": "  Ada ",
            "middleName": "   ",
            "skills": ["rust"],
            "address": {"city": "X"},
            "phone": null,
            "yearsTotal": 7
        }));
        let preferences = map(json!({"willingToRelocate": true}));
        let facts = build_facts(&profile, &preferences);

        let keys: Vec<_> = facts.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["profile.firstName", "profile.yearsTotal", "preferences.willingToRelocate"]
        );
        assert_eq!(facts[0].value, "Ada");
        assert_eq!(facts[0].label, "First Name");
        assert_eq!(facts[1].value, "7");
        assert_eq!(facts[2].value, "true");
        assert_eq!(facts[0].embedding_text(), "First Name: Ada");
    }

    #[test]
    fn test_source_value() {
        let profile = map(json!({"email": "a@b.com", "phone": ""}));
        let preferences = map(json!({"needSponsorship": false}));
        assert_eq!(
            source_value(FieldSource::Profile("email"), &profile, &preferences).as_deref(),
            Some("a@b.com")
        );
        assert_eq!(source_value(FieldSource::Profile("phone"), &profile, &preferences), None);
        assert_eq!(
            source_value(FieldSource::Preferences("needSponsorship"), &profile, &preferences)
                .as_deref(),
            Some("false")
        );
        assert_eq!(source_value(FieldSource::None, &profile, &preferences), None);
    }
}
