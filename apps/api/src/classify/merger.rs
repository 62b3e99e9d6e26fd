//! Classification Merger — folds the rule and semantic verdicts into one result.
//!
//! Pure combination step: both inputs are already computed, nothing external is called.

use serde::Serialize;

use crate::canonical::{canonical_field, CanonicalKey, FieldSource};
use crate::classify::semantic::SemanticMatch;

/// Floor applied to rule-matched confidence.
pub const RULE_CONFIDENCE: f64 = 0.99;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub field_id: String,
    pub canonical_key: CanonicalKey,
    pub source: FieldSource,
    pub confidence: f64,
    pub sensitive: bool,
    pub autofill_allowed: bool,
}

impl ClassificationResult {
    fn new(field_id: &str, key: CanonicalKey, confidence: f64) -> Self {
        let canonical = canonical_field(key);
        let source = canonical.source;
        let sensitive = canonical.sensitive;
        Self {
            field_id: field_id.to_string(),
            canonical_key: key,
            source,
            confidence: confidence.clamp(0.0, 1.0),
            sensitive,
            autofill_allowed: key != CanonicalKey::Unknown && !source.is_none() && !sensitive,
        }
    }
}

/// A rule hit is authoritative; otherwise the semantic verdict stands. A field
/// with neither (e.g. the embedding service was unavailable) is UNKNOWN at 0.
pub fn merge(
    field_id: &str,
    rule: Option<CanonicalKey>,
    semantic: Option<SemanticMatch>,
) -> ClassificationResult {
    match (rule, semantic) {
        (Some(key), semantic) => {
            let score = semantic.map(|s| s.score).unwrap_or(0.0);
            ClassificationResult::new(field_id, key, score.max(RULE_CONFIDENCE))
        }
        (None, Some(m)) => ClassificationResult::new(field_id, m.key, m.score),
        (None, None) => ClassificationResult::new(field_id, CanonicalKey::Unknown, 0.0),
    }
}
