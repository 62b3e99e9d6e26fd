//! Field classification: Rule Matcher → Semantic Classifier → Merger.

pub mod handlers;
pub mod merger;
pub mod rules;
pub mod semantic;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::classify::merger::{merge, ClassificationResult};
use crate::classify::rules::match_rules;
use crate::classify::semantic::SemanticClassifier;
use crate::embeddings::Embedder;
use crate::models::field::FieldDescriptor;

pub struct FieldClassifier {
    semantic: SemanticClassifier,
}

impl FieldClassifier {
    pub fn new(embedder: Arc<dyn Embedder>, semantic_min_confidence: f64) -> Self {
        Self {
            semantic: SemanticClassifier::new(embedder, semantic_min_confidence),
        }
    }

    /// Classifies a batch of fields, in input order.
    ///
    /// Only fields the rules leave unmatched are embedded. If the embedding
    /// service fails, those fields come back UNKNOWN rather than failing the batch.
    pub async fn classify(&self, fields: &[FieldDescriptor]) -> Vec<ClassificationResult> {
        let rule_hits: Vec<_> = fields.iter().map(match_rules).collect();

        let pending: Vec<usize> = (0..fields.len()).filter(|&i| rule_hits[i].is_none()).collect();
        let texts: Vec<String> = pending.iter().map(|&i| fields[i].embedding_text()).collect();

        let mut semantic = vec![None; fields.len()];
        match self.semantic.classify(&texts).await {
            Ok(matches) => {
                for (i, m) in pending.into_iter().zip(matches) {
                    semantic[i] = Some(m);
                }
            }
            Err(e) => warn!(
                "Semantic classification failed for {} fields, treating as UNKNOWN: {e}",
                texts.len()
            ),
        }

        fields
            .iter()
            .zip(rule_hits)
            .zip(semantic)
            .map(|((field, rule), semantic)| {
                let result = merge(&field.id, rule, semantic);
                debug!(
                    "Field {} classified as {} ({:.2}, rule={})",
                    field.id,
                    result.canonical_key,
                    result.confidence,
                    rule.is_some()
                );
                result
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::CanonicalKey;
    use crate::testing::{CountingEmbedder, FailingEmbedder, KeywordEmbedder};

    fn labeled(id: &str, label: &str) -> FieldDescriptor {
        FieldDescriptor {
            id: id.to_string(),
            label: label.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_email_scenario() {
        let classifier = FieldClassifier::new(Arc::new(KeywordEmbedder), 0.35);
        let results = classifier.classify(&[labeled("f1", "Email Address")]).await;
        let r = &results[0];
        assert_eq!(r.field_id, "f1");
        assert_eq!(r.canonical_key, CanonicalKey::Email);
        assert_eq!(r.confidence, 0.99);
        assert_eq!(r.source.to_string(), "profile.email");
        assert!(r.autofill_allowed);
    }

    #[tokio::test]
    async fn test_rule_hits_are_not_embedded() {
        let embedder = Arc::new(CountingEmbedder::default());
        let classifier = FieldClassifier::new(embedder.clone(), 0.35);
        classifier
            .classify(&[labeled("a", "Email"), labeled("b", "Phone")])
            .await;
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_degrades_to_unknown() {
        let classifier = FieldClassifier::new(Arc::new(FailingEmbedder), 0.35);
        let results = classifier
            .classify(&[labeled("a", "Tell us something"), labeled("b", "Email")])
            .await;
        assert_eq!(results[0].canonical_key, CanonicalKey::Unknown);
        assert!(!results[0].autofill_allowed);
        assert_eq!(results[1].canonical_key, CanonicalKey::Email);
    }

    #[tokio::test]
    async fn test_race_is_blocked() {
        let classifier = FieldClassifier::new(Arc::new(KeywordEmbedder), 0.35);
        let results = classifier.classify(&[labeled("r", "Race/Ethnicity")]).await;
        assert!(results[0].sensitive);
        assert!(!results[0].autofill_allowed);
    }
}
