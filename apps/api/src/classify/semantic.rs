//! Semantic Classifier — nearest canonical description by cosine similarity.
//!
//! Canonical vectors are computed on first use and kept for the process
//! lifetime; field vectors are computed per call. No learning happens here.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::OnceCell;

use crate::canonical::{CanonicalKey, CANONICAL_FIELDS};
use crate::embeddings::{cosine, Embedder, EmbeddingError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SemanticMatch {
    pub key: CanonicalKey,
    /// Raw best similarity, kept even when the key was forced to UNKNOWN.
    pub score: f64,
}

struct CanonicalVectors {
    keys: Vec<CanonicalKey>,
    vectors: Vec<Vec<f32>>,
}

pub struct SemanticClassifier {
    embedder: Arc<dyn Embedder>,
    min_confidence: f64,
    canonical: OnceCell<CanonicalVectors>,
}

impl SemanticClassifier {
    pub fn new(embedder: Arc<dyn Embedder>, min_confidence: f64) -> Self {
        Self {
            embedder,
            min_confidence,
            canonical: OnceCell::new(),
        }
    }

    async fn canonical_vectors(&self) -> Result<&CanonicalVectors, EmbeddingError> {
        self.canonical
            .get_or_try_init(|| async {
                let texts: Vec<String> = CANONICAL_FIELDS.iter().map(|f| f.embedding_text()).collect();
                let vectors = self.embedder.embed(&texts).await?;
                if vectors.len() != texts.len() {
                    return Err(EmbeddingError::CountMismatch {
                        expected: texts.len(),
                        got: vectors.len(),
                    });
                }
                tracing::info!(
                    "Cached {} canonical field embeddings ({})",
                    vectors.len(),
                    self.embedder.model_name()
                );
                Ok(CanonicalVectors {
                    keys: CANONICAL_FIELDS.iter().map(|f| f.key).collect(),
                    vectors,
                })
            })
            .await
    }

    /// Classifies each text against the canonical table, in input order.
    pub async fn classify(&self, texts: &[String]) -> Result<Vec<SemanticMatch>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let canonical = self.canonical_vectors().await?;
        let field_vectors = self.embedder.embed(texts).await?;
        if field_vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                got: field_vectors.len(),
            });
        }
        Ok(field_vectors
            .iter()
            .map(|v| nearest(v, canonical, self.min_confidence))
            .collect())
    }
}

fn nearest(field: &[f32], canonical: &CanonicalVectors, min_confidence: f64) -> SemanticMatch {
    let mut best_key = CanonicalKey::Unknown;
    let mut best_score = f32::NEG_INFINITY;
    for (key, vector) in canonical.keys.iter().zip(&canonical.vectors) {
        let score = cosine(field, vector);
        if score > best_score {
            best_score = score;
            best_key = *key;
        }
    }
    let score = if best_score.is_finite() { best_score as f64 } else { 0.0 };
    let key = if score < min_confidence {
        CanonicalKey::Unknown
    } else {
        best_key
    };
    SemanticMatch { key, score }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingEmbedder, KeywordEmbedder};

    #[tokio::test]
    async fn test_matches_nearest_description() {
        let classifier = SemanticClassifier::new(Arc::new(KeywordEmbedder), 0.35);
        let results = classifier
            .classify(&["primary email address".to_string()])
            .await
            .unwrap();
        assert_eq!(results[0].key, CanonicalKey::Email);
        assert!(results[0].score >= 0.35);
    }

    #[tokio::test]
    async fn test_low_similarity_forced_to_unknown() {
        let classifier = SemanticClassifier::new(Arc::new(KeywordEmbedder), 0.35);
        let results = classifier
            .classify(&["zzz qqq xyzzy".to_string()])
            .await
            .unwrap();
        assert_eq!(results[0].key, CanonicalKey::Unknown);
        assert!(results[0].score < 0.35);
    }

    #[tokio::test]
    async fn test_canonical_vectors_embedded_once() {
        let embedder = Arc::new(CountingEmbedder::default());
        let classifier = SemanticClassifier::new(embedder.clone(), 0.35);
        classifier.classify(&["email".to_string()]).await.unwrap();
        classifier.classify(&["phone".to_string()]).await.unwrap();
        // one canonical batch + two field batches
        assert_eq!(embedder.calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_input_skips_embedding() {
        let embedder = Arc::new(CountingEmbedder::default());
        let classifier = SemanticClassifier::new(embedder.clone(), 0.35);
        assert!(classifier.classify(&[]).await.unwrap().is_empty());
        assert_eq!(embedder.calls(), 0);
    }
}
