use serde::Serialize;

use crate::embeddings::{cosine, top_k, Embedder, EmbeddingError};
use crate::facts::Fact;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredFact {
    #[serde(flatten)]
    pub fact: Fact,
    pub score: f32,
}

/// Facts embedded once per request so every field can rank against them
/// without re-embedding.
pub struct FactIndex {
    facts: Vec<Fact>,
    vectors: Vec<Vec<f32>>,
}

impl FactIndex {
    pub async fn build(embedder: &dyn Embedder, facts: Vec<Fact>) -> Result<Self, EmbeddingError> {
        if facts.is_empty() {
            return Ok(Self::empty());
        }
        let texts: Vec<String> = facts.iter().map(Fact::embedding_text).collect();
        let vectors = embedder.embed(&texts).await?;
        if vectors.len() != facts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: facts.len(),
                got: vectors.len(),
            });
        }
        Ok(Self { facts, vectors })
    }

    pub fn empty() -> Self {
        Self {
            facts: Vec::new(),
            vectors: Vec::new(),
        }
    }

    /// Top `k` facts by cosine similarity to `query`, ties in insertion order.
    pub fn rank(&self, query: &[f32], k: usize) -> Vec<ScoredFact> {
        let scores: Vec<f32> = self.vectors.iter().map(|v| cosine(query, v)).collect();
        top_k(&scores, k)
            .into_iter()
            .map(|i| ScoredFact {
                fact: self.facts[i].clone(),
                score: scores[i],
            })
            .collect()
    }
}

/// Embeds `query` and `facts` and returns at most `k` facts, best first.
pub async fn retrieve(
    embedder: &dyn Embedder,
    query: &str,
    facts: Vec<Fact>,
    k: usize,
) -> Result<Vec<ScoredFact>, EmbeddingError> {
    if facts.is_empty() || k == 0 {
        return Ok(Vec::new());
    }
    let index = FactIndex::build(embedder, facts).await?;
    let query = embedder.embed_one(query).await?;
    Ok(index.rank(&query, k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::KeywordEmbedder;

    fn fact(key: &str, label: &str, value: &str) -> Fact {
        Fact {
            key: key.to_string(),
            label: label.to_string(),
            value: value.to_string(),
        }
    }

    #[tokio::test]
    async fn test_retrieve_ranks_relevant_fact_first() {
        let facts = vec![
            fact("profile.city", "City", "Lisbon"),
            fact("profile.email", "Email", "a@b.com"),
            fact("profile.school", "School", "MIT"),
        ];
        let ranked = retrieve(&KeywordEmbedder, "what is your email", facts, 2)
            .await
            .unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].fact.key, "profile.email");
        assert!(ranked[0].score >= ranked[1].score);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let facts = vec![
            fact("profile.a", "Alpha", "one"),
            fact("profile.b", "Beta", "two"),
            fact("profile.c", "Gamma", "three"),
        ];
        let ranked = retrieve(&KeywordEmbedder, "unrelated words", facts, 3)
            .await
            .unwrap();
        let keys: Vec<_> = ranked.iter().map(|s| s.fact.key.as_str()).collect();
        assert_eq!(keys, vec!["profile.a", "profile.b", "profile.c"]);
    }

    #[tokio::test]
    async fn test_empty_facts() {
        let ranked = retrieve(&KeywordEmbedder, "email", Vec::new(), 5).await.unwrap();
        assert!(ranked.is_empty());
        assert!(FactIndex::empty().rank(&[1.0], 3).is_empty());
    }
}
