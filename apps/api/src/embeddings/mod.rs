//! Embedding function seam.
//!
//! The model itself is external and frozen. Everything in the pipeline talks to
//! it through [`Embedder`], which must be deterministic for identical input and
//! return unit vectors of one fixed dimension for the lifetime of the process.

use async_trait::async_trait;
use thiserror::Error;

pub mod cache;
pub mod http;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Embedding service returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },

    #[error("Embedding dimension changed from {expected} to {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Embedding service returned a zero vector")]
    ZeroVector,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds every input, returning one unit vector per input in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    fn model_name(&self) -> &str;

    /// Convenience wrapper for a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            got: 0,
        })
    }
}

/// Cosine similarity of two unit vectors, i.e. their dot product.
/// Vectors of different length score 0.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Scales `v` to unit length in place.
pub fn normalize(v: &mut [f32]) -> Result<(), EmbeddingError> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return Err(EmbeddingError::ZeroVector);
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    Ok(())
}

/// Indices of `scores` ordered by descending score, truncated to `k`.
/// Equal scores keep their original order.
pub fn top_k(scores: &[f32], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order.truncate(k);
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_of_unit_vectors() {
        assert!((cosine(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_length_mismatch_is_zero() {
        assert_eq!(cosine(&[1.0, 0.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_normalize_unit_length() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v).unwrap();
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_rejects_zero_vector() {
        let mut v = vec![0.0, 0.0];
        assert!(matches!(normalize(&mut v), Err(EmbeddingError::ZeroVector)));
    }

    #[test]
    fn test_top_k_breaks_ties_by_position() {
        let scores = [0.5, 0.9, 0.5, 0.1, 0.9];
        assert_eq!(top_k(&scores, 4), vec![1, 4, 0, 2]);
        assert!(top_k(&scores, 0).is_empty());
        assert_eq!(top_k(&[], 3), Vec::<usize>::new());
    }
}
