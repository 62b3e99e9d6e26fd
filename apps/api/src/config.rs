use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// Credentials for the decision oracle. Required: no per-request fallback exists.
    pub anthropic_api_key: String,
    pub embedding_api_url: String,
    pub embedding_api_key: String,
    pub embedding_model: String,
    pub port: u16,
    pub rust_log: String,
    pub rag: RagConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let rag = RagConfig::from_env()?;
        rag.validate()?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            embedding_api_url: std::env::var("EMBEDDING_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            embedding_api_key: require_env("EMBEDDING_API_KEY")?,
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            rag,
        })
    }
}

/// Tunables of the field resolution pipeline.
///
/// `min_confidence_to_return_value` and `min_confidence_to_autofill` are
/// deliberately separate knobs. When they are equal (the default) there is no
/// "return but don't fill" band.
#[derive(Debug, Clone, PartialEq)]
pub struct RagConfig {
    pub min_confidence_to_autofill: f64,
    pub min_confidence_to_return_value: f64,
    /// Above this, a canonical mapping with a stored value skips the oracle.
    pub canonical_confidence_strong: f64,
    /// Nearest-neighbour scores below this are forced to UNKNOWN.
    pub semantic_min_confidence: f64,
    pub max_facts_to_send: usize,
    pub max_chunks_to_send: usize,
    pub resume_chunk_size: usize,
    pub resume_chunk_overlap: usize,
    /// Resumes kept embedded in memory before the least recently used is dropped.
    pub resume_index_capacity: usize,
    pub oracle_max_concurrency: usize,
    pub oracle_timeout: Duration,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            min_confidence_to_autofill: 0.60,
            min_confidence_to_return_value: 0.60,
            canonical_confidence_strong: 0.75,
            semantic_min_confidence: 0.35,
            max_facts_to_send: 10,
            max_chunks_to_send: 8,
            resume_chunk_size: 900,
            resume_chunk_overlap: 150,
            resume_index_capacity: 256,
            oracle_max_concurrency: 4,
            oracle_timeout: Duration::from_secs(30),
        }
    }
}

impl RagConfig {
    /// Starts from the defaults and applies any environment overrides.
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            min_confidence_to_autofill: env_or("MIN_CONFIDENCE_TO_AUTOFILL", d.min_confidence_to_autofill)?,
            min_confidence_to_return_value: env_or(
                "MIN_CONFIDENCE_TO_RETURN_VALUE",
                d.min_confidence_to_return_value,
            )?,
            canonical_confidence_strong: env_or("CANONICAL_CONFIDENCE_STRONG", d.canonical_confidence_strong)?,
            semantic_min_confidence: env_or("SEMANTIC_MIN_CONFIDENCE", d.semantic_min_confidence)?,
            max_facts_to_send: env_or("MAX_FACTS_TO_SEND", d.max_facts_to_send)?,
            max_chunks_to_send: env_or("MAX_CHUNKS_TO_SEND", d.max_chunks_to_send)?,
            resume_chunk_size: env_or("RESUME_CHUNK_SIZE", d.resume_chunk_size)?,
            resume_chunk_overlap: env_or("RESUME_CHUNK_OVERLAP", d.resume_chunk_overlap)?,
            resume_index_capacity: env_or("RESUME_INDEX_CAPACITY", d.resume_index_capacity)?,
            oracle_max_concurrency: env_or("ORACLE_MAX_CONCURRENCY", d.oracle_max_concurrency)?,
            oracle_timeout: Duration::from_secs(env_or(
                "ORACLE_TIMEOUT_SECS",
                d.oracle_timeout.as_secs(),
            )?),
        })
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("MIN_CONFIDENCE_TO_AUTOFILL", self.min_confidence_to_autofill),
            ("MIN_CONFIDENCE_TO_RETURN_VALUE", self.min_confidence_to_return_value),
            ("CANONICAL_CONFIDENCE_STRONG", self.canonical_confidence_strong),
            ("SEMANTIC_MIN_CONFIDENCE", self.semantic_min_confidence),
        ] {
            anyhow::ensure!(
                (0.0..=1.0).contains(&value),
                "{name} must be within [0, 1], got {value}"
            );
        }
        anyhow::ensure!(
            self.min_confidence_to_return_value <= self.min_confidence_to_autofill,
            "MIN_CONFIDENCE_TO_RETURN_VALUE ({}) must not exceed MIN_CONFIDENCE_TO_AUTOFILL ({})",
            self.min_confidence_to_return_value,
            self.min_confidence_to_autofill
        );
        anyhow::ensure!(self.resume_chunk_size > 0, "RESUME_CHUNK_SIZE must be positive");
        anyhow::ensure!(
            self.resume_chunk_overlap < self.resume_chunk_size,
            "RESUME_CHUNK_OVERLAP must be smaller than RESUME_CHUNK_SIZE"
        );
        anyhow::ensure!(
            self.resume_index_capacity > 0,
            "RESUME_INDEX_CAPACITY must be at least 1"
        );
        anyhow::ensure!(
            self.oracle_max_concurrency > 0,
            "ORACLE_MAX_CONCURRENCY must be at least 1"
        );
        Ok(())
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(RagConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_thresholds_collapse_middle_band() {
        let cfg = RagConfig::default();
        assert_eq!(cfg.min_confidence_to_autofill, 0.60);
        assert_eq!(
            cfg.min_confidence_to_return_value,
            cfg.min_confidence_to_autofill
        );
        assert_eq!(cfg.canonical_confidence_strong, 0.75);
    }

    #[test]
    fn test_return_threshold_above_autofill_rejected() {
        let cfg = RagConfig {
            min_confidence_to_return_value: 0.8,
            min_confidence_to_autofill: 0.6,
            ..RagConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let cfg = RagConfig {
            resume_chunk_size: 100,
            resume_chunk_overlap: 100,
            ..RagConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_index_capacity_rejected() {
        let cfg = RagConfig {
            resume_index_capacity: 0,
            ..RagConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let cfg = RagConfig {
            canonical_confidence_strong: 1.5,
            ..RagConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
