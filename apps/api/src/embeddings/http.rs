//! Async client for OpenAI-compatible `/embeddings` endpoints.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{normalize, Embedder, EmbeddingError};

const MAX_RETRIES: u32 = 3;
const MAX_BATCH: usize = 96;

pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    /// Dimension observed on the first successful call; 0 until then.
    dimension: AtomicUsize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Deserialize)]
struct EmbeddingEntry {
    index: usize,
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    pub fn new(api_key: &str, base_url: &str, model: String) -> anyhow::Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing embedding API key");
        anyhow::ensure!(!model.trim().is_empty(), "missing embedding model name");

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model,
            dimension: AtomicUsize::new(0),
        })
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };

        let mut last_error: Option<EmbeddingError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(500 * (1 << attempt));
                warn!(
                    "Embedding call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(&self.endpoint).json(&request).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(EmbeddingError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                last_error = Some(EmbeddingError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(EmbeddingError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let mut parsed: EmbeddingResponse = response.json().await?;
            parsed.data.sort_by_key(|entry| entry.index);
            if parsed.data.len() != inputs.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: inputs.len(),
                    got: parsed.data.len(),
                });
            }

            let mut vectors = Vec::with_capacity(parsed.data.len());
            for entry in parsed.data {
                let mut v = entry.embedding;
                self.check_dimension(v.len())?;
                normalize(&mut v)?;
                vectors.push(v);
            }
            return Ok(vectors);
        }

        Err(last_error.unwrap_or(EmbeddingError::Api {
            status: 429,
            message: format!("gave up after {MAX_RETRIES} attempts"),
        }))
    }

    fn check_dimension(&self, got: usize) -> Result<(), EmbeddingError> {
        match self
            .dimension
            .compare_exchange(0, got, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => Ok(()),
            Err(expected) if expected == got => Ok(()),
            Err(expected) => Err(EmbeddingError::DimensionMismatch { expected, got }),
        }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            out.extend(self.embed_batch(batch).await?);
        }
        debug!("Embedded {} texts with {}", texts.len(), self.model);
        Ok(out)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder() -> HttpEmbedder {
        HttpEmbedder::new("key", "http://localhost:9/v1/", "test-model".to_string()).unwrap()
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(embedder().endpoint, "http://localhost:9/v1/embeddings");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(HttpEmbedder::new("  ", "http://x", "m".to_string()).is_err());
    }

    #[test]
    fn test_dimension_locked_after_first_vector() {
        let e = embedder();
        assert!(e.check_dimension(384).is_ok());
        assert!(e.check_dimension(384).is_ok());
        assert!(matches!(
            e.check_dimension(768),
            Err(EmbeddingError::DimensionMismatch {
                expected: 384,
                got: 768
            })
        ));
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_call() {
        let vectors = embedder().embed(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
