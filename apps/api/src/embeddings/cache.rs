//! Redis-backed embedding cache.
//!
//! Keys are content addressed (`embed:<model>:<sha256(text)>`), so a cached
//! vector is exactly what the deterministic model would return. Any Redis
//! failure falls through to the wrapped embedder.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::{Embedder, EmbeddingError};

const DEFAULT_TTL_SECS: u64 = 60 * 60 * 24 * 7;

pub struct CachedEmbedder<E> {
    inner: E,
    client: redis::Client,
    conn: OnceCell<MultiplexedConnection>,
    ttl_secs: u64,
}

impl<E: Embedder> CachedEmbedder<E> {
    pub fn new(inner: E, client: redis::Client) -> Self {
        Self {
            inner,
            client,
            conn: OnceCell::new(),
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    fn cache_key(&self, text: &str) -> String {
        cache_key(self.inner.model_name(), text)
    }

    async fn connection(&self) -> redis::RedisResult<MultiplexedConnection> {
        self.conn
            .get_or_try_init(|| self.client.get_multiplexed_async_connection())
            .await
            .cloned()
    }

    async fn read(&self, keys: &[String]) -> redis::RedisResult<Vec<Option<Vec<f32>>>> {
        let mut conn = self.connection().await?;
        let raw: Vec<Option<String>> = conn.mget(keys).await?;
        Ok(raw
            .into_iter()
            .map(|entry| entry.and_then(|json| serde_json::from_str(&json).ok()))
            .collect())
    }

    async fn write(&self, entries: &[(String, &Vec<f32>)]) -> redis::RedisResult<()> {
        let mut conn = self.connection().await?;
        for (key, vector) in entries {
            let json = serde_json::to_string(vector).unwrap_or_default();
            conn.set_ex::<_, _, ()>(key, json, self.ttl_secs).await?;
        }
        Ok(())
    }
}

pub fn cache_key(model: &str, text: &str) -> String {
    format!("embed:{}:{:x}", model, Sha256::digest(text.as_bytes()))
}

#[async_trait]
impl<E: Embedder> Embedder for CachedEmbedder<E> {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = texts.iter().map(|t| self.cache_key(t)).collect();
        let mut slots = match self.read(&keys).await {
            Ok(slots) if slots.len() == texts.len() => slots,
            Ok(_) => vec![None; texts.len()],
            Err(e) => {
                warn!("Embedding cache read failed, embedding directly: {e}");
                vec![None; texts.len()]
            }
        };

        let missing: Vec<usize> = (0..texts.len()).filter(|&i| slots[i].is_none()).collect();
        debug!(
            "Embedding cache: {} hits, {} misses",
            texts.len() - missing.len(),
            missing.len()
        );

        if !missing.is_empty() {
            let to_embed: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let fresh = self.inner.embed(&to_embed).await?;
            if fresh.len() != missing.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: missing.len(),
                    got: fresh.len(),
                });
            }

            let writes: Vec<(String, &Vec<f32>)> = missing
                .iter()
                .zip(fresh.iter())
                .map(|(&i, v)| (keys[i].clone(), v))
                .collect();
            if let Err(e) = self.write(&writes).await {
                warn!("Embedding cache write failed: {e}");
            }

            for (i, v) in missing.into_iter().zip(fresh) {
                slots[i] = Some(v);
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_content_addressed() {
        let a = cache_key("m", "Email Address");
        let b = cache_key("m", "Email Address");
        let c = cache_key("m", "email address");
        let d = cache_key("other", "Email Address");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert!(a.starts_with("embed:m:"));
        assert_eq!(a.len(), "embed:m:".len() + 64);
    }
}
