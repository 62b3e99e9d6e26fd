//! Deterministic in-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::audit::{AuditRecord, AuditSink};
use crate::corrections::fingerprint::CorrectionKey;
use crate::corrections::store::{Correction, CorrectionStore, CorrectionStoreError, CorrectionUpsert};
use crate::embeddings::{normalize, Embedder, EmbeddingError};
use crate::oracle::{DecisionOracle, OracleDecision, OracleError, OracleRequest, OracleSourceType};
use crate::resume::chunker::Chunk;
use crate::resume::repository::ChunkRepository;

// ────────────────────────────────────────────────────────────────────────────
// Embedders
// ────────────────────────────────────────────────────────────────────────────

const BUCKETS: usize = 512;

fn fnv1a(word: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in word.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

pub fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Bag-of-words embedder: each lower-cased word lands in a hashed bucket.
/// Texts without words map to a reserved dimension.
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; BUCKETS + 1];
        let words = tokens(text);
        if words.is_empty() {
            v[BUCKETS] = 1.0;
        }
        for word in words {
            v[(fnv1a(&word) % BUCKETS as u64) as usize] += 1.0;
        }
        normalize(&mut v).expect("keyword vectors are never zero");
        v
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }
}

/// [`KeywordEmbedder`] that counts `embed` calls.
#[derive(Default)]
pub struct CountingEmbedder {
    calls: AtomicUsize,
}

impl CountingEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        KeywordEmbedder.embed(texts).await
    }

    fn model_name(&self) -> &str {
        "counting-test"
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Api {
            status: 503,
            message: "embedding service unavailable".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "failing-test"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Oracle
// ────────────────────────────────────────────────────────────────────────────

pub enum Script {
    Answer(OracleDecision),
    Fail,
    Hang,
    Panic,
}

/// Oracle that replays one scripted behaviour and records every request.
pub struct ScriptedOracle {
    script: Script,
    requests: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn answering(value: Option<&str>, source_type: OracleSourceType, confidence: f64) -> Self {
        Self::new(Script::Answer(OracleDecision {
            value: value.map(String::from),
            source_type,
            source_ref: value.map(|_| "resume_chunk:0".to_string()),
            confidence,
            note: None,
        }))
    }

    pub fn requests(&self) -> Vec<OracleRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DecisionOracle for ScriptedOracle {
    async fn decide(&self, request: &OracleRequest) -> Result<OracleDecision, OracleError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.script {
            Script::Answer(decision) => Ok(decision.clone()),
            Script::Fail => Err(OracleError::OutOfContract("scripted failure".to_string())),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(OracleError::OutOfContract("woke up".to_string()))
            }
            Script::Panic => panic!("scripted oracle panic"),
        }
    }

    fn name(&self) -> &str {
        "scripted-test"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stores
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryCorrectionStore {
    rows: Mutex<HashMap<CorrectionKey, Correction>>,
}

impl MemoryCorrectionStore {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CorrectionStore for MemoryCorrectionStore {
    async fn lookup(&self, key: &CorrectionKey) -> Result<Option<Correction>, CorrectionStoreError> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .get_mut(key)
            .filter(|c| !c.correct_value.trim().is_empty())
            .map(|c| {
                c.hits += 1;
                c.clone()
            }))
    }

    async fn upsert_many(&self, entries: &[CorrectionUpsert]) -> Result<usize, CorrectionStoreError> {
        let mut rows = self.rows.lock().unwrap();
        for entry in entries {
            let row = rows.entry(entry.key.clone()).or_insert_with(|| Correction {
                id: Uuid::new_v4(),
                correct_value: String::new(),
                fill_strategy: String::new(),
                hits: 0,
            });
            row.correct_value = entry.correct_value.clone();
            row.fill_strategy = entry.fill_strategy.as_str().to_string();
        }
        Ok(entries.len())
    }
}

#[derive(Default)]
pub struct MemoryChunkRepository {
    rows: Mutex<HashMap<Uuid, Vec<Chunk>>>,
}

impl MemoryChunkRepository {
    pub fn stored(&self, resume_id: Uuid) -> Vec<Chunk> {
        self.rows.lock().unwrap().get(&resume_id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ChunkRepository for MemoryChunkRepository {
    async fn replace(&self, resume_id: Uuid, chunks: &[Chunk]) -> Result<()> {
        self.rows.lock().unwrap().insert(resume_id, chunks.to_vec());
        Ok(())
    }

    async fn load(&self, resume_id: Uuid) -> Result<Vec<Chunk>> {
        Ok(self.stored(resume_id))
    }
}

/// Repository whose storage is unreachable.
pub struct FailingChunkRepository;

#[async_trait]
impl ChunkRepository for FailingChunkRepository {
    async fn replace(&self, _resume_id: Uuid, _chunks: &[Chunk]) -> Result<()> {
        anyhow::bail!("chunk storage unavailable")
    }

    async fn load(&self, _resume_id: Uuid) -> Result<Vec<Chunk>> {
        anyhow::bail!("chunk storage unavailable")
    }
}

#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, record: AuditRecord) -> Result<()> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}
