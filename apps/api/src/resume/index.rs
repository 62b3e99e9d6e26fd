//! Per-resume vector index.
//!
//! An explicit keyed store, populated lazily from the chunk repository and
//! replaced wholesale on rebuild. Each resume id has its own `RwLock`: searches
//! share it, a rebuild holds it exclusively while it swaps both the stored
//! rows and the in-memory vectors, so no reader sees a half-replaced index.
//!
//! Residency is bounded. Once `capacity` resumes are held, the least recently
//! used idle slot is dropped; it is reloaded from the repository on next use.
//! A load that finds no stored chunks is never kept.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::embeddings::{cosine, top_k, Embedder};
use crate::resume::chunker::{chunk_text, reassemble, Chunk};
use crate::resume::gpa::find_gpa;
use crate::resume::repository::ChunkRepository;

pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk_index: usize,
    pub text: String,
    pub score: f32,
}

struct IndexedResume {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
}

type Slot = Arc<RwLock<Option<Arc<IndexedResume>>>>;

struct Resident {
    slot: Slot,
    last_used: u64,
}

/// Slots are only cloned while this map is locked, so a slot whose `Arc` is
/// held by the map alone has no reader or writer and may be dropped.
#[derive(Default)]
struct Residents {
    map: HashMap<Uuid, Resident>,
    clock: u64,
}

impl Residents {
    fn is_idle(resident: &Resident) -> bool {
        Arc::strong_count(&resident.slot) == 1
    }

    fn evict_lru(&mut self) {
        let victim = self
            .map
            .iter()
            .filter(|(_, r)| Self::is_idle(r))
            .min_by_key(|(_, r)| r.last_used)
            .map(|(id, _)| *id);
        if let Some(id) = victim {
            self.map.remove(&id);
            debug!("Evicted resume {id} from the in-memory index");
        }
    }
}

pub struct ResumeIndex {
    embedder: Arc<dyn Embedder>,
    repository: Arc<dyn ChunkRepository>,
    chunk_size: usize,
    chunk_overlap: usize,
    capacity: usize,
    residents: Mutex<Residents>,
}

impl ResumeIndex {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        repository: Arc<dyn ChunkRepository>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            embedder,
            repository,
            chunk_size,
            chunk_overlap,
            capacity: DEFAULT_CAPACITY,
            residents: Mutex::new(Residents::default()),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    async fn slot(&self, resume_id: Uuid) -> Slot {
        let mut residents = self.residents.lock().await;
        residents.clock += 1;
        let now = residents.clock;

        if !residents.map.contains_key(&resume_id) && residents.map.len() >= self.capacity {
            residents.evict_lru();
        }
        let resident = residents.map.entry(resume_id).or_insert_with(|| Resident {
            slot: Slot::default(),
            last_used: now,
        });
        resident.last_used = now;
        resident.slot.clone()
    }

    /// Drops the slot of `resume_id` if nobody holds it and it has no index.
    async fn release_if_empty(&self, resume_id: Uuid) {
        let mut residents = self.residents.lock().await;
        let empty = residents.map.get(&resume_id).is_some_and(|r| {
            Residents::is_idle(r) && r.slot.try_read().is_ok_and(|guard| guard.is_none())
        });
        if empty {
            residents.map.remove(&resume_id);
        }
    }

    /// Drops the in-memory index of `resume_id`, waiting for any rebuild.
    pub async fn forget(&self, resume_id: Uuid) {
        let slot = self.residents.lock().await.map.remove(&resume_id);
        if let Some(resident) = slot {
            *resident.slot.write().await = None;
        }
    }

    #[cfg(test)]
    async fn resident_count(&self) -> usize {
        self.residents.lock().await.map.len()
    }

    async fn embed_chunks(&self, chunks: Vec<Chunk>) -> Result<IndexedResume> {
        if chunks.is_empty() {
            return Ok(IndexedResume {
                chunks,
                vectors: Vec::new(),
            });
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;
        anyhow::ensure!(
            vectors.len() == chunks.len(),
            "embedded {} of {} resume chunks",
            vectors.len(),
            chunks.len()
        );
        Ok(IndexedResume { chunks, vectors })
    }

    /// Chunks, embeds and stores `text` as the only content of `resume_id`,
    /// discarding whatever was indexed before. Returns the chunk count.
    ///
    /// Embedding happens before the lock is taken; if it fails the previous
    /// index is left untouched.
    pub async fn build_index(&self, resume_id: Uuid, text: &str) -> Result<usize> {
        let chunks = chunk_text(text, self.chunk_size, self.chunk_overlap);
        let indexed = self.embed_chunks(chunks).await?;
        let count = indexed.chunks.len();

        let slot = self.slot(resume_id).await;
        let mut guard = slot.write().await;
        self.repository.replace(resume_id, &indexed.chunks).await?;
        *guard = Some(Arc::new(indexed));

        info!("Indexed resume {resume_id}: {count} chunks");
        Ok(count)
    }

    /// Returns the in-memory index, loading it from the repository on first use.
    async fn loaded(&self, resume_id: Uuid) -> Result<Arc<IndexedResume>> {
        let slot = self.slot(resume_id).await;

        if let Some(indexed) = slot.read().await.as_ref() {
            return Ok(indexed.clone());
        }

        let indexed = {
            let mut guard = slot.write().await;
            if let Some(indexed) = guard.as_ref() {
                return Ok(indexed.clone());
            }
            let chunks = self.repository.load(resume_id).await?;
            debug!("Loaded {} stored chunks for resume {resume_id}", chunks.len());
            let indexed = Arc::new(self.embed_chunks(chunks).await?);
            if !indexed.chunks.is_empty() {
                *guard = Some(indexed.clone());
            }
            indexed
        };

        if indexed.chunks.is_empty() {
            drop(slot);
            self.release_if_empty(resume_id).await;
        }
        Ok(indexed)
    }

    pub async fn search(&self, resume_id: Uuid, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let query = self.embedder.embed_one(query).await?;
        self.search_by_vector(resume_id, &query, k).await
    }

    /// Top `k` chunks by cosine similarity to an already-embedded query.
    pub async fn search_by_vector(
        &self,
        resume_id: Uuid,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let indexed = self.loaded(resume_id).await?;
        let scores: Vec<f32> = indexed.vectors.iter().map(|v| cosine(query, v)).collect();
        Ok(top_k(&scores, k)
            .into_iter()
            .map(|i| ScoredChunk {
                chunk_index: indexed.chunks[i].index,
                text: indexed.chunks[i].text.clone(),
                score: scores[i],
            })
            .collect())
    }

    /// Runs the GPA regexes over the whole resume text. Chunk boundaries can
    /// cut a value short, so the text is reassembled first.
    pub async fn extract_gpa(&self, resume_id: Uuid) -> Result<Option<String>> {
        let indexed = self.loaded(resume_id).await?;
        Ok(find_gpa(&reassemble(&indexed.chunks)))
    }
}
