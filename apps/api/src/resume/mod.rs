//! Resume Retriever: chunking, a per-resume vector index, and the GPA fast path.

pub mod chunker;
pub mod gpa;
pub mod handlers;
pub mod index;
pub mod ingest;
pub mod repository;

pub use index::{ResumeIndex, ScoredChunk};
pub use repository::{ChunkRepository, PgChunkRepository};
