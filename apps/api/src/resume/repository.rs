//! Durable storage for resume chunks.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::resume::ResumeChunkRow;
use crate::resume::chunker::Chunk;

#[async_trait]
pub trait ChunkRepository: Send + Sync {
    /// Atomically replaces every stored chunk of `resume_id` with `chunks`.
    async fn replace(&self, resume_id: Uuid, chunks: &[Chunk]) -> Result<()>;

    /// Stored chunks of `resume_id` in index order. Empty if none.
    async fn load(&self, resume_id: Uuid) -> Result<Vec<Chunk>>;
}

pub struct PgChunkRepository {
    pool: PgPool,
}

impl PgChunkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChunkRepository for PgChunkRepository {
    async fn replace(&self, resume_id: Uuid, chunks: &[Chunk]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM resume_chunks WHERE resume_id = $1")
            .bind(resume_id)
            .execute(&mut *tx)
            .await?;

        for chunk in chunks {
            sqlx::query(
                "INSERT INTO resume_chunks (resume_id, chunk_index, char_start, text) VALUES ($1, $2, $3, $4)",
            )
            .bind(resume_id)
            .bind(i32::try_from(chunk.index)?)
            .bind(i32::try_from(chunk.start)?)
            .bind(&chunk.text)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load(&self, resume_id: Uuid) -> Result<Vec<Chunk>> {
        let rows = sqlx::query_as::<_, ResumeChunkRow>(
            "SELECT * FROM resume_chunks WHERE resume_id = $1 ORDER BY chunk_index",
        )
        .bind(resume_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Chunk {
                    index: usize::try_from(row.chunk_index)?,
                    start: usize::try_from(row.char_start)?,
                    text: row.text,
                })
            })
            .collect()
    }
}
