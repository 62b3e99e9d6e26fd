use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub original_filename: String,
    pub s3_key: String,
    pub sha256: String,
    pub char_count: i32,
    pub chunk_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeChunkRow {
    pub resume_id: Uuid,
    pub chunk_index: i32,
    pub char_start: i32,
    pub text: String,
}
