use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CorrectionRow {
    pub id: Uuid,
    pub domain: String,
    pub fingerprint: String,
    pub options_hash: String,
    pub correct_value: String,
    pub fill_strategy: String,
    pub hits: i64,
    pub last_hit_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
