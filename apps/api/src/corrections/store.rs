//! Correction store — human-confirmed answers keyed by field identity.
//!
//! Reads happen during resolution (one atomic `UPDATE ... RETURNING` that also
//! bumps `hits`). Writes only happen through the explicit bulk upsert path.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::corrections::fingerprint::CorrectionKey;
use crate::models::correction::CorrectionRow;

/// How the client should apply a corrected value to the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStrategy {
    #[default]
    SetValue,
    SelectOption,
    CheckRadio,
    ToggleCheckbox,
}

impl FillStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillStrategy::SetValue => "set_value",
            FillStrategy::SelectOption => "select_option",
            FillStrategy::CheckRadio => "check_radio",
            FillStrategy::ToggleCheckbox => "toggle_checkbox",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correction {
    pub id: Uuid,
    pub correct_value: String,
    pub fill_strategy: String,
    pub hits: i64,
}

impl From<CorrectionRow> for Correction {
    fn from(row: CorrectionRow) -> Self {
        Self {
            id: row.id,
            correct_value: row.correct_value,
            fill_strategy: row.fill_strategy,
            hits: row.hits,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorrectionUpsert {
    pub key: CorrectionKey,
    pub correct_value: String,
    pub fill_strategy: FillStrategy,
}

#[derive(Debug, Error)]
pub enum CorrectionStoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait CorrectionStore: Send + Sync {
    /// Returns the correction for `key` if one exists with a non-empty value,
    /// incrementing its hit counter.
    async fn lookup(&self, key: &CorrectionKey) -> Result<Option<Correction>, CorrectionStoreError>;

    /// Inserts or updates every entry by key, atomically as one batch.
    async fn upsert_many(&self, entries: &[CorrectionUpsert]) -> Result<usize, CorrectionStoreError>;
}

pub struct PgCorrectionStore {
    pool: PgPool,
}

impl PgCorrectionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CorrectionStore for PgCorrectionStore {
    async fn lookup(&self, key: &CorrectionKey) -> Result<Option<Correction>, CorrectionStoreError> {
        let row: Option<CorrectionRow> = sqlx::query_as(
            r#"
            UPDATE field_corrections
            SET hits = hits + 1, last_hit_at = now()
            WHERE domain = $1 AND fingerprint = $2 AND options_hash = $3
              AND btrim(correct_value) <> ''
            RETURNING *
            "#,
        )
        .bind(&key.domain)
        .bind(&key.fingerprint)
        .bind(&key.options_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Correction::from))
    }

    async fn upsert_many(&self, entries: &[CorrectionUpsert]) -> Result<usize, CorrectionStoreError> {
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO field_corrections
                    (id, domain, fingerprint, options_hash, correct_value, fill_strategy)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (domain, fingerprint, options_hash) DO UPDATE
                SET correct_value = EXCLUDED.correct_value,
                    fill_strategy = EXCLUDED.fill_strategy,
                    updated_at = now()
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&entry.key.domain)
            .bind(&entry.key.fingerprint)
            .bind(&entry.key.options_hash)
            .bind(&entry.correct_value)
            .bind(entry.fill_strategy.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Upserted {} field corrections", entries.len());
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCorrectionStore;

    fn key(fp: &str) -> CorrectionKey {
        CorrectionKey {
            domain: "acme.com".to_string(),
            fingerprint: fp.to_string(),
            options_hash: "opts".to_string(),
        }
    }

    fn upsert(fp: &str, value: &str) -> CorrectionUpsert {
        CorrectionUpsert {
            key: key(fp),
            correct_value: value.to_string(),
            fill_strategy: FillStrategy::SetValue,
        }
    }

    #[test]
    fn test_fill_strategy_wire_names() {
        let s: FillStrategy = serde_json::from_str("\"select_option\"").unwrap();
        assert_eq!(s, FillStrategy::SelectOption);
        assert_eq!(s.as_str(), "select_option");
        assert_eq!(FillStrategy::default().as_str(), "set_value");
    }

    #[tokio::test]
    async fn test_upsert_updates_in_place() {
        let store = MemoryCorrectionStore::default();
        store.upsert_many(&[upsert("fp", "first")]).await.unwrap();
        store.upsert_many(&[upsert("fp", "second")]).await.unwrap();
        assert_eq!(store.len(), 1);
        let hit = store.lookup(&key("fp")).await.unwrap().unwrap();
        assert_eq!(hit.correct_value, "second");
    }

    #[tokio::test]
    async fn test_lookup_increments_hits() {
        let store = MemoryCorrectionStore::default();
        store.upsert_many(&[upsert("fp", "v")]).await.unwrap();
        assert_eq!(store.lookup(&key("fp")).await.unwrap().unwrap().hits, 1);
        assert_eq!(store.lookup(&key("fp")).await.unwrap().unwrap().hits, 2);
    }

    #[tokio::test]
    async fn test_blank_value_is_a_miss() {
        let store = MemoryCorrectionStore::default();
        store.upsert_many(&[upsert("fp", "   ")]).await.unwrap();
        assert!(store.lookup(&key("fp")).await.unwrap().is_none());
        assert!(store.lookup(&key("other")).await.unwrap().is_none());
    }
}
