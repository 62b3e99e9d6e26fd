//! Append-only audit trail of oracle calls, and page scan reports.
//!
//! Nothing here is ever read back by the service.

pub mod reports;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// One oracle invocation: what was asked, what came back, how long it took.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub domain: String,
    pub field_id: String,
    pub oracle: String,
    pub request: Value,
    /// Raw answer before validation, absent when the call failed.
    pub response: Option<Value>,
    pub error: Option<String>,
    pub latency_ms: i64,
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, record: AuditRecord) -> Result<()>;
}

pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn append(&self, record: AuditRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO oracle_audit
                (id, domain, field_id, oracle, request, response, error, latency_ms)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(&record.domain)
        .bind(&record.field_id)
        .bind(&record.oracle)
        .bind(&record.request)
        .bind(&record.response)
        .bind(&record.error)
        .bind(record.latency_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
