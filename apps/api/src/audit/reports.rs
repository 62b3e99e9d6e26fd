//! Page scan reports: how well a page's fields classified, kept for offline analysis.

use anyhow::Result;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::canonical::CanonicalKey;
use crate::classify::merger::ClassificationResult;
use crate::errors::AppError;
use crate::models::field::FieldDescriptor;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScanReportRequest {
    pub url: String,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub id: Uuid,
    pub url: String,
    pub field_count: usize,
    pub unknown_count: usize,
    /// Mapped to a key but below the strong-canonical threshold.
    pub low_confidence_count: usize,
    pub results: Vec<ClassificationResult>,
}

impl ScanReport {
    pub fn new(url: String, results: Vec<ClassificationResult>, strong_threshold: f64) -> Self {
        let unknown_count = results
            .iter()
            .filter(|r| r.canonical_key == CanonicalKey::Unknown)
            .count();
        let low_confidence_count = results
            .iter()
            .filter(|r| r.canonical_key != CanonicalKey::Unknown && r.confidence < strong_threshold)
            .count();
        Self {
            id: Uuid::new_v4(),
            url,
            field_count: results.len(),
            unknown_count,
            low_confidence_count,
            results,
        }
    }
}

pub async fn insert_scan_report(pool: &PgPool, report: &ScanReport) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO scan_reports
            (id, url, field_count, unknown_count, low_confidence_count, report)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(report.id)
    .bind(&report.url)
    .bind(i32::try_from(report.field_count)?)
    .bind(i32::try_from(report.unknown_count)?)
    .bind(i32::try_from(report.low_confidence_count)?)
    .bind(SqlJson(report))
    .execute(pool)
    .await?;
    Ok(())
}

/// POST /api/v1/reports/scan
pub async fn handle_scan_report(
    State(state): State<AppState>,
    Json(req): Json<ScanReportRequest>,
) -> Result<Json<ScanReport>, AppError> {
    if req.url.trim().is_empty() {
        return Err(AppError::Validation("url cannot be empty".to_string()));
    }
    let results = state.arbiter.classifier().classify(&req.fields).await;
    let report = ScanReport::new(req.url, results, state.config.rag.canonical_confidence_strong);
    insert_scan_report(&state.db, &report).await?;

    info!(
        "Scan report {} for {}: {} fields, {} unknown, {} low confidence",
        report.id, report.url, report.field_count, report.unknown_count, report.low_confidence_count
    );
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::merger::merge;
    use crate::classify::semantic::SemanticMatch;

    #[test]
    fn test_report_counts() {
        let results = vec![
            merge("a", Some(CanonicalKey::Email), None),
            merge("b", None, Some(SemanticMatch { key: CanonicalKey::City, score: 0.5 })),
            merge("c", None, Some(SemanticMatch { key: CanonicalKey::Unknown, score: 0.2 })),
            merge("d", None, None),
        ];
        let report = ScanReport::new("https://acme.com/apply".to_string(), results, 0.75);
        assert_eq!(report.field_count, 4);
        assert_eq!(report.unknown_count, 2);
        assert_eq!(report.low_confidence_count, 1);
    }
}
