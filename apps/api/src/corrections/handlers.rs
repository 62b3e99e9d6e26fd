use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::corrections::fingerprint::{domain_from_url, normalize_domain, CorrectionKey};
use crate::corrections::store::{CorrectionStoreError, CorrectionUpsert, FillStrategy};
use crate::errors::AppError;
use crate::models::field::FieldDescriptor;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CorrectionEntry {
    pub field: FieldDescriptor,
    pub correct_value: String,
    #[serde(default)]
    pub fill_strategy: FillStrategy,
}

#[derive(Debug, Deserialize)]
pub struct SaveCorrectionsRequest {
    /// Bare host. Takes precedence over `url` when both are sent.
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub corrections: Vec<CorrectionEntry>,
}

#[derive(Debug, Serialize)]
pub struct SaveCorrectionsResponse {
    pub domain: String,
    pub saved: usize,
}

impl From<CorrectionStoreError> for AppError {
    fn from(e: CorrectionStoreError) -> Self {
        match e {
            CorrectionStoreError::Database(e) => AppError::Database(e),
        }
    }
}

/// Resolves the request's domain and converts entries into keyed upserts.
/// Rejects the whole batch if any entry is blank.
pub fn build_upserts(
    req: SaveCorrectionsRequest,
) -> Result<(String, Vec<CorrectionUpsert>), AppError> {
    let domain = match (req.domain.as_deref(), req.url.as_deref()) {
        (Some(d), _) if !d.trim().is_empty() => normalize_domain(d),
        (_, Some(u)) => domain_from_url(u),
        _ => String::new(),
    };
    if domain.is_empty() {
        return Err(AppError::Validation(
            "domain or url is required".to_string(),
        ));
    }

    let mut upserts = Vec::with_capacity(req.corrections.len());
    for (i, entry) in req.corrections.into_iter().enumerate() {
        let value = entry.correct_value.trim();
        if value.is_empty() {
            return Err(AppError::Validation(format!(
                "corrections[{i}].correct_value cannot be empty"
            )));
        }
        upserts.push(CorrectionUpsert {
            key: CorrectionKey::for_field(&domain, &entry.field),
            correct_value: value.to_string(),
            fill_strategy: entry.fill_strategy,
        });
    }

    Ok((domain, upserts))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/corrections
pub async fn handle_save_corrections(
    State(state): State<AppState>,
    Json(req): Json<SaveCorrectionsRequest>,
) -> Result<Json<SaveCorrectionsResponse>, AppError> {
    let (domain, upserts) = build_upserts(req)?;
    let saved = state.corrections.upsert_many(&upserts).await?;
    Ok(Json(SaveCorrectionsResponse { domain, saved }))
}
