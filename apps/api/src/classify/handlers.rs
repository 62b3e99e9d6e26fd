use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::classify::merger::ClassificationResult;
use crate::errors::AppError;
use crate::models::field::FieldDescriptor;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClassifyFieldsRequest {
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct ClassifyFieldsResponse {
    pub results: Vec<ClassificationResult>,
}

/// POST /api/v1/fields/classify
pub async fn handle_classify_fields(
    State(state): State<AppState>,
    Json(req): Json<ClassifyFieldsRequest>,
) -> Result<Json<ClassifyFieldsResponse>, AppError> {
    let results = state.arbiter.classifier().classify(&req.fields).await;
    Ok(Json(ClassifyFieldsResponse { results }))
}
