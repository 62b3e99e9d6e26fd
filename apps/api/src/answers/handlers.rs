use axum::{extract::State, Json};
use tracing::info;

use crate::answers::models::{AnswerRequest, AnswerResponse};
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/v1/answers
///
/// Always answers every field; internal failures surface as unresolved
/// decisions, never as an error response.
pub async fn handle_answers(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let field_count = request.fields.len();
    let answers = state.arbiter.resolve_all(request).await;

    let filled = answers.iter().filter(|d| d.autofill).count();
    info!("Resolved {field_count} fields, {filled} autofilled");

    Ok(Json(AnswerResponse { answers }))
}
