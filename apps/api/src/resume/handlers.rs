//! Axum route handlers for resume upload and re-indexing.

use std::future::Future;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::resume::chunker::collapse_whitespace;
use crate::resume::ingest::{self, NewResume};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ResumeIndexedResponse {
    pub resume_id: Uuid,
    pub chunk_count: usize,
    pub sha256: String,
}

async fn read_file_part(mut multipart: Multipart) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("resume").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        return Ok((filename, bytes));
    }
    Err(AppError::Validation("multipart field 'file' is required".to_string()))
}

async fn extract_nonempty(filename: &str, bytes: Bytes) -> Result<String, AppError> {
    let text = ingest::extract_text(filename, bytes)
        .await
        .map_err(|e| AppError::UnprocessableEntity(e.to_string()))?;
    let text = collapse_whitespace(&text);
    if text.is_empty() {
        return Err(AppError::Validation(
            "No text could be extracted from the uploaded resume".to_string(),
        ));
    }
    Ok(text)
}

/// Awaits `undo` only when `result` is an error, then returns `result` as is.
async fn undo_on_error<T, E, U>(result: Result<T, E>, undo: U) -> Result<T, E>
where
    U: Future<Output = ()>,
{
    if result.is_err() {
        undo.await;
    }
    result
}

/// Removes everything a failed upload left behind. Failures here are logged;
/// the caller reports the original error.
async fn discard_upload(state: &AppState, resume_id: Uuid, key: &str) {
    state.resumes.forget(resume_id).await;
    if let Err(e) = ingest::delete_resume(&state.db, resume_id).await {
        warn!("Failed to delete resume row {resume_id} after a failed upload: {e}");
    }
    if let Err(e) = ingest::delete_object(&state.s3, &state.config.s3_bucket, key).await {
        warn!("Failed to delete s3 object {key} after a failed upload: {e}");
    }
}

/// POST /api/v1/resumes
///
/// Stores the uploaded file, extracts its text and builds the search index.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ResumeIndexedResponse>, AppError> {
    let (filename, bytes) = read_file_part(multipart).await?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    let resume_id = Uuid::new_v4();
    let sha256 = ingest::sha256_hex(&bytes);
    let text = extract_nonempty(&filename, bytes.clone()).await?;

    let key = ingest::s3_key(resume_id, &filename);
    ingest::upload(&state.s3, &state.config.s3_bucket, &key, bytes)
        .await
        .map_err(|e| AppError::S3(e.to_string()))?;

    // Chunks reference the resume row, so it goes in first with no chunks.
    let char_count = text.chars().count();
    let indexed = async {
        ingest::insert_resume(
            &state.db,
            &NewResume {
                id: resume_id,
                original_filename: &filename,
                s3_key: &key,
                sha256: &sha256,
                char_count,
                chunk_count: 0,
            },
        )
        .await?;
        let chunk_count = state.resumes.build_index(resume_id, &text).await?;
        ingest::update_counts(&state.db, resume_id, char_count, chunk_count).await?;
        Ok::<_, AppError>(chunk_count)
    }
    .await;
    let chunk_count = undo_on_error(indexed, discard_upload(&state, resume_id, &key)).await?;

    info!("Stored resume {resume_id} ({filename}, {chunk_count} chunks)");
    Ok(Json(ResumeIndexedResponse {
        resume_id,
        chunk_count,
        sha256,
    }))
}

/// POST /api/v1/resumes/:id/reindex
///
/// Re-extracts the stored file and rebuilds its index from scratch.
pub async fn handle_reindex_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<ResumeIndexedResponse>, AppError> {
    let resume = ingest::get_resume(&state.db, resume_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {resume_id} not found")))?;

    let bytes = ingest::download(&state.s3, &state.config.s3_bucket, &resume.s3_key)
        .await
        .map_err(|e| AppError::S3(e.to_string()))?;
    let text = extract_nonempty(&resume.original_filename, bytes).await?;

    let chunk_count = state.resumes.build_index(resume_id, &text).await?;
    ingest::update_counts(&state.db, resume_id, text.chars().count(), chunk_count).await?;

    Ok(Json(ResumeIndexedResponse {
        resume_id,
        chunk_count,
        sha256: resume.sha256,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_undo_runs_only_on_error() {
        let calls = AtomicUsize::new(0);
        let undone = &calls;
        let undo = move || async move {
            undone.fetch_add(1, Ordering::SeqCst);
        };

        let ok: Result<usize, AppError> = undo_on_error(Ok(3), undo()).await;
        assert_eq!(ok.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let failed: Result<usize, AppError> =
            undo_on_error(Err(AppError::Internal(anyhow::anyhow!("index failed"))), undo()).await;
        assert!(matches!(failed, Err(AppError::Internal(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
