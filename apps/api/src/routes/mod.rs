pub mod health;

use axum::{routing::get, routing::post, Router};

use crate::answers::handlers::handle_answers;
use crate::audit::reports::handle_scan_report;
use crate::classify::handlers::handle_classify_fields;
use crate::corrections::handlers::handle_save_corrections;
use crate::resume::handlers::{handle_reindex_resume, handle_upload_resume};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Resolution
        .route("/api/v1/fields/classify", post(handle_classify_fields))
        .route("/api/v1/answers", post(handle_answers))
        // Corrections
        .route("/api/v1/corrections", post(handle_save_corrections))
        // Resumes
        .route("/api/v1/resumes", post(handle_upload_resume))
        .route("/api/v1/resumes/:id/reindex", post(handle_reindex_resume))
        // Reports
        .route("/api/v1/reports/scan", post(handle_scan_report))
        .with_state(state)
}
