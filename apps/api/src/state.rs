use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::answers::DecisionArbiter;
use crate::config::Config;
use crate::corrections::CorrectionStore;
use crate::resume::ResumeIndex;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub config: Config,
    pub arbiter: Arc<DecisionArbiter>,
    /// Same index the arbiter searches; uploads rebuild it.
    pub resumes: Arc<ResumeIndex>,
    pub corrections: Arc<dyn CorrectionStore>,
}
