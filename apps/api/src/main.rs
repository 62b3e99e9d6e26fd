mod answers;
mod audit;
mod canonical;
mod classify;
mod config;
mod corrections;
mod db;
mod embeddings;
mod errors;
mod facts;
mod llm_client;
mod models;
mod oracle;
mod resume;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::answers::DecisionArbiter;
use crate::audit::PgAuditSink;
use crate::config::Config;
use crate::corrections::store::PgCorrectionStore;
use crate::db::create_pool;
use crate::embeddings::cache::CachedEmbedder;
use crate::embeddings::http::HttpEmbedder;
use crate::embeddings::Embedder;
use crate::llm_client::LlmClient;
use crate::oracle::LlmOracle;
use crate::resume::{PgChunkRepository, ResumeIndex};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration errors are fatal before anything else starts
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting formfill API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Redis (embedding cache)
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Embedding function
    let http_embedder = HttpEmbedder::new(
        &config.embedding_api_key,
        &config.embedding_api_url,
        config.embedding_model.clone(),
    )?;
    let embedder: Arc<dyn Embedder> = Arc::new(CachedEmbedder::new(http_embedder, redis));
    info!("Embedder initialized (model: {})", embedder.model_name());

    // Decision oracle
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    let oracle = Arc::new(LlmOracle::new(llm));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let corrections = Arc::new(PgCorrectionStore::new(db.clone()));
    let resumes = Arc::new(ResumeIndex::new(
        embedder.clone(),
        Arc::new(PgChunkRepository::new(db.clone())),
        config.rag.resume_chunk_size,
        config.rag.resume_chunk_overlap,
    )
    .with_capacity(config.rag.resume_index_capacity));
    let audit = Arc::new(PgAuditSink::new(db.clone()));

    let arbiter = Arc::new(DecisionArbiter::new(
        embedder,
        corrections.clone(),
        resumes.clone(),
        oracle,
        audit,
        config.rag.clone(),
    ));
    info!(
        "Decision arbiter ready (autofill >= {}, oracle concurrency {})",
        config.rag.min_confidence_to_autofill, config.rag.oracle_max_concurrency
    );

    let state = AppState {
        db,
        s3,
        config: config.clone(),
        arbiter,
        resumes,
        corrections,
    };

    // The browser extension calls from arbitrary origins
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "formfill-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
