//! Axum-based ingestion gateway for the cold-call intelligence pipeline.
//!
//! Exposes the two ingestion operations (audio upload, transcript merge)
//! plus call read-back and a health probe. When storage is deliberately
//! unconfigured the gateway still serves, answering 503 for ingestion
//! instead of failing slowly against a half-wired backend.

mod calls;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use reno_calls::{
    open_blob_store, open_call_store, AudioIngest, BlobStore, CallRecordStore, TranscriptIngest,
    UnconfiguredBlobStore, UnconfiguredCallStore,
};
use reno_core::{IngestError, RenoConfig};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

/// Shared handler state: the two stages and the store for read-back.
#[derive(Clone)]
pub struct AppState {
    pub audio: Arc<AudioIngest>,
    pub transcript: Arc<TranscriptIngest>,
    pub store: Arc<dyn CallRecordStore>,
    pub storage_configured: bool,
}

/// Wire stores from config. A deliberately disabled dependency degrades to
/// the unconfigured backends (503 per request); any other open failure is
/// fatal at startup.
fn build_state(config: &RenoConfig) -> Result<AppState, IngestError> {
    let mut storage_configured = true;

    let store: Arc<dyn CallRecordStore> = match open_call_store(config) {
        Ok(s) => Arc::new(s),
        Err(e @ IngestError::StorageDependencyMissing(_)) => {
            tracing::warn!(target: "reno::gateway", "degraded mode: {}", e);
            storage_configured = false;
            Arc::new(UnconfiguredCallStore)
        }
        Err(e) => return Err(e),
    };
    let blobs: Arc<dyn BlobStore> = match open_blob_store(config) {
        Ok(b) => Arc::new(b),
        Err(e @ IngestError::StorageDependencyMissing(_)) => {
            tracing::warn!(target: "reno::gateway", "degraded mode: {}", e);
            storage_configured = false;
            Arc::new(UnconfiguredBlobStore)
        }
        Err(e) => return Err(e),
    };

    let io_timeout = Duration::from_secs(config.io_timeout_secs);
    Ok(AppState {
        audio: Arc::new(AudioIngest::new(store.clone(), blobs, io_timeout)),
        transcript: Arc::new(TranscriptIngest::new(store.clone(), io_timeout)),
        store,
        storage_configured,
    })
}

fn build_app(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    Router::new()
        .route("/api/v1/health", get(calls::health_get))
        .route("/api/v1/calls/:call_id", get(calls::call_get))
        .route("/api/v1/calls/:call_id/audio", post(calls::ingest_audio_post))
        .route(
            "/api/v1/calls/:call_id/transcript",
            post(calls::ingest_transcript_post),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RenoConfig::from_env();
    let state = match build_state(&config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(target: "reno::gateway", "storage init failed: {}", e);
            std::process::exit(1);
        }
    };
    let app = build_app(state, config.max_upload_bytes);

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(target: "reno::gateway", "bind {} failed: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!(target: "reno::gateway", "listening on {}", addr);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(target: "reno::gateway", "server error: {}", e);
        std::process::exit(1);
    }
}
