//! Call ingestion handlers.
//!
//! POST /api/v1/calls/{call_id}/audio — multipart: `audio` part (binary with
//! filename hint) + optional `duration_seconds` text part.
//! POST /api/v1/calls/{call_id}/transcript — JSON transcript + analytics.
//! GET  /api/v1/calls/{call_id} — record read-back for CRM screens.
//!
//! Failures always return `{"error": "..."}` with the status mapped from the
//! error kind; a partially-updated record is never reported as success.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use reno_calls::{AudioIngestRequest, TranscriptIngestRequest};
use reno_core::IngestError;
use serde_json::{Map, Value};

use crate::AppState;

/// Error-kind to HTTP status mapping: bad input 400, unknown record 404,
/// unconfigured dependency 503, dependency failure 500.
fn error_status(err: &IngestError) -> StatusCode {
    match err {
        IngestError::MissingInput(_) => StatusCode::BAD_REQUEST,
        IngestError::RecordNotFound(_) => StatusCode::NOT_FOUND,
        IngestError::StorageDependencyMissing(_) => StatusCode::SERVICE_UNAVAILABLE,
        IngestError::StorageUnavailable(_) | IngestError::StoreFailure(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: IngestError) -> (StatusCode, Json<Value>) {
    (
        error_status(&err),
        Json(serde_json::json!({ "error": err.to_string() })),
    )
}

/// POST /api/v1/calls/{call_id}/audio — persist the payload, repoint the record.
pub async fn ingest_audio_post(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let mut filename: Option<String> = None;
    let mut content: Vec<u8> = Vec::new();
    let mut declared_duration_seconds: Option<f64> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": format!("malformed multipart body: {e}") })),
                );
            }
        };
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio") => {
                filename = field.file_name().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => content = bytes.to_vec(),
                    Err(e) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(serde_json::json!({
                                "error": format!("failed to read audio part: {e}")
                            })),
                        );
                    }
                }
            }
            Some("duration_seconds") => {
                let text = field.text().await.unwrap_or_default();
                match text.trim().parse::<f64>() {
                    Ok(d) => declared_duration_seconds = Some(d),
                    Err(_) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(serde_json::json!({
                                "error": "duration_seconds must be a number"
                            })),
                        );
                    }
                }
            }
            // Unknown parts are skipped: producers may evolve their form.
            _ => {}
        }
    }

    let req = AudioIngestRequest {
        call_id,
        filename,
        content,
        declared_duration_seconds,
    };
    match state.audio.ingest(req).await {
        Ok(out) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "url": out.url })),
        ),
        Err(e) => error_response(e),
    }
}

/// Transcript body as the analysis process posts it. `call_id` comes from
/// the path. Everything except `text` is optional; opaque structures are
/// validated only for being well-formed JSON.
#[derive(serde::Deserialize)]
pub struct TranscriptBody {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub segments: Vec<Value>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub analytics: Option<Map<String, Value>>,
}

/// POST /api/v1/calls/{call_id}/transcript — merge transcript + analytics.
pub async fn ingest_transcript_post(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    Json(body): Json<TranscriptBody>,
) -> (StatusCode, Json<Value>) {
    let req = TranscriptIngestRequest {
        call_id,
        text: body.text,
        segments: body.segments,
        summary: body.summary,
        sentiment: body.sentiment,
        keywords: body.keywords,
        analytics: body.analytics,
    };
    match state.transcript.ingest(req).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true })),
        ),
        Err(e) => error_response(e),
    }
}

/// GET /api/v1/calls/{call_id} — full record for CRM list/detail screens.
pub async fn call_get(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.store.get(&call_id).await {
        Ok(Some(record)) => match serde_json::to_value(&record) {
            Ok(v) => (StatusCode::OK, Json(v)),
            Err(e) => error_response(IngestError::StoreFailure(e.to_string())),
        },
        Ok(None) => error_response(IngestError::RecordNotFound(call_id)),
        Err(e) => error_response(e),
    }
}

/// GET /api/v1/health — liveness plus whether storage is configured.
pub async fn health_get(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "storage_configured": state.storage_configured,
    }))
}
