//! Transcript Ingestion Stage: merge a completed transcript plus derived
//! analytics onto the call record.
//!
//! The external speech/NLP process delivers out-of-band, any time before or
//! after the audio upload. Defaults are filled by `reno_core::normalize`
//! before the single atomic update; re-ingestion (a corrected transcript)
//! fully overwrites the transcript domain, last write wins.

use reno_core::{normalize, CallPatch, IngestError, IngestResult};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::store::CallRecordStore;

/// One transcript delivery for an existing call.
#[derive(Debug, Clone)]
pub struct TranscriptIngestRequest {
    pub call_id: String,
    pub text: String,
    /// Opaque producer segments, stored verbatim in order.
    pub segments: Vec<Value>,
    pub summary: Option<String>,
    pub sentiment: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub analytics: Option<Map<String, Value>>,
}

/// The transcript write path.
pub struct TranscriptIngest {
    store: Arc<dyn CallRecordStore>,
    io_timeout: Duration,
}

impl TranscriptIngest {
    pub fn new(store: Arc<dyn CallRecordStore>, io_timeout: Duration) -> Self {
        Self { store, io_timeout }
    }

    /// Validate, normalize defaults, apply one atomic partial update.
    pub async fn ingest(&self, req: TranscriptIngestRequest) -> IngestResult<()> {
        if req.call_id.trim().is_empty() {
            return Err(IngestError::MissingInput("call_id is required".to_string()));
        }
        if req.text.trim().is_empty() {
            return Err(IngestError::MissingInput(
                "transcript text is required".to_string(),
            ));
        }

        let fields = normalize::normalize_transcript(
            req.text,
            req.segments,
            req.summary,
            req.sentiment,
            req.keywords,
            req.analytics,
        );
        timeout(
            self.io_timeout,
            self.store
                .update_partial(&req.call_id, CallPatch::Transcript(fields)),
        )
        .await
        .map_err(|_| IngestError::StoreFailure("record update timed out".to_string()))??;

        tracing::info!(target: "reno::transcript", call_id = %req.call_id, "transcript merged");
        Ok(())
    }
}
