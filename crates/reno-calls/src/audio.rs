//! Audio Ingestion Stage: persist a call's audio payload and repoint the
//! record at the stored blob.
//!
//! The blob write and the record update are two distinct operations; if the
//! record update fails after a successful blob write, the orphaned blob is
//! a non-fatal leak (logged) and the whole call is safe to retry — every
//! ingestion creates a new object, only the record pointer is replaced.

use reno_core::{AudioFields, CallPatch, IngestError, IngestResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blob::BlobStore;
use crate::now_ms;
use crate::store::CallRecordStore;

/// Fallback container extension when the payload carries no filename hint.
/// The media type does not affect storage correctness, so an unknown
/// extension is never a failure.
const DEFAULT_AUDIO_EXT: &str = "webm";

/// One audio upload for an existing call.
#[derive(Debug, Clone)]
pub struct AudioIngestRequest {
    pub call_id: String,
    /// Filename hint from the uploader; only the extension is used.
    pub filename: Option<String>,
    pub content: Vec<u8>,
    /// Caller-measured duration, possibly fractional. Rounded on store.
    pub declared_duration_seconds: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct AudioIngestOutcome {
    /// Retrievable URL of the stored blob, as written onto the record.
    pub url: String,
}

/// The audio write path. Stateless across requests; stores are the only
/// shared resources and are externally synchronized.
pub struct AudioIngest {
    store: Arc<dyn CallRecordStore>,
    blobs: Arc<dyn BlobStore>,
    io_timeout: Duration,
}

impl AudioIngest {
    pub fn new(
        store: Arc<dyn CallRecordStore>,
        blobs: Arc<dyn BlobStore>,
        io_timeout: Duration,
    ) -> Self {
        Self {
            store,
            blobs,
            io_timeout,
        }
    }

    /// Validate, write the blob, update the record. Fails fast on bad input
    /// with no side effects.
    pub async fn ingest(&self, req: AudioIngestRequest) -> IngestResult<AudioIngestOutcome> {
        if req.call_id.trim().is_empty() {
            return Err(IngestError::MissingInput("call_id is required".to_string()));
        }
        if req.content.is_empty() {
            return Err(IngestError::MissingInput(
                "audio payload is required".to_string(),
            ));
        }
        let duration = match req.declared_duration_seconds {
            Some(d) if !d.is_finite() || d < 0.0 => {
                return Err(IngestError::MissingInput(
                    "duration_seconds must be a non-negative number".to_string(),
                ));
            }
            Some(d) => Some(d.round() as u32),
            None => None,
        };

        // Timestamped key: collision-resistant across repeated uploads for
        // the same call, still traceable to it.
        let ext = audio_extension(req.filename.as_deref());
        let key = format!("calls-audio/{}-{}.{}", req.call_id, now_ms(), ext);

        let url = timeout(self.io_timeout, self.blobs.put(&key, &req.content, true))
            .await
            .map_err(|_| IngestError::StorageUnavailable("blob write timed out".to_string()))??;

        let patch = CallPatch::Audio(AudioFields {
            audio_url: url.clone(),
            audio_duration_seconds: duration,
        });
        let update = timeout(
            self.io_timeout,
            self.store.update_partial(&req.call_id, patch),
        )
        .await
        .map_err(|_| IngestError::StoreFailure("record update timed out".to_string()))?;

        match update {
            Ok(_) => {
                tracing::info!(
                    target: "reno::audio",
                    call_id = %req.call_id,
                    key = %key,
                    bytes = req.content.len(),
                    "audio attached"
                );
                Ok(AudioIngestOutcome { url })
            }
            Err(e) => {
                // Blob already written; keep it. Retrying the whole call is
                // safe: a new key is minted and the pointer overwritten.
                tracing::warn!(
                    target: "reno::audio",
                    call_id = %req.call_id,
                    key = %key,
                    "record update failed after blob write, orphaned blob kept: {}",
                    e
                );
                Err(e)
            }
        }
    }
}

/// Lowercased extension from the filename hint, or the default container.
fn audio_extension(filename: Option<&str>) -> String {
    filename
        .and_then(|f| f.rsplit_once('.'))
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_AUDIO_EXT.to_string())
}
