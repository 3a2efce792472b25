//! Error taxonomy for the call ingestion pipeline.
//!
//! Validation errors are raised before any I/O; dependency errors carry the
//! originating cause in the message. No kind triggers an in-process retry —
//! both ingestion stages are safe for the caller to retry whole.

use thiserror::Error;

/// Result type alias for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that can occur while ingesting call audio or transcripts.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Caller omitted or emptied a required field. Detected before any I/O.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// The referenced call record does not exist; neither stage creates one.
    #[error("call record not found: {0}")]
    RecordNotFound(String),

    /// Blob write failed or timed out. Nothing was committed to the record.
    #[error("blob storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Record-store write failed or timed out.
    #[error("call record store failure: {0}")]
    StoreFailure(String),

    /// Backend not configured (no DB path / media root). Short-circuits
    /// before any I/O is attempted; distinct from a transient failure.
    #[error("storage dependency missing: {0}")]
    StorageDependencyMissing(String),
}

impl IngestError {
    /// Whether retrying the whole request is safe. Dependency failures are;
    /// bad input and unknown records are not (they will fail again).
    pub fn retry_safe(&self) -> bool {
        matches!(
            self,
            IngestError::StorageUnavailable(_) | IngestError::StoreFailure(_)
        )
    }
}
