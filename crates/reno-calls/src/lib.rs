//! reno-calls: the cold-call intelligence ingestion pipeline.
//!
//! Two independent write paths update disjoint field domains of a call
//! record: the audio stage persists the payload to the blob store and
//! repoints the record, the transcript stage merges transcript + analytics
//! with normalization defaults. Neither reads the other's output; the
//! store's atomic partial update is the only synchronization point.

mod audio;
mod blob;
pub mod memory;
mod store;
mod transcript;

pub use audio::{AudioIngest, AudioIngestOutcome, AudioIngestRequest};
pub use blob::{open_blob_store, BlobStore, FsBlobStore, UnconfiguredBlobStore};
pub use store::{open_call_store, CallRecordStore, SqliteCallStore, UnconfiguredCallStore};
pub use transcript::{TranscriptIngest, TranscriptIngestRequest};

/// Current wall-clock time in unix milliseconds (0 if the clock is broken).
pub(crate) fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
