//! reno-core: shared types for the cold-call intelligence pipeline.
//!
//! The CRM creates a call record when an agent dials out; audio and
//! transcript/analytics arrive later, asynchronously, from different
//! producers. This crate owns the record's shape, the field-domain patch
//! types both ingestion stages write through, the error taxonomy, and the
//! normalization rules applied before any transcript write.

mod call;
mod config;
mod error;
pub mod normalize;

pub use call::{AudioFields, CallPatch, CallRecord, Transcript, TranscriptFields};
pub use config::RenoConfig;
pub use error::{IngestError, IngestResult};
