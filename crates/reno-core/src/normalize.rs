//! Default-derivation rules for transcript ingestion.
//!
//! Every transcript write goes through `normalize_transcript` before it
//! reaches the store, so the "summary is never empty while the text is
//! non-empty" invariant is enforced in exactly one place and is testable
//! without a store.

use crate::call::{Transcript, TranscriptFields};
use serde_json::{Map, Value};

/// Maximum length of a derived summary, in characters (not bytes).
pub const SUMMARY_MAX_CHARS: usize = 280;

/// First `SUMMARY_MAX_CHARS` characters of the transcript text.
pub fn derive_summary(text: &str) -> String {
    text.chars().take(SUMMARY_MAX_CHARS).collect()
}

/// Build the transcript-domain fieldset, filling defaults:
/// - `summary`: given non-blank value, else derived from `text`
/// - `keywords`: given sequence, else empty (never null)
/// - `conversation_analytics`: given record, else empty map (never null)
/// - `sentiment`: stays `None` when absent; an inferred sentiment would be
///   worse than "unknown"
pub fn normalize_transcript(
    text: String,
    segments: Vec<Value>,
    summary: Option<String>,
    sentiment: Option<String>,
    keywords: Option<Vec<String>>,
    analytics: Option<Map<String, Value>>,
) -> TranscriptFields {
    let summary = summary
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| derive_summary(&text));
    TranscriptFields {
        transcript: Transcript { text, segments },
        summary,
        global_sentiment: sentiment,
        keywords: keywords.unwrap_or_default(),
        conversation_analytics: analytics.unwrap_or_default(),
    }
}
