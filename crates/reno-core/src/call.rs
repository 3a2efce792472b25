//! Call record data model and per-stage field-domain patches.
//!
//! A `CallRecord` accumulates data over time: the audio stage writes
//! `{audio_url, audio_duration_seconds}`, the transcript stage writes
//! `{transcript, summary, global_sentiment, keywords, conversation_analytics}`.
//! `CallPatch` makes the two domains disjoint at the type level so neither
//! stage can clobber the other's committed fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Transcript payload: full text plus ordered, opaque producer segments.
/// Segments carry start/end offsets, speaker, text — the pipeline stores
/// them verbatim and never interprets their internal shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    #[serde(default)]
    pub segments: Vec<Value>,
}

/// One cold call as persisted by the Call Record Store.
/// Created upstream by the CRM; both ingestion stages only update it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    /// Opaque identifier assigned at creation. Immutable, unique.
    pub id: String,
    /// Blob-store URL for the latest uploaded audio. Last write wins.
    #[serde(default)]
    pub audio_url: Option<String>,
    /// Rounded from the caller's fractional duration. Non-negative.
    #[serde(default)]
    pub audio_duration_seconds: Option<u32>,
    #[serde(default)]
    pub transcript: Option<Transcript>,
    /// Never stored empty while `transcript.text` is non-empty (see normalize).
    #[serde(default)]
    pub summary: Option<String>,
    /// Caller-supplied, stored verbatim. Never synthesized.
    #[serde(default)]
    pub global_sentiment: Option<String>,
    /// Producer-ranked keywords. Empty when absent, never null.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Open-ended producer metrics (talk-ratio, interruptions, ...).
    /// Empty map when absent, never null.
    #[serde(default)]
    pub conversation_analytics: Map<String, Value>,
}

impl CallRecord {
    /// A fresh record with only the id set, as the CRM creates it.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            audio_url: None,
            audio_duration_seconds: None,
            transcript: None,
            summary: None,
            global_sentiment: None,
            keywords: Vec::new(),
            conversation_analytics: Map::new(),
        }
    }

    /// Apply a patch in-place with merge-patch semantics: only the patch's
    /// own field domain changes. A `None` duration leaves the stored value
    /// untouched; a transcript patch fully overwrites its domain.
    pub fn apply(&mut self, patch: CallPatch) {
        match patch {
            CallPatch::Audio(a) => {
                self.audio_url = Some(a.audio_url);
                if let Some(d) = a.audio_duration_seconds {
                    self.audio_duration_seconds = Some(d);
                }
            }
            CallPatch::Transcript(t) => {
                self.transcript = Some(t.transcript);
                self.summary = Some(t.summary);
                self.global_sentiment = t.global_sentiment;
                self.keywords = t.keywords;
                self.conversation_analytics = t.conversation_analytics;
            }
        }
    }
}

/// Audio-domain fieldset written by the Audio Ingestion Stage.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFields {
    /// Always present: every successful ingestion stores a new blob and
    /// repoints the record at it.
    pub audio_url: String,
    /// `None` means the caller declared no duration; keep the stored value.
    pub audio_duration_seconds: Option<u32>,
}

/// Transcript-domain fieldset, produced by `normalize::normalize_transcript`.
/// `summary` is non-optional here: normalization guarantees a fallback, so
/// an empty summary can never reach the store.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptFields {
    pub transcript: Transcript,
    pub summary: String,
    pub global_sentiment: Option<String>,
    pub keywords: Vec<String>,
    pub conversation_analytics: Map<String, Value>,
}

/// One stage's atomic partial update. The store applies exactly one variant
/// per call, blind (no pre-read), which is what lets the two stages
/// interleave for the same call without coordination.
#[derive(Debug, Clone, PartialEq)]
pub enum CallPatch {
    Audio(AudioFields),
    Transcript(TranscriptFields),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript_fields(text: &str) -> TranscriptFields {
        TranscriptFields {
            transcript: Transcript {
                text: text.to_string(),
                segments: Vec::new(),
            },
            summary: text.to_string(),
            global_sentiment: Some("positivo".to_string()),
            keywords: vec!["precio".to_string()],
            conversation_analytics: Map::new(),
        }
    }

    #[test]
    fn audio_patch_leaves_transcript_domain_untouched() {
        let mut record = CallRecord::new("abc123");
        record.apply(CallPatch::Transcript(transcript_fields("Hola")));
        record.apply(CallPatch::Audio(AudioFields {
            audio_url: "/media/calls-audio/abc123-1.webm".to_string(),
            audio_duration_seconds: Some(43),
        }));

        assert_eq!(record.summary.as_deref(), Some("Hola"));
        assert_eq!(record.keywords, vec!["precio".to_string()]);
        assert_eq!(record.audio_duration_seconds, Some(43));
    }

    #[test]
    fn transcript_patch_leaves_audio_domain_untouched() {
        let mut record = CallRecord::new("abc123");
        record.apply(CallPatch::Audio(AudioFields {
            audio_url: "/media/calls-audio/abc123-1.webm".to_string(),
            audio_duration_seconds: Some(43),
        }));
        record.apply(CallPatch::Transcript(transcript_fields("Hola")));

        assert_eq!(
            record.audio_url.as_deref(),
            Some("/media/calls-audio/abc123-1.webm")
        );
        assert_eq!(record.audio_duration_seconds, Some(43));
    }

    #[test]
    fn none_duration_preserves_previous_value() {
        let mut record = CallRecord::new("abc123");
        record.apply(CallPatch::Audio(AudioFields {
            audio_url: "/media/a.webm".to_string(),
            audio_duration_seconds: Some(43),
        }));
        record.apply(CallPatch::Audio(AudioFields {
            audio_url: "/media/b.webm".to_string(),
            audio_duration_seconds: None,
        }));

        assert_eq!(record.audio_url.as_deref(), Some("/media/b.webm"));
        assert_eq!(record.audio_duration_seconds, Some(43));
    }

    #[test]
    fn transcript_reingestion_overwrites_whole_domain() {
        let mut record = CallRecord::new("abc123");
        record.apply(CallPatch::Transcript(transcript_fields("first")));

        let mut corrected = transcript_fields("corrected");
        corrected.global_sentiment = None;
        corrected.keywords = Vec::new();
        record.apply(CallPatch::Transcript(corrected));

        assert_eq!(record.summary.as_deref(), Some("corrected"));
        assert_eq!(record.global_sentiment, None);
        assert!(record.keywords.is_empty());
    }
}
