//! End-to-end pipeline behavior over the real SQLite store and filesystem
//! blob store: stage commutativity, retry idempotence, and the full
//! cold-call scenario (audio upload then transcript merge).

use reno_calls::{
    AudioIngest, AudioIngestRequest, CallRecordStore, FsBlobStore, SqliteCallStore,
    TranscriptIngest, TranscriptIngestRequest,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

struct Pipeline {
    store: Arc<SqliteCallStore>,
    audio: AudioIngest,
    transcript: TranscriptIngest,
    _dir: tempfile::TempDir,
}

fn pipeline() -> Pipeline {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteCallStore::new(dir.path().join("calls.sqlite")).unwrap());
    let blobs = Arc::new(FsBlobStore::new(
        dir.path().join("media"),
        "/media".to_string(),
    ));
    let timeout = Duration::from_secs(5);
    Pipeline {
        audio: AudioIngest::new(store.clone(), blobs, timeout),
        transcript: TranscriptIngest::new(store.clone(), timeout),
        store,
        _dir: dir,
    }
}

fn audio_request(call_id: &str) -> AudioIngestRequest {
    AudioIngestRequest {
        call_id: call_id.to_string(),
        filename: Some("call.webm".to_string()),
        content: vec![7u8; 2048],
        declared_duration_seconds: Some(42.7),
    }
}

fn transcript_request(call_id: &str) -> TranscriptIngestRequest {
    TranscriptIngestRequest {
        call_id: call_id.to_string(),
        text: "Hola, buenos días, llamo por el presupuesto de la reforma".to_string(),
        segments: vec![json!({"start": 0.0, "end": 3.2, "speaker": "agent", "text": "Hola"})],
        summary: None,
        sentiment: Some("positivo".to_string()),
        keywords: Some(vec!["precio".to_string(), "reforma".to_string()]),
        analytics: None,
    }
}

#[tokio::test]
async fn full_scenario_audio_then_transcript() {
    let p = pipeline();
    p.store.create("abc123").await.unwrap();

    let out = p.audio.ingest(audio_request("abc123")).await.unwrap();
    let record = p.store.get("abc123").await.unwrap().unwrap();
    assert_eq!(record.audio_url.as_deref(), Some(out.url.as_str()));
    assert_eq!(record.audio_duration_seconds, Some(43));

    p.transcript
        .ingest(transcript_request("abc123"))
        .await
        .unwrap();
    let record = p.store.get("abc123").await.unwrap().unwrap();
    assert_eq!(
        record.summary.as_deref(),
        Some("Hola, buenos días, llamo por el presupuesto de la reforma")
    );
    assert_eq!(record.global_sentiment.as_deref(), Some("positivo"));
    assert_eq!(record.keywords, vec!["precio", "reforma"]);
    assert!(record.conversation_analytics.is_empty());
    assert_eq!(record.transcript.as_ref().unwrap().segments.len(), 1);
    // Audio domain untouched by the transcript merge.
    assert_eq!(record.audio_url.as_deref(), Some(out.url.as_str()));
    assert_eq!(record.audio_duration_seconds, Some(43));
}

#[tokio::test]
async fn stages_commute_transcript_first() {
    let p = pipeline();
    p.store.create("abc123").await.unwrap();

    p.transcript
        .ingest(transcript_request("abc123"))
        .await
        .unwrap();
    p.audio.ingest(audio_request("abc123")).await.unwrap();

    let record = p.store.get("abc123").await.unwrap().unwrap();
    assert!(record.audio_url.is_some());
    assert_eq!(record.audio_duration_seconds, Some(43));
    assert_eq!(record.keywords, vec!["precio", "reforma"]);
    assert_eq!(record.global_sentiment.as_deref(), Some("positivo"));
}

#[tokio::test]
async fn audio_retry_creates_new_blob_and_repoints_record() {
    let p = pipeline();
    p.store.create("abc123").await.unwrap();

    let first = p.audio.ingest(audio_request("abc123")).await.unwrap();
    // Keys embed unix millis; make sure the retry lands in a later tick.
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = p.audio.ingest(audio_request("abc123")).await.unwrap();

    assert_ne!(first.url, second.url);
    let record = p.store.get("abc123").await.unwrap().unwrap();
    assert_eq!(record.audio_url.as_deref(), Some(second.url.as_str()));
}

#[tokio::test]
async fn corrected_transcript_overwrites_but_keeps_audio() {
    let p = pipeline();
    p.store.create("abc123").await.unwrap();
    p.audio.ingest(audio_request("abc123")).await.unwrap();
    p.transcript
        .ingest(transcript_request("abc123"))
        .await
        .unwrap();

    let mut corrected = transcript_request("abc123");
    corrected.text = "Corrección: llamo por la reforma del baño".to_string();
    corrected.sentiment = None;
    corrected.keywords = None;
    p.transcript.ingest(corrected).await.unwrap();

    let record = p.store.get("abc123").await.unwrap().unwrap();
    assert_eq!(
        record.transcript.as_ref().unwrap().text,
        "Corrección: llamo por la reforma del baño"
    );
    assert_eq!(
        record.summary.as_deref(),
        Some("Corrección: llamo por la reforma del baño")
    );
    assert_eq!(record.global_sentiment, None);
    assert!(record.keywords.is_empty());
    assert!(record.audio_url.is_some());
    assert_eq!(record.audio_duration_seconds, Some(43));
}

#[tokio::test]
async fn long_text_summary_defaults_to_280_chars() {
    let p = pipeline();
    p.store.create("abc123").await.unwrap();

    let mut req = transcript_request("abc123");
    req.text = "día ".repeat(200);
    req.summary = None;
    p.transcript.ingest(req.clone()).await.unwrap();

    let record = p.store.get("abc123").await.unwrap().unwrap();
    let summary = record.summary.unwrap();
    assert_eq!(summary.chars().count(), 280);
    let expected: String = req.text.chars().take(280).collect();
    assert_eq!(summary, expected);
}
