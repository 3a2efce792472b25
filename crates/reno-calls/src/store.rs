//! Call Record Store: blind partial updates over SQLite.
//!
//! Same bare-metal approach as the rest of the CRM: one file, connection
//! opened per operation, schema ensured on startup. `update_partial` is a
//! single UPDATE statement, so a reader never observes a record with only
//! half of one stage's fieldset applied, and callers never pre-read the
//! record (merge-patch semantics) — that is what makes the two ingestion
//! stages safe to interleave without coordination.

use async_trait::async_trait;
use reno_core::{CallPatch, CallRecord, IngestError, IngestResult, RenoConfig, Transcript};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::now_ms;

/// Boundary contract both ingestion stages rely on.
#[async_trait]
pub trait CallRecordStore: Send + Sync {
    /// Apply one stage's fieldset atomically. Fails `RecordNotFound` when
    /// the call id does not exist; neither stage creates records.
    async fn update_partial(&self, call_id: &str, patch: CallPatch) -> IngestResult<CallRecord>;

    /// Read a record back (CRM screens, tests). `None` when unknown.
    async fn get(&self, call_id: &str) -> IngestResult<Option<CallRecord>>;

    /// Create an empty record. Called by the CRM when an agent dials out,
    /// never by an ingestion stage.
    async fn create(&self, call_id: &str) -> IngestResult<CallRecord>;
}

/// Open the configured SQLite store, or report the dependency as missing
/// when the operator disabled it. The explicit error variant replaces the
/// lazily-initialized nullable client the old app carried around.
pub fn open_call_store(config: &RenoConfig) -> IngestResult<SqliteCallStore> {
    let path = config.db_path.clone().ok_or_else(|| {
        IngestError::StorageDependencyMissing(
            "call record store disabled (RENO_DB_PATH is empty)".to_string(),
        )
    })?;
    SqliteCallStore::new(path)
}

/// SQLite-backed call record store.
#[derive(Clone, Debug)]
pub struct SqliteCallStore {
    db_path: PathBuf,
}

impl SqliteCallStore {
    /// Open or create the DB and ensure the `calls` table exists.
    pub fn new(db_path: PathBuf) -> IngestResult<Self> {
        let this = Self { db_path };
        this.init().map_err(store_err)?;
        Ok(this)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection, rusqlite::Error> {
        Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
    }

    fn init(&self) -> Result<(), rusqlite::Error> {
        if let Some(parent) = self.db_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = self.open()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS calls (
                id TEXT PRIMARY KEY,
                audio_url TEXT NULL,
                audio_duration_seconds INTEGER NULL,
                transcript_json TEXT NULL,
                summary TEXT NULL,
                global_sentiment TEXT NULL,
                keywords_json TEXT NOT NULL DEFAULT '[]',
                analytics_json TEXT NOT NULL DEFAULT '{}',
                created_at_ms INTEGER NOT NULL,
                updated_at_ms INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn update_partial_blocking(&self, call_id: &str, patch: CallPatch) -> IngestResult<CallRecord> {
        let conn = self.open().map_err(store_err)?;
        let ts = now_ms();
        let changed = match patch {
            // COALESCE keeps the stored duration when the caller declared none.
            CallPatch::Audio(a) => conn
                .execute(
                    r#"
                    UPDATE calls
                    SET audio_url = ?1,
                        audio_duration_seconds = COALESCE(?2, audio_duration_seconds),
                        updated_at_ms = ?3
                    WHERE id = ?4
                    "#,
                    params![
                        a.audio_url,
                        a.audio_duration_seconds.map(|d| d as i64),
                        ts,
                        call_id
                    ],
                )
                .map_err(store_err)?,
            // Full overwrite of the transcript domain, sentiment included.
            CallPatch::Transcript(t) => {
                let transcript_json =
                    serde_json::to_string(&t.transcript).map_err(store_err)?;
                let keywords_json = serde_json::to_string(&t.keywords).map_err(store_err)?;
                let analytics_json =
                    serde_json::to_string(&t.conversation_analytics).map_err(store_err)?;
                conn.execute(
                    r#"
                    UPDATE calls
                    SET transcript_json = ?1,
                        summary = ?2,
                        global_sentiment = ?3,
                        keywords_json = ?4,
                        analytics_json = ?5,
                        updated_at_ms = ?6
                    WHERE id = ?7
                    "#,
                    params![
                        transcript_json,
                        t.summary,
                        t.global_sentiment,
                        keywords_json,
                        analytics_json,
                        ts,
                        call_id
                    ],
                )
                .map_err(store_err)?
            }
        };
        if changed == 0 {
            return Err(IngestError::RecordNotFound(call_id.to_string()));
        }
        self.get_blocking(call_id)?
            .ok_or_else(|| IngestError::RecordNotFound(call_id.to_string()))
    }

    fn get_blocking(&self, call_id: &str) -> IngestResult<Option<CallRecord>> {
        let conn = self.open().map_err(store_err)?;
        let row = conn
            .query_row(
                r#"
                SELECT id, audio_url, audio_duration_seconds, transcript_json,
                       summary, global_sentiment, keywords_json, analytics_json
                FROM calls WHERE id = ?1
                "#,
                params![call_id],
                |r| {
                    Ok(RawRow {
                        id: r.get(0)?,
                        audio_url: r.get(1)?,
                        audio_duration_seconds: r.get(2)?,
                        transcript_json: r.get(3)?,
                        summary: r.get(4)?,
                        global_sentiment: r.get(5)?,
                        keywords_json: r.get(6)?,
                        analytics_json: r.get(7)?,
                    })
                },
            )
            .optional()
            .map_err(store_err)?;
        row.map(RawRow::into_record).transpose()
    }

    fn create_blocking(&self, call_id: &str) -> IngestResult<CallRecord> {
        let conn = self.open().map_err(store_err)?;
        let ts = now_ms();
        conn.execute(
            r#"
            INSERT INTO calls (id, keywords_json, analytics_json, created_at_ms, updated_at_ms)
            VALUES (?1, '[]', '{}', ?2, ?2)
            "#,
            params![call_id, ts],
        )
        .map_err(store_err)?;
        Ok(CallRecord::new(call_id))
    }
}

/// Column-level row before JSON columns are decoded.
struct RawRow {
    id: String,
    audio_url: Option<String>,
    audio_duration_seconds: Option<i64>,
    transcript_json: Option<String>,
    summary: Option<String>,
    global_sentiment: Option<String>,
    keywords_json: String,
    analytics_json: String,
}

impl RawRow {
    fn into_record(self) -> IngestResult<CallRecord> {
        let transcript: Option<Transcript> = self
            .transcript_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(store_err)?;
        let keywords: Vec<String> =
            serde_json::from_str(&self.keywords_json).map_err(store_err)?;
        let conversation_analytics: Map<String, Value> =
            serde_json::from_str(&self.analytics_json).map_err(store_err)?;
        Ok(CallRecord {
            id: self.id,
            audio_url: self.audio_url,
            audio_duration_seconds: self.audio_duration_seconds.map(|d| d as u32),
            transcript,
            summary: self.summary,
            global_sentiment: self.global_sentiment,
            keywords,
            conversation_analytics,
        })
    }
}

fn store_err(e: impl std::fmt::Display) -> IngestError {
    IngestError::StoreFailure(e.to_string())
}

#[async_trait]
impl CallRecordStore for SqliteCallStore {
    async fn update_partial(&self, call_id: &str, patch: CallPatch) -> IngestResult<CallRecord> {
        let store = self.clone();
        let call_id = call_id.to_string();
        tokio::task::spawn_blocking(move || store.update_partial_blocking(&call_id, patch))
            .await
            .map_err(store_err)?
    }

    async fn get(&self, call_id: &str) -> IngestResult<Option<CallRecord>> {
        let store = self.clone();
        let call_id = call_id.to_string();
        tokio::task::spawn_blocking(move || store.get_blocking(&call_id))
            .await
            .map_err(store_err)?
    }

    async fn create(&self, call_id: &str) -> IngestResult<CallRecord> {
        let store = self.clone();
        let call_id = call_id.to_string();
        tokio::task::spawn_blocking(move || store.create_blocking(&call_id))
            .await
            .map_err(store_err)?
    }
}

/// Degraded-mode store: every call answers `StorageDependencyMissing` so the
/// gateway can keep serving 503s instead of crashing at startup.
pub struct UnconfiguredCallStore;

#[async_trait]
impl CallRecordStore for UnconfiguredCallStore {
    async fn update_partial(&self, _call_id: &str, _patch: CallPatch) -> IngestResult<CallRecord> {
        Err(unconfigured())
    }

    async fn get(&self, _call_id: &str) -> IngestResult<Option<CallRecord>> {
        Err(unconfigured())
    }

    async fn create(&self, _call_id: &str) -> IngestResult<CallRecord> {
        Err(unconfigured())
    }
}

fn unconfigured() -> IngestError {
    IngestError::StorageDependencyMissing("call record store is not configured".to_string())
}
