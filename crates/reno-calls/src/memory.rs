//! In-process store backends for tests and mock mode.
//!
//! `MemoryCallStore` reuses `CallRecord::apply` so its merge-patch semantics
//! match the SQLite backend exactly. Both keep write counters so tests can
//! verify that validation failures perform no writes at all.

use async_trait::async_trait;
use reno_core::{CallPatch, CallRecord, IngestError, IngestResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::blob::BlobStore;
use crate::store::CallRecordStore;

/// HashMap-backed call record store.
#[derive(Default)]
pub struct MemoryCallStore {
    records: Mutex<HashMap<String, CallRecord>>,
    writes: AtomicUsize,
}

impl MemoryCallStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record the way the CRM would before ingestion runs.
    pub fn with_record(call_id: &str) -> Self {
        let store = Self::new();
        store
            .records
            .lock()
            .unwrap()
            .insert(call_id.to_string(), CallRecord::new(call_id));
        store
    }

    /// Number of update/create writes applied. Creation via `with_record`
    /// does not count.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CallRecordStore for MemoryCallStore {
    async fn update_partial(&self, call_id: &str, patch: CallPatch) -> IngestResult<CallRecord> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(call_id)
            .ok_or_else(|| IngestError::RecordNotFound(call_id.to_string()))?;
        record.apply(patch);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(record.clone())
    }

    async fn get(&self, call_id: &str) -> IngestResult<Option<CallRecord>> {
        Ok(self.records.lock().unwrap().get(call_id).cloned())
    }

    async fn create(&self, call_id: &str) -> IngestResult<CallRecord> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(call_id) {
            return Err(IngestError::StoreFailure(format!(
                "call record already exists: {call_id}"
            )));
        }
        let record = CallRecord::new(call_id);
        records.insert(call_id.to_string(), record.clone());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(record)
    }
}

/// Vec-backed blob store. Every put appends (append-only, like production).
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, content: &[u8], _public_read: bool) -> IngestResult<String> {
        self.objects
            .lock()
            .unwrap()
            .push((key.to_string(), content.to_vec()));
        Ok(format!("memory://{key}"))
    }
}

/// Blob store that always fails, for exercising the storage-error path.
pub struct FailingBlobStore;

#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn put(&self, _key: &str, _content: &[u8], _public_read: bool) -> IngestResult<String> {
        Err(IngestError::StorageUnavailable(
            "simulated blob outage".to_string(),
        ))
    }
}
