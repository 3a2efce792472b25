//! Blob Store boundary: durable audio objects addressed by key.
//!
//! The filesystem backend writes under a media root and returns a URL built
//! from the configured base prefix, the way the CRM's static file server
//! exposes uploaded media. Storage is append-only: ingestion never deletes
//! or reuses prior blobs for a call, it only repoints the record.

use async_trait::async_trait;
use reno_core::{IngestError, IngestResult, RenoConfig};
use std::path::{Component, Path, PathBuf};

/// Object storage addressed by key, returning a retrievable URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `content` under `key`. `public_read` marks the object as
    /// world-readable on backends that distinguish ACLs.
    async fn put(&self, key: &str, content: &[u8], public_read: bool) -> IngestResult<String>;
}

/// Open the configured filesystem blob store, or report the dependency as
/// missing when the operator disabled it.
pub fn open_blob_store(config: &RenoConfig) -> IngestResult<FsBlobStore> {
    let root = config.media_root.clone().ok_or_else(|| {
        IngestError::StorageDependencyMissing(
            "blob store disabled (RENO_MEDIA_ROOT is empty)".to_string(),
        )
    })?;
    Ok(FsBlobStore::new(root, config.media_base_url.clone()))
}

/// Filesystem-backed blob store rooted at a media directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    base_url: String,
}

impl FsBlobStore {
    pub fn new(root: PathBuf, base_url: String) -> Self {
        Self {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, content: &[u8], public_read: bool) -> IngestResult<String> {
        // Keys must stay inside the media root.
        let rel = Path::new(key);
        if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(IngestError::StorageUnavailable(format!(
                "invalid blob key: {key}"
            )));
        }
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| IngestError::StorageUnavailable(e.to_string()))?;
        }
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| IngestError::StorageUnavailable(e.to_string()))?;
        tracing::debug!(
            target: "reno::blob",
            key = %key,
            bytes = content.len(),
            public_read,
            "blob stored"
        );
        Ok(format!("{}/{}", self.base_url, key))
    }
}

/// Degraded-mode blob store: every call answers `StorageDependencyMissing`.
pub struct UnconfiguredBlobStore;

#[async_trait]
impl BlobStore for UnconfiguredBlobStore {
    async fn put(&self, _key: &str, _content: &[u8], _public_read: bool) -> IngestResult<String> {
        Err(IngestError::StorageDependencyMissing(
            "blob store is not configured".to_string(),
        ))
    }
}
