//! Pipeline configuration loaded from `.env` / environment.
//!
//! Storage paths can be explicitly disabled (set the variable to an empty
//! string) so the gateway can run in a degraded mode that answers 503 for
//! ingestion instead of failing slowly against a half-configured backend.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_media_base_url() -> String {
    "/media".to_string()
}

/// Configuration loaded from environment.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | RENO_DB_PATH | ./data/reno/calls.sqlite | Call-record SQLite path. Empty string = store disabled (503). |
/// | RENO_MEDIA_ROOT | ./data/reno/media | Blob-store root directory. Empty string = blobs disabled (503). |
/// | RENO_MEDIA_BASE_URL | /media | URL prefix for stored blob keys. |
/// | RENO_BIND | 127.0.0.1 | Gateway bind address. |
/// | RENO_PORT | 8080 | Gateway HTTP port. |
/// | RENO_IO_TIMEOUT_SECS | 30 | Bound on each outbound blob/store call. |
/// | RENO_MAX_UPLOAD_BYTES | 52428800 | Request body cap for audio uploads (50 MiB). |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenoConfig {
    /// `None` means the operator disabled the record store on purpose.
    pub db_path: Option<PathBuf>,
    /// `None` means the blob store is disabled.
    pub media_root: Option<PathBuf>,
    #[serde(default = "default_media_base_url")]
    pub media_base_url: String,
    pub bind: String,
    pub port: u16,
    pub io_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl Default for RenoConfig {
    fn default() -> Self {
        Self {
            db_path: Some(PathBuf::from("./data/reno/calls.sqlite")),
            media_root: Some(PathBuf::from("./data/reno/media")),
            media_base_url: default_media_base_url(),
            bind: "127.0.0.1".to_string(),
            port: 8080,
            io_timeout_secs: 30,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl RenoConfig {
    /// Load from environment. Unset or unparseable => defaults (see table).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: env_opt_path("RENO_DB_PATH", defaults.db_path),
            media_root: env_opt_path("RENO_MEDIA_ROOT", defaults.media_root),
            media_base_url: env_string("RENO_MEDIA_BASE_URL", defaults.media_base_url),
            bind: env_string("RENO_BIND", defaults.bind),
            port: env_parse("RENO_PORT", defaults.port),
            io_timeout_secs: env_parse("RENO_IO_TIMEOUT_SECS", defaults.io_timeout_secs),
            max_upload_bytes: env_parse("RENO_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
        }
    }
}

fn env_string(name: &str, default: String) -> String {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default,
    }
}

/// Unset => default path. Set but empty => `None` (dependency disabled).
fn env_opt_path(name: &str, default: Option<PathBuf>) -> Option<PathBuf> {
    match std::env::var(name) {
        Ok(v) if v.trim().is_empty() => None,
        Ok(v) => Some(PathBuf::from(v)),
        Err(_) => default,
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
