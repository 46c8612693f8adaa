//! Key-value persistence: the only path between the in-memory collections
//! and durable state.
//!
//! Each collection (and each settings string) is one JSON document under a
//! fixed key. Writes replace the whole document, so the last write for a key
//! wins.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::{StoreConfig, document_path};

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store key {0:?}")]
    InvalidKey(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document {key:?} is not valid JSON: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode document {key:?}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Narrow load/save interface over durable storage.
pub trait KeyValueStore: Send + Sync {
    /// Read the document stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the document stored under `key`.
    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError>;
}

/// Keys become file names, so only `[A-Za-z0-9_-]` is accepted.
fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(StoreError::InvalidKey(key.to_owned()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// Store that keeps one `<key>.json` file per key in a directory.
///
/// Saves go through a temporary file and an atomic rename, so a crash never
/// leaves a half-written document behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn open(config: &StoreConfig) -> Self {
        Self::new(config.data_dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        validate_key(key)?;
        let path = document_path(&self.dir, key);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let value = serde_json::from_str(&content).map_err(|source| StoreError::Decode {
            key: key.to_owned(),
            source,
        })?;
        Ok(Some(value))
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        validate_key(key)?;
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = document_path(&self.dir, key);
        let tmp_path = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Encode {
            key: key.to_owned(),
            source,
        })?;

        let io_err = |source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        };
        let mut file = fs::File::create(&tmp_path).map_err(io_err)?;
        file.write_all(&body).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);

        fs::rename(&tmp_path, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(key, path = %path.display(), bytes = body.len(), "document saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Memory store
// ---------------------------------------------------------------------------

/// Volatile store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently holding a document, sorted.
    pub fn keys(&self) -> Vec<String> {
        let docs = self.docs.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = docs.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        validate_key(key)?;
        let docs = self.docs.lock().unwrap_or_else(|e| e.into_inner());
        Ok(docs.get(key).cloned())
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut docs = self.docs.lock().unwrap_or_else(|e| e.into_inner());
        docs.insert(key.to_owned(), value.clone());
        Ok(())
    }
}
