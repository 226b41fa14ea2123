#![forbid(unsafe_code)]

//! String key-value persistence used by the task store.
//!
//! Every call returns an explicit [`StorageError`] instead of panicking so the
//! caller can decide whether a failure matters. The task store treats all of
//! them as "keep going in memory".

pub mod file;
pub mod memory;

use std::path::PathBuf;

use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Slot holding the JSON-encoded task array.
pub const TASKS_KEY: &str = "tasks";
/// Slot holding `"true"` / `"false"`.
pub const DARK_MODE_KEY: &str = "darkMode";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("quota exceeded writing '{key}': {needed} bytes, limit {limit}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    #[error("invalid storage key '{key}': {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("storage io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait KeyValueStore {
    /// Confirms the backend accepts writes right now.
    fn probe(&mut self) -> Result<(), StorageError>;
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Human-readable location of the data, if it lives somewhere on disk.
    fn location(&self) -> Option<String> {
        None
    }
}

pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = |reason| StorageError::InvalidKey {
        key: key.to_owned(),
        reason,
    };
    if key.trim().is_empty() {
        return Err(invalid("must not be empty"));
    }
    if key.contains('/') || key.contains('\\') {
        return Err(invalid("must not contain path separators"));
    }
    if key.contains("..") {
        return Err(invalid("must not contain '..'"));
    }
    Ok(())
}

/// Checks a value against an optional byte limit.
pub(crate) fn check_quota(key: &str, value: &str, limit: Option<usize>) -> Result<(), StorageError> {
    match limit {
        Some(limit) if value.len() > limit => Err(StorageError::QuotaExceeded {
            key: key.to_owned(),
            needed: value.len(),
            limit,
        }),
        _ => Ok(()),
    }
}
