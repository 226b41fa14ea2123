#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use crate::storage::{KeyValueStore, StorageError, check_quota, validate_key};

const PROBE_KEY: &str = ".probe";

/// Directory-backed store: one file per key, replaced atomically on write.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota_bytes: Option<usize>,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            quota_bytes: None,
        }
    }

    #[must_use]
    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }

    fn write_atomic(&self, path: &Path, value: &str) -> Result<(), StorageError> {
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, value.as_bytes()).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, path).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl KeyValueStore for FileStore {
    fn probe(&mut self) -> Result<(), StorageError> {
        self.ensure_dir()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let path = self.dir.join(PROBE_KEY);
        std::fs::write(&path, PROBE_KEY)
            .and_then(|()| std::fs::remove_file(&path))
            .map_err(|e| {
                StorageError::Unavailable(format!("{} is not writable: {e}", self.dir.display()))
            })
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.key_path(key)?;
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.key_path(key)?;
        check_quota(key, value, self.quota_bytes)?;
        self.ensure_dir()?;
        self.write_atomic(&path, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.key_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn location(&self) -> Option<String> {
        Some(self.dir.to_string_lossy().into_owned())
    }
}
