#![forbid(unsafe_code)]

use std::collections::HashMap;

use crate::storage::{KeyValueStore, StorageError, check_quota, validate_key};

/// In-process store. Also used to simulate a disabled or full backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    available: bool,
    reads_fail: bool,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            available: true,
            reads_fail: false,
            quota_bytes: None,
        }
    }

    /// Every call fails with [`StorageError::Unavailable`].
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::new()
        }
    }

    /// Seeds a slot without going through quota checks.
    #[must_use]
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_owned(), value.to_owned());
        self
    }

    /// `get` fails while `probe`, `set` and `remove` keep working, like an
    /// unreadable file in a writable directory.
    #[must_use]
    pub fn with_failing_reads(mut self) -> Self {
        self.reads_fail = true;
        self
    }

    /// Raw slot contents, bypassing availability checks.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.available {
            Ok(())
        } else {
            Err(StorageError::Unavailable("memory store disabled".to_owned()))
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn probe(&mut self) -> Result<(), StorageError> {
        self.check_available()
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        validate_key(key)?;
        if self.reads_fail {
            return Err(StorageError::Unavailable(format!("cannot read '{key}'")));
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;
        validate_key(key)?;
        check_quota(key, value, self.quota_bytes)?;
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        validate_key(key)?;
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_store_fails_every_call() {
        let mut store = MemoryStore::unavailable();
        assert!(store.probe().is_err());
        assert!(store.get("tasks").is_err());
        assert!(store.set("tasks", "[]").is_err());
        assert!(store.remove("tasks").is_err());

        store.set_available(true);
        store.set("tasks", "[]").unwrap();
        assert_eq!(store.get("tasks").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn failing_reads_still_accept_writes() {
        let mut store = MemoryStore::new()
            .with_entry("tasks", "[]")
            .with_failing_reads();
        assert!(store.probe().is_ok());
        assert!(store.get("tasks").is_err());
        store.set("darkMode", "true").unwrap();
        assert_eq!(store.peek("darkMode"), Some("true"));
    }

    #[test]
    fn seeded_entries_are_readable() {
        let store = MemoryStore::new().with_entry("darkMode", "true");
        assert_eq!(store.get("darkMode").unwrap().as_deref(), Some("true"));
    }
}
