//! In-process backend. Nothing survives the process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::KeyValueBackend;
use crate::error::{StoreError, StoreResult};

/// A `HashMap` behind a mutex.
///
/// Clones share the same map, so a test can keep a handle and inspect what
/// the History Store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-loaded with one entry.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let backend = Self::new();
        if let Ok(mut entries) = backend.entries.lock() {
            entries.insert(key.into(), value.into());
        }
        backend
    }

    /// Returns the raw value under `key`.
    pub fn raw(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::LockPoisoned("memory backend"))?;
        Ok(entries.get(key).cloned())
    }
}

impl KeyValueBackend for MemoryBackend {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.raw(key)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::LockPoisoned("memory backend"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::LockPoisoned("memory backend"))?;
        entries.remove(key);
        Ok(())
    }
}
