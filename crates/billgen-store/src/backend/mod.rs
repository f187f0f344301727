//! # Key-Value Backends
//!
//! The History Store keeps one JSON document under one key. Anything that
//! can get, set and remove a string by key can host it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HistoryStore<B: KeyValueBackend>                                      │
//! │       │                                                                 │
//! │       ├──► MemoryBackend  (tests, throwaway sessions)                  │
//! │       └──► SqliteBackend  (kv_store table, survives restarts)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod memory;
pub mod sqlite;

use std::future::Future;

use crate::error::StoreResult;

/// A string-keyed, string-valued durable store.
///
/// Implementations must make `set` atomic per key: a reader sees either the
/// old value or the new one, never a mix.
pub trait KeyValueBackend: Send + Sync {
    /// Reads the value under `key`, `None` if absent.
    fn get(&self, key: &str) -> impl Future<Output = StoreResult<Option<String>>> + Send;

    /// Writes `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = StoreResult<()>> + Send;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = StoreResult<()>> + Send;
}
