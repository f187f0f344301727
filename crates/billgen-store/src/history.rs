//! # History Store
//!
//! The durable, ordered list of finalized bills, newest first.
//!
//! ## Read/Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        History Operations                               │
//! │                                                                         │
//! │  list()   ─► backend.get ─► parse ─► decode each ─► Vec<Bill>          │
//! │                  │             │           │                            │
//! │                  │             │           └── bad entry ──► warn! skip │
//! │                  └── any error ┴──► warn! + []   (fail-open)            │
//! │                                                                         │
//! │  load()   ─► same, but backend / document errors are returned          │
//! │                                                                         │
//! │  append / delete_by_id / clear                                         │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  write_lock ─► read raw entries ─► modify ─► backend.set (one write)   │
//! │                    │                                                    │
//! │                    ├── I/O error          ──► abort, store unchanged   │
//! │                    ├── not a document     ──► warn!, start from []     │
//! │                    ├── newer version      ──► abort, store unchanged   │
//! │                    └── undecodable entry  ──► written back as it was   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stored Document
//! ```json
//! {"version": 1, "bills": [{"id": "…", "billNumber": "BILL-…", …}]}
//! ```
//! A bare JSON array of bills is also read, for histories written before
//! the version tag existed.

use billgen_core::Bill;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backend::KeyValueBackend;
use crate::error::{StoreError, StoreResult};

/// Key the history document is stored under.
pub const HISTORY_KEY: &str = "bill_generator_history";

/// Version written by this build. Documents with a higher version are refused.
pub const SCHEMA_VERSION: u32 = 1;

// =============================================================================
// Document Format
// =============================================================================

#[derive(Serialize)]
struct HistoryDocument<'a> {
    version: u32,
    bills: &'a [Value],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredHistory {
    Legacy(Vec<Value>),
    Versioned { version: u32, bills: Value },
}

/// Splits a stored document into raw entries, newest first.
///
/// Fails only when the text is not a history document at all, or comes
/// from a newer schema. Entries are not checked here.
fn parse_entries(raw: &str) -> StoreResult<Vec<Value>> {
    match serde_json::from_str::<StoredHistory>(raw)? {
        StoredHistory::Legacy(entries) => Ok(entries),
        StoredHistory::Versioned { version, .. } if version > SCHEMA_VERSION => {
            Err(StoreError::UnsupportedVersion {
                found: version,
                supported: SCHEMA_VERSION,
            })
        }
        StoredHistory::Versioned { bills, .. } => Ok(serde_json::from_value(bills)?),
    }
}

/// Decodes every entry that fits [`Bill`], skipping the rest.
fn decode_entries(entries: Vec<Value>) -> Vec<Bill> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Bill>(entry) {
            Ok(bill) => Some(bill),
            Err(e) => {
                warn!(index, error = %e, "Skipping unreadable bill entry");
                None
            }
        })
        .collect()
}

fn entry_id(entry: &Value) -> Option<&str> {
    entry.get("id").and_then(Value::as_str)
}

/// JSON has no NaN or infinity; serde_json would write `null` and the entry
/// would never decode again.
fn encode_bill(bill: &Bill) -> StoreResult<Value> {
    if !bill.has_finite_amounts() {
        return Err(StoreError::Serialization(format!(
            "bill {} has a non-finite amount",
            bill.id
        )));
    }
    serde_json::to_value(bill).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn encode(entries: &[Value]) -> StoreResult<String> {
    serde_json::to_string(&HistoryDocument {
        version: SCHEMA_VERSION,
        bills: entries,
    })
    .map_err(|e| StoreError::Serialization(e.to_string()))
}

// =============================================================================
// History Store
// =============================================================================

/// Bill history over a key-value backend.
///
/// ## Usage
/// ```rust,ignore
/// let history = HistoryStore::new(MemoryBackend::new());
/// history.append(bill).await?;
/// assert_eq!(history.list().await[0].id, bill_id);
/// ```
///
/// Mutations work on raw entries, so an entry this build can't decode is
/// written back untouched rather than dropped.
#[derive(Debug)]
pub struct HistoryStore<B> {
    backend: B,
    write_lock: Mutex<()>,
}

impl<B: KeyValueBackend> HistoryStore<B> {
    /// Creates a store under [`HISTORY_KEY`].
    pub fn new(backend: B) -> Self {
        HistoryStore {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Reads the full history, surfacing backend, document and version
    /// failures. Individual entries that don't decode are skipped.
    ///
    /// An absent key is an empty history, not an error.
    pub async fn load(&self) -> StoreResult<Vec<Bill>> {
        Ok(decode_entries(self.read_entries().await?))
    }

    /// Reads the full history, newest first.
    ///
    /// Never fails: an unreachable backend or unreadable document yields an
    /// empty list and a warning.
    pub async fn list(&self) -> Vec<Bill> {
        match self.load().await {
            Ok(bills) => bills,
            Err(e) => {
                warn!(error = %e, key = HISTORY_KEY, "Bill history unavailable, showing empty history");
                Vec::new()
            }
        }
    }

    /// Finds one bill by id. Fails like [`load`](Self::load) when the
    /// history can't be read.
    pub async fn get(&self, id: &str) -> StoreResult<Option<Bill>> {
        Ok(self.load().await?.into_iter().find(|b| b.id == id))
    }

    /// Bills whose number or shop name contains `term`, ignoring case.
    pub async fn search(&self, term: &str) -> Vec<Bill> {
        self.list()
            .await
            .into_iter()
            .filter(|b| b.matches_search(term))
            .collect()
    }

    /// Number of stored bills.
    pub async fn len(&self) -> usize {
        self.list().await.len()
    }

    /// True when no bills are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Prepends `bill`.
    ///
    /// On error the stored history is unchanged.
    pub async fn append(&self, bill: Bill) -> StoreResult<()> {
        let entry = encode_bill(&bill)?;
        let _guard = self.write_lock.lock().await;

        let mut entries = self.read_for_update().await?;
        entries.insert(0, entry);
        self.write(&entries).await?;

        info!(bill_id = %bill.id, count = entries.len(), "Bill saved to history");
        Ok(())
    }

    /// Removes every bill with `id`. Returns whether anything was removed.
    ///
    /// Deleting an absent id leaves the stored document untouched.
    pub async fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.read_for_update().await?;
        let before = entries.len();
        entries.retain(|e| entry_id(e) != Some(id));

        if entries.len() == before {
            debug!(bill_id = %id, "No bill to delete");
            return Ok(false);
        }

        self.write(&entries).await?;
        info!(bill_id = %id, count = entries.len(), "Bill deleted from history");
        Ok(true)
    }

    /// Removes every bill.
    pub async fn clear(&self) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;

        self.backend.remove(HISTORY_KEY).await?;
        info!("Bill history cleared");
        Ok(())
    }

    async fn read_entries(&self) -> StoreResult<Vec<Value>> {
        match self.backend.get(HISTORY_KEY).await? {
            Some(raw) => parse_entries(&raw),
            None => Ok(Vec::new()),
        }
    }

    async fn read_for_update(&self) -> StoreResult<Vec<Value>> {
        match self.read_entries().await {
            Ok(entries) => Ok(entries),
            Err(StoreError::Corrupt(reason)) => {
                warn!(%reason, key = HISTORY_KEY, "Stored bill history is corrupt, starting over");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn write(&self, entries: &[Value]) -> StoreResult<()> {
        let raw = encode(entries)?;
        self.backend.set(HISTORY_KEY, &raw).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::backend::sqlite::{SqliteBackend, SqliteConfig};
    use billgen_core::identity::BillIdentity;
    use billgen_core::{ProductInput, ShopDetails};
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn bill(id: &str, shop: &str, second: u32) -> Bill {
        let identity = BillIdentity {
            id: id.to_string(),
            bill_number: format!("BILL-20240115-1430{:02}", second),
            date: Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, second).unwrap(),
        };
        let products = vec![ProductInput::new("Pen", 10.0, 5.0, 2).into_product(format!("{id}-p"))];
        Bill::assemble(identity, ShopDetails::new(shop, "City"), products)
    }

    fn ids(bills: &[Bill]) -> Vec<&str> {
        bills.iter().map(|b| b.id.as_str()).collect()
    }

    /// Backend whose writes can be switched off.
    #[derive(Clone, Default)]
    struct FlakyBackend {
        inner: MemoryBackend,
        fail_writes: Arc<AtomicBool>,
        fail_reads: Arc<AtomicBool>,
    }

    impl KeyValueBackend for FlakyBackend {
        async fn get(&self, key: &str) -> StoreResult<Option<String>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StoreError::ConnectionFailed("disk unplugged".to_string()));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::QueryFailed("disk full".to_string()));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> StoreResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::QueryFailed("disk full".to_string()));
            }
            self.inner.remove(key).await
        }
    }

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let history = HistoryStore::new(MemoryBackend::new());
        assert!(history.list().await.is_empty());
        assert!(history.load().await.unwrap().is_empty());
        assert!(history.is_empty().await);
    }

    #[tokio::test]
    async fn test_append_prepends() {
        let history = HistoryStore::new(MemoryBackend::new());

        history.append(bill("a", "Shop A", 1)).await.unwrap();
        history.append(bill("b", "Shop B", 2)).await.unwrap();
        history.append(bill("c", "Shop C", 3)).await.unwrap();

        assert_eq!(ids(&history.list().await), vec!["c", "b", "a"]);
        assert_eq!(history.len().await, 3);
    }

    #[tokio::test]
    async fn test_append_then_list_returns_identical_bill() {
        let history = HistoryStore::new(MemoryBackend::new());
        let original = bill("a", "Shop A", 1);

        history.append(original.clone()).await.unwrap();

        assert_eq!(history.list().await[0], original);
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let history = HistoryStore::new(MemoryBackend::new());
        history.append(bill("a", "Shop A", 1)).await.unwrap();
        history.append(bill("b", "Shop B", 2)).await.unwrap();

        assert!(history.delete_by_id("a").await.unwrap());
        assert_eq!(ids(&history.list().await), vec!["b"]);

        assert!(!history.delete_by_id("missing").await.unwrap());
        assert_eq!(ids(&history.list().await), vec!["b"]);
    }

    #[tokio::test]
    async fn test_delete_absent_id_keeps_all_three() {
        let backend = MemoryBackend::new();
        let history = HistoryStore::new(backend.clone());
        history.append(bill("a", "Shop A", 1)).await.unwrap();
        history.append(bill("b", "Shop B", 2)).await.unwrap();
        history.append(bill("c", "Shop C", 3)).await.unwrap();
        let before = backend.raw(HISTORY_KEY).unwrap();

        assert!(!history.delete_by_id("unknown").await.unwrap());

        assert_eq!(ids(&history.list().await), vec!["c", "b", "a"]);
        assert_eq!(backend.raw(HISTORY_KEY).unwrap(), before);
    }

    #[tokio::test]
    async fn test_delete_removes_every_entry_with_id() {
        let history = HistoryStore::new(MemoryBackend::new());
        history.append(bill("dup", "Shop A", 1)).await.unwrap();
        history.append(bill("keep", "Shop B", 2)).await.unwrap();
        history.append(bill("dup", "Shop A", 1)).await.unwrap();

        assert!(history.delete_by_id("dup").await.unwrap());
        assert_eq!(ids(&history.list().await), vec!["keep"]);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let backend = MemoryBackend::new();
        let history = HistoryStore::new(backend.clone());
        history.append(bill("a", "Shop A", 1)).await.unwrap();

        history.clear().await.unwrap();
        history.clear().await.unwrap();

        assert!(history.list().await.is_empty());
        assert_eq!(backend.raw(HISTORY_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_and_search() {
        let history = HistoryStore::new(MemoryBackend::new());
        history.append(bill("a", "Corner Store", 1)).await.unwrap();
        history.append(bill("b", "Book Shop", 2)).await.unwrap();

        assert_eq!(history.get("a").await.unwrap().unwrap().shop_details.name, "Corner Store");
        assert!(history.get("zzz").await.unwrap().is_none());

        assert_eq!(ids(&history.search("book").await), vec!["b"]);
        assert_eq!(ids(&history.search("1430").await), vec!["b", "a"]);
        assert_eq!(history.search("").await.len(), 2);
        assert!(history.search("pharmacy").await.is_empty());
    }

    #[tokio::test]
    async fn test_writes_versioned_document() {
        let backend = MemoryBackend::new();
        let history = HistoryStore::new(backend.clone());
        history.append(bill("a", "Shop A", 1)).await.unwrap();

        let raw = backend.raw(HISTORY_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(json["version"], 1);
        assert_eq!(json["bills"][0]["id"], "a");
        assert_eq!(json["bills"][0]["billNumber"], "BILL-20240115-143001");
    }

    #[tokio::test]
    async fn test_reads_legacy_array() {
        let legacy = serde_json::to_string(&vec![bill("a", "Shop A", 1)]).unwrap();
        let history = HistoryStore::new(MemoryBackend::with_entry(HISTORY_KEY, legacy));

        assert_eq!(ids(&history.list().await), vec!["a"]);

        history.append(bill("b", "Shop B", 2)).await.unwrap();
        assert_eq!(ids(&history.load().await.unwrap()), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_corrupt_document_lists_empty() {
        let backend = MemoryBackend::with_entry(HISTORY_KEY, "{not json");
        let history = HistoryStore::new(backend);

        assert!(history.list().await.is_empty());
        assert!(matches!(history.load().await, Err(StoreError::Corrupt(_))));
        assert!(matches!(history.get("a").await, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_append_over_corrupt_document_starts_over() {
        let backend = MemoryBackend::with_entry(HISTORY_KEY, "{not json");
        let history = HistoryStore::new(backend);

        history.append(bill("a", "Shop A", 1)).await.unwrap();

        assert_eq!(ids(&history.load().await.unwrap()), vec!["a"]);
    }

    #[tokio::test]
    async fn test_undecodable_entry_does_not_hide_others() {
        let mut bad = serde_json::to_value(bill("bad", "Shop X", 9)).unwrap();
        bad["products"][0]["quantity"] = serde_json::json!(-1);
        let good = serde_json::to_value(bill("good", "Shop A", 1)).unwrap();
        let legacy = serde_json::to_string(&vec![bad, good]).unwrap();

        let backend = MemoryBackend::with_entry(HISTORY_KEY, legacy);
        let history = HistoryStore::new(backend.clone());

        assert_eq!(ids(&history.list().await), vec!["good"]);
        assert_eq!(ids(&history.load().await.unwrap()), vec!["good"]);

        history.append(bill("new", "Shop B", 2)).await.unwrap();
        assert_eq!(ids(&history.list().await), vec!["new", "good"]);

        let raw = backend.raw(HISTORY_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["bills"].as_array().unwrap().len(), 3);
        assert_eq!(json["bills"][1]["id"], "bad");
        assert_eq!(json["bills"][1]["products"][0]["quantity"], -1);

        assert!(history.delete_by_id("bad").await.unwrap());
        assert_eq!(ids(&history.list().await), vec!["new", "good"]);
    }

    #[tokio::test]
    async fn test_non_finite_bill_is_refused() {
        let backend = MemoryBackend::new();
        let history = HistoryStore::new(backend.clone());
        history.append(bill("a", "Shop A", 1)).await.unwrap();
        let before = backend.raw(HISTORY_KEY).unwrap();

        let mut overflowed = bill("b", "Shop B", 2);
        overflowed.total_amount = billgen_core::Amount::new(f64::INFINITY);

        assert!(matches!(
            history.append(overflowed).await,
            Err(StoreError::Serialization(_))
        ));
        assert_eq!(backend.raw(HISTORY_KEY).unwrap(), before);
        assert_eq!(ids(&history.load().await.unwrap()), vec!["a"]);
    }

    #[tokio::test]
    async fn test_newer_version_is_refused() {
        let raw = r#"{"version": 2, "bills": {"shape": "unknown"}}"#;
        let backend = MemoryBackend::with_entry(HISTORY_KEY, raw);
        let history = HistoryStore::new(backend.clone());

        assert!(matches!(
            history.load().await,
            Err(StoreError::UnsupportedVersion { found: 2, supported: 1 })
        ));
        assert!(history.list().await.is_empty());

        assert!(history.append(bill("a", "Shop A", 1)).await.is_err());
        assert_eq!(backend.raw(HISTORY_KEY).unwrap().as_deref(), Some(raw));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_history_unchanged() {
        let backend = FlakyBackend::default();
        let history = HistoryStore::new(backend.clone());
        history.append(bill("a", "Shop A", 1)).await.unwrap();

        backend.fail_writes.store(true, Ordering::SeqCst);
        assert!(history.append(bill("b", "Shop B", 2)).await.is_err());
        assert!(history.delete_by_id("a").await.is_err());
        assert!(history.clear().await.is_err());

        backend.fail_writes.store(false, Ordering::SeqCst);
        assert_eq!(ids(&history.list().await), vec!["a"]);
    }

    #[tokio::test]
    async fn test_unreadable_backend() {
        let backend = FlakyBackend::default();
        let history = HistoryStore::new(backend.clone());
        history.append(bill("a", "Shop A", 1)).await.unwrap();

        backend.fail_reads.store(true, Ordering::SeqCst);
        assert!(history.list().await.is_empty());
        assert!(history.load().await.is_err());
        assert!(history.append(bill("b", "Shop B", 2)).await.is_err());

        backend.fail_reads.store(false, Ordering::SeqCst);
        assert_eq!(ids(&history.list().await), vec!["a"]);
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let history = Arc::new(HistoryStore::new(MemoryBackend::new()));

        let mut handles = Vec::new();
        for i in 0..10u32 {
            let history = history.clone();
            handles.push(tokio::spawn(async move {
                history.append(bill(&format!("b{i}"), "Shop", i)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(history.len().await, 10);
    }

    #[tokio::test]
    async fn test_sqlite_backed_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");

        {
            let backend = SqliteBackend::new(SqliteConfig::new(&path)).await.unwrap();
            let history = HistoryStore::new(backend.clone());
            history.append(bill("a", "Shop A", 1)).await.unwrap();
            history.append(bill("b", "Shop B", 2)).await.unwrap();
            backend.close().await;
        }

        let backend = SqliteBackend::new(SqliteConfig::new(&path)).await.unwrap();
        let history = HistoryStore::new(backend);
        assert_eq!(
            history.load().await.unwrap(),
            vec![bill("b", "Shop B", 2), bill("a", "Shop A", 1)]
        );

        history.delete_by_id("b").await.unwrap();
        assert_eq!(ids(&history.list().await), vec!["a"]);
    }
}
