//! # billgen-store: History Store for the Bill Generator
//!
//! This crate persists finalized bills. The history is one JSON document
//! under a fixed key in a swappable key-value backend.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bill History Data Flow                           │
//! │                                                                         │
//! │  BillController::generate_bill / history commands                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   billgen-store (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │ HistoryStore  │    │ KeyValueBackend│    │  Migrations  │  │   │
//! │  │   │ (history.rs)  │───►│ (backend/)     │    │  (embedded)  │  │   │
//! │  │   │               │    │                │    │              │  │   │
//! │  │   │ append        │    │ MemoryBackend  │    │ 0001_kv.sql  │  │   │
//! │  │   │ list / load   │    │ SqliteBackend  │    │              │  │   │
//! │  │   │ delete / clear│    │                │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   kv_store["bill_generator_history"] = {"version":1,"bills":[…]}│   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`backend`] - Key-value backends (in-memory, SQLite)
//! - [`history`] - The History Store
//! - [`migrations`] - Embedded SQLite migrations
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use billgen_store::{HistoryStore, SqliteBackend, SqliteConfig};
//!
//! let backend = SqliteBackend::new(SqliteConfig::new("billgen.db")).await?;
//! let history = HistoryStore::new(backend);
//!
//! history.append(bill).await?;
//! let bills = history.list().await; // newest first
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod error;
pub mod history;
pub mod migrations;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::memory::MemoryBackend;
pub use backend::sqlite::{SqliteBackend, SqliteConfig};
pub use backend::KeyValueBackend;
pub use error::{StoreError, StoreResult};
pub use history::{HistoryStore, HISTORY_KEY, SCHEMA_VERSION};
