//! # Store Error Types
//!
//! Error types for history persistence.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error / serde_json::Error / poisoned lock                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds context and categorization            │
//! │       │                                                                 │
//! │       ├──► HistoryStore::list()  → swallowed, empty history (warn!)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AppError { code: PersistenceFailure } (in app)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  User sees "Could not save bill history"                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// History store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Opening the backend failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created (permissions, missing directory)
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Stored history exists but can't be parsed.
    ///
    /// ## When This Occurs
    /// - Value was hand-edited or truncated
    /// - Value was written by an unrelated program under the same key
    #[error("Stored history is unreadable: {0}")]
    Corrupt(String),

    /// Stored history was written by a newer schema.
    #[error("Stored history has schema version {found}, this build reads up to {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Serializing the history for writing failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// An in-process lock was poisoned by a panicking writer.
    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),

    /// Internal backend error.
    #[error("Internal store error: {0}")]
    Internal(String),
}

/// Convert sqlx errors to StoreError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → StoreError::QueryFailed
/// sqlx::Error::PoolTimedOut   → StoreError::PoolExhausted
/// sqlx::Error::PoolClosed     → StoreError::ConnectionFailed
/// Other                       → StoreError::Internal
/// ```
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => StoreError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,
            sqlx::Error::PoolClosed => StoreError::ConnectionFailed("Pool is closed".to_string()),
            _ => StoreError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(err.to_string())
    }
}

/// Parse failures mean the stored bytes are bad; anything else is on our side.
impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            StoreError::Serialization(err.to_string())
        } else {
            StoreError::Corrupt(err.to_string())
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
