//! # SQLite Backend
//!
//! Durable key-value storage in a single SQLite table.
//!
//! ## Table
//! ```text
//! ┌──────────────────────────────┬──────────────────────────┬──────────────┐
//! │ key (PK)                     │ value                    │ updated_at   │
//! ├──────────────────────────────┼──────────────────────────┼──────────────┤
//! │ bill_generator_history       │ {"version":1,"bills":[…]}│ RFC 3339     │
//! └──────────────────────────────┴──────────────────────────┴──────────────┘
//! ```
//!
//! Every `set` is one `INSERT … ON CONFLICT DO UPDATE` statement, so a
//! crash mid-write leaves the previous document intact.
//!
//! ## WAL Mode
//! File databases run in WAL mode with NORMAL synchronous, so a `history`
//! listing in one terminal never blocks a `generate` in another.

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use super::KeyValueBackend;
use crate::error::{StoreError, StoreResult};
use crate::migrations;

// =============================================================================
// Configuration
// =============================================================================

/// SQLite backend configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = SqliteConfig::new("/path/to/billgen.db").max_connections(2);
/// ```
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path to the database file. `None` means a private in-memory database.
    pub database_path: Option<PathBuf>,

    /// Maximum number of connections in the pool.
    /// Default: 4
    pub max_connections: u32,

    /// Connection timeout.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl SqliteConfig {
    /// Creates a configuration for a database file (created if missing).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SqliteConfig {
            database_path: Some(path.into()),
            max_connections: 4,
            connect_timeout: Duration::from_secs(30),
            run_migrations: true,
        }
    }

    /// Creates an in-memory configuration (for testing).
    ///
    /// An in-memory SQLite database lives inside one connection, so the
    /// pool is pinned to exactly one.
    pub fn in_memory() -> Self {
        SqliteConfig {
            database_path: None,
            max_connections: 1,
            connect_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    fn connect_options(&self) -> StoreResult<SqliteConnectOptions> {
        let options = match &self.database_path {
            Some(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
            None => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?,
        };
        Ok(options)
    }
}

// =============================================================================
// Backend
// =============================================================================

/// Key-value backend over a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Opens the pool and, unless disabled, applies pending migrations.
    ///
    /// ## Returns
    /// * `Ok(SqliteBackend)` - Ready to use
    /// * `Err(StoreError::ConnectionFailed)` - File can't be opened or created
    /// * `Err(StoreError::MigrationFailed)` - Schema couldn't be applied
    pub async fn new(config: SqliteConfig) -> StoreResult<Self> {
        match &config.database_path {
            Some(path) => info!(path = %path.display(), "Opening history database"),
            None => info!("Opening in-memory history database"),
        }

        let connect_options = config.connect_options()?;
        let in_memory = config.database_path.is_none();

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout);
        if in_memory {
            // Dropping the only connection drops the database with it.
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections = config.max_connections, "History pool created");

        let backend = SqliteBackend { pool };

        if config.run_migrations {
            migrations::run_migrations(&backend.pool).await?;
        }

        Ok(backend)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the pool. Later operations fail with `ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing history database");
        self.pool.close().await;
    }
}

impl KeyValueBackend for SqliteBackend {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(key, bytes = value.len(), "Stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_backend() {
        let backend = SqliteBackend::new(SqliteConfig::in_memory()).await.unwrap();
        assert!(sqlx::query("SELECT 1").execute(backend.pool()).await.is_ok());

        assert_eq!(backend.get("k").await.unwrap(), None);
        backend.set("k", "v1").await.unwrap();
        backend.set("k", "v2").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v2"));

        backend.remove("k").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_backend_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("billgen.db");

        let backend = SqliteBackend::new(SqliteConfig::new(&path)).await.unwrap();
        backend.set("k", "persisted").await.unwrap();
        backend.close().await;

        let reopened = SqliteBackend::new(SqliteConfig::new(&path)).await.unwrap();
        assert_eq!(reopened.get("k").await.unwrap().as_deref(), Some("persisted"));
    }

    #[tokio::test]
    async fn test_closed_pool_fails() {
        let backend = SqliteBackend::new(SqliteConfig::in_memory()).await.unwrap();
        backend.close().await;

        assert!(backend.get("k").await.is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = SqliteConfig::new("/tmp/billgen.db")
            .max_connections(8)
            .run_migrations(false);

        assert_eq!(config.max_connections, 8);
        assert!(!config.run_migrations);
        assert!(SqliteConfig::in_memory().database_path.is_none());
    }
}
