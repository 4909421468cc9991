//! # Connection Pool
//!
//! Opens the SQLite store behind the catalog and order repositories.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig::new("bulkbuy.db")          DbConfig::in_memory()             │
//! │       │  Storage::File                     │  Storage::Memory           │
//! │       ▼                                    ▼                            │
//! │  WAL journal, create if missing      private database, 1 connection    │
//! │       └──────────────┬─────────────────────┘                            │
//! │                      ▼                                                  │
//! │        foreign_keys = ON, synchronous = NORMAL                          │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │        SqlitePool ──► migrations::apply ──► Database                    │
//! │                                               ├── products()            │
//! │                                               └── orders()              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Order creation writes several rows in one transaction while the catalog
//! keeps being read, so file databases run in WAL mode.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// A database file, created on first open.
    File(PathBuf),
    /// A private in-memory database that disappears with its pool.
    Memory,
}

/// Pool settings.
///
/// ```rust
/// use bulkbuy_db::DbConfig;
///
/// let config = DbConfig::new("bulkbuy.db").max_connections(8);
/// assert_eq!(config.max_connections, 8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub storage: Storage,

    /// Upper bound on pooled connections (default 5)
    pub max_connections: u32,

    /// How long to wait for a free connection (default 30s)
    pub acquire_timeout: Duration,
}

impl DbConfig {
    /// File-backed database at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            storage: Storage::File(path.into()),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// Fresh in-memory database, used by tests.
    ///
    /// Pinned to a single connection: every SQLite connection to `:memory:`
    /// would otherwise see its own empty database.
    pub fn in_memory() -> Self {
        DbConfig {
            storage: Storage::Memory,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    /// Ignored for in-memory databases.
    pub fn max_connections(mut self, max: u32) -> Self {
        if let Storage::File(_) = self.storage {
            self.max_connections = max;
        }
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.storage {
            Storage::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::Connection(e.to_string()))?,
            Storage::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal),
        };

        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true))
    }
}

impl Storage {
    fn describe(&self) -> String {
        match self {
            Storage::File(path) => path.display().to_string(),
            Storage::Memory => ":memory:".to_string(),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the store. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let location = config.storage.describe();
        info!(location = %location, "Opening database");

        let options = config.connect_options()?;
        debug!(max_connections = config.max_connections, "Connecting pool");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection(format!("{}: {}", location, e)))?;

        let report = migrations::apply(&pool).await?;
        info!(
            location = %location,
            schema_version = report.applied,
            "Database ready"
        );

        Ok(Database { pool })
    }

    /// Opens a file database at `path` with default settings.
    pub async fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Database::new(DbConfig::new(path.as_ref())).await
    }

    /// Raw pool, for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections, then closes the pool.
    pub async fn close(&self) {
        debug!("Closing database pool");
        self.pool.close().await;
    }

    /// `true` while the pool can still run a query.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}
