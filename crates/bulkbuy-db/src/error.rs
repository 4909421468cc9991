//! # Database Errors
//!
//! ```text
//! sqlx::Error ──────────────┐
//! MigrateError ─────────────┼──► DbError ──► ApiError (storefront)
//! ValidationError (input) ──┤
//! unparseable TEXT column ──┘
//! ```
//!
//! Constraint failures are classified with sqlx's [`ErrorKind`], so callers
//! can tell a duplicate tier from a dangling product reference without
//! reading SQLite's message text.

use std::fmt;

use bulkbuy_core::ValidationError;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Which schema constraint rejected a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    NotNull,
    Check,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::Unique => "UNIQUE",
            ConstraintKind::ForeignKey => "FOREIGN KEY",
            ConstraintKind::NotNull => "NOT NULL",
            ConstraintKind::Check => "CHECK",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    /// No row with that id (soft-deleted products count as missing).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Input rejected before any SQL ran.
    #[error("Invalid data: {0}")]
    Invalid(#[from] ValidationError),

    /// A schema constraint rejected the write; the transaction was rolled back.
    #[error("{kind} constraint failed: {message}")]
    Constraint { kind: ConstraintKind, message: String },

    /// A stored value no longer decodes into its domain type, e.g. a price
    /// column that isn't a decimal or a tier whose bounds are inverted.
    #[error("Corrupt {table} row {id}: {reason}")]
    CorruptRow {
        table: String,
        id: String,
        reason: String,
    },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("Timed out waiting for a database connection")]
    PoolTimedOut,

    #[error("Query failed: {0}")]
    Query(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn corrupt(table: impl Into<String>, id: impl Into<String>, reason: impl ToString) -> Self {
        DbError::CorruptRow {
            table: table.into(),
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    /// The violated constraint, if this is a constraint failure.
    pub fn constraint(&self) -> Option<ConstraintKind> {
        match self {
            DbError::Constraint { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let kind = match db_err.kind() {
                    ErrorKind::UniqueViolation => ConstraintKind::Unique,
                    ErrorKind::ForeignKeyViolation => ConstraintKind::ForeignKey,
                    ErrorKind::NotNullViolation => ConstraintKind::NotNull,
                    ErrorKind::CheckViolation => ConstraintKind::Check,
                    _ => return DbError::Query(db_err.message().to_string()),
                };
                DbError::Constraint {
                    kind,
                    message: db_err.message().to_string(),
                }
            }
            sqlx::Error::PoolTimedOut => DbError::PoolTimedOut,
            sqlx::Error::PoolClosed => DbError::Connection("pool is closed".to_string()),
            sqlx::Error::Io(e) => DbError::Connection(e.to_string()),
            other => DbError::Query(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
