//! # Schema Migrations
//!
//! SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied when a [`Database`](crate::Database) opens.
//!
//! ```text
//! migrations/sqlite/
//! └── 001_initial_schema.sql   products, pricing_tiers, orders, order_items
//! ```
//!
//! New schema changes go in a new `NNN_description.sql` file. Applied files
//! are checksummed by sqlx, so editing one breaks every existing database.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// How far a database's schema is from the embedded migrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    /// Migrations compiled into this build
    pub available: usize,
    /// Migrations recorded as applied in the database
    pub applied: usize,
}

impl MigrationReport {
    pub fn pending(&self) -> usize {
        self.available.saturating_sub(self.applied)
    }
}

/// Applies pending migrations and reports the resulting state.
pub async fn apply(pool: &SqlitePool) -> DbResult<MigrationReport> {
    let before = status(pool).await?;
    if before.pending() > 0 {
        info!(pending = before.pending(), "Applying schema migrations");
    }

    MIGRATOR.run(pool).await?;

    let after = status(pool).await?;
    debug!(applied = after.applied, "Schema up to date");
    Ok(after)
}

/// Reads migration state without changing anything.
pub async fn status(pool: &SqlitePool) -> DbResult<MigrationReport> {
    let tracked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;

    let applied: i64 = if tracked == 0 {
        0
    } else {
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?
    };

    Ok(MigrationReport {
        available: MIGRATOR.iter().count(),
        applied: usize::try_from(applied).unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn bare_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_fresh_database_has_everything_pending() {
        let pool = bare_pool().await;

        let report = status(&pool).await.unwrap();
        assert_eq!(report.applied, 0);
        assert_eq!(report.pending(), report.available);
    }

    #[tokio::test]
    async fn test_apply_is_idempotent() {
        let pool = bare_pool().await;

        let first = apply(&pool).await.unwrap();
        let second = apply(&pool).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.pending(), 0);
    }
}
