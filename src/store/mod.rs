//! Relational storage for the shift roster.
//!
//! [`RosterStore`] wraps an SQLite connection pool. The schema lives in
//! `migrations/` and carries every uniqueness constraint the engine relies
//! on, so duplicate allocations, duplicate shift versions and duplicate
//! holidays are rejected by the database itself.

mod allocations;
mod directory;
mod holidays;
mod shifts;

use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::{RosterError, RosterResult};

pub use directory::{NewEmployee, NewLead};

/// Handle to the roster database.
///
/// Cloning is cheap; clones share the same pool.
#[derive(Debug, Clone)]
pub struct RosterStore {
    pool: SqlitePool,
}

impl RosterStore {
    /// Wraps an existing pool without running migrations.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects using the database configuration and applies migrations.
    pub async fn connect(config: &DatabaseConfig) -> RosterResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        let store = Self::new(pool);
        store.migrate().await?;
        debug!(url = %config.url, "Roster store connected");
        Ok(store)
    }

    /// Opens a private in-memory database with the schema applied.
    ///
    /// The pool holds exactly one connection that never expires, since an
    /// in-memory SQLite database lives only as long as its connection.
    pub async fn in_memory() -> RosterResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Applies pending migrations.
    pub async fn migrate(&self) -> RosterResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Runs a trivial query to confirm the database answers.
    pub async fn health_check(&self) -> RosterResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Parses a decimal column stored as text.
fn parse_decimal(value: &str, column: &str) -> RosterResult<Decimal> {
    Decimal::from_str(value).map_err(|e| RosterError::Storage {
        message: format!("invalid decimal in column '{}': {} ({})", column, value, e),
    })
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store_is_migrated() {
        let store = RosterStore::in_memory().await.unwrap();
        store.health_check().await.unwrap();

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
             ('employee', 'project', 'project_shift_master', 'project_holiday', 'shift_allocation')",
        )
        .fetch_one(store.pool())
        .await
        .unwrap();
        assert_eq!(tables, 5);
    }

    #[test]
    fn test_parse_decimal_reports_column() {
        let err = parse_decimal("abc", "weekday_allowance").unwrap_err();
        assert!(err.to_string().contains("weekday_allowance"));
        assert_eq!(parse_decimal("80.50", "x").unwrap(), Decimal::new(8050, 2));
    }
}
