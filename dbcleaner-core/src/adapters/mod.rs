//! Database driver adapters for uniform table introspection and mutation.
//!
//! This module defines the object-safe trait every engine adapter
//! implements, so the cleaner stays engine-agnostic. Adapter selection is a
//! pure function of the declared driver name: unrecognized names are
//! rejected when the adapter is constructed, never at call time.

use crate::config::DatabaseConfig;
use crate::error::{DbCleanerError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub mod mysql;
pub mod postgres;

pub use mysql::MySqlAdapter;
pub use postgres::PostgresAdapter;

/// Supported database engines.
///
/// This is a closed set: engines the tool cannot clean (document stores,
/// unimplemented drivers) have no variant and fail driver resolution with a
/// configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// PostgreSQL, selected by `postgres` or `postgresql`.
    Postgres,
    /// MySQL, selected by `mysql`.
    MySql,
}

impl Driver {
    /// Canonical lowercase name of the engine.
    pub fn name(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
        }
    }

    /// Conventional port for the engine, used as a wizard default.
    pub fn default_port(self) -> u16 {
        match self {
            Self::Postgres => 5432,
            Self::MySql => 3306,
        }
    }
}

impl FromStr for Driver {
    type Err = DbCleanerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" => Ok(Self::MySql),
            other => Err(DbCleanerError::configuration(format!(
                "unsupported database driver: {other} (supported: postgres, mysql)"
            ))),
        }
    }
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Uniform capability contract for database engines.
///
/// Object-safe by design: the cleaner holds a `Box<dyn DatabaseAdapter>`
/// and dispatches every per-table operation through it.
///
/// Session lifecycle: an adapter is constructed disconnected, holds at most
/// one live session after [`connect`](DatabaseAdapter::connect), and every
/// other operation fails with a connection error while no session exists.
/// [`close`](DatabaseAdapter::close) is an idempotent no-op without one.
#[async_trait]
pub trait DatabaseAdapter: Send + Sync + std::fmt::Debug {
    /// The engine this adapter drives.
    fn driver(&self) -> Driver;

    /// The connection settings this adapter was constructed with.
    fn config(&self) -> &DatabaseConfig;

    /// Establishes the session, failing once `timeout` elapses.
    ///
    /// # Errors
    /// Returns a connection error if the host rejects credentials or the
    /// network is unreachable, or a timeout error once the deadline passes.
    async fn connect(&mut self, timeout: Duration) -> Result<()>;

    /// Releases the session. Safe to call repeatedly or without a prior
    /// successful connect.
    async fn close(&mut self);

    /// Lightweight liveness probe (`SELECT 1`).
    ///
    /// # Errors
    /// Returns a connection error if no session exists or the probe fails.
    async fn test_connection(&self) -> Result<()>;

    /// Lists all base tables visible in the session's default schema, in
    /// catalog-returned order (not guaranteed sorted). An empty list is a
    /// valid, non-error result.
    ///
    /// # Errors
    /// Returns a query error if introspection fails.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Removes all rows from the named table, resetting identity counters
    /// and cascading to dependent rows where the engine requires it.
    /// Irreversible.
    ///
    /// # Errors
    /// Returns a query error if the statement fails.
    async fn truncate_table(&self, table: &str) -> Result<()>;

    /// Removes the named table and its dependents. Idempotent with respect
    /// to already-absent tables. Irreversible.
    ///
    /// # Errors
    /// Returns a query error if the statement fails.
    async fn drop_table(&self, table: &str) -> Result<()>;

    /// Exact row count at the time of the call; no locking guarantee
    /// against concurrent writers.
    ///
    /// # Errors
    /// Returns a query error if the count fails.
    async fn table_row_count(&self, table: &str) -> Result<i64>;

    /// Reserved extension point for pre-clean backups.
    ///
    /// # Errors
    /// Both shipped adapters currently fail with a not-implemented error.
    async fn backup_database(&self, path: &Path) -> Result<()>;
}

/// Builds the adapter for the configured driver.
///
/// Driver resolution happens here, before any connection attempt: an
/// unrecognized or unimplemented driver name is a fatal configuration
/// error, not a deferred runtime failure.
///
/// # Errors
/// Returns a configuration error if the driver name is not a supported
/// engine.
pub fn create_adapter(config: DatabaseConfig) -> Result<Box<dyn DatabaseAdapter>> {
    match config.driver()? {
        Driver::Postgres => Ok(Box::new(PostgresAdapter::new(config))),
        Driver::MySql => Ok(Box::new(MySqlAdapter::new(config))),
    }
}
