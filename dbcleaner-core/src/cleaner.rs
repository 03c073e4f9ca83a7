//! Cleaning orchestration.
//!
//! A [`Cleaner`] owns exactly one driver adapter and applies a uniform
//! policy across a caller-supplied set of tables: dry-run reporting,
//! optional pre-clean backup, then truncate-or-drop per table, strictly in
//! input order on a single session.

use crate::adapters::{DatabaseAdapter, create_adapter};
use crate::config::Config;
use crate::error::{DbCleanerError, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Per-invocation cleaning options, merged from CLI flags and the
/// `cleaner` config section before the batch starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanOptions {
    /// Report intended actions and row counts without mutating any table.
    pub dry_run: bool,
    /// Back up the database before cleaning.
    pub backup: bool,
    /// Truncate tables instead of dropping them.
    pub truncate: bool,
}

/// Orchestrates one driver adapter against a batch of tables.
///
/// Lifecycle: created per command invocation, connected once, used for
/// zero or more per-table operations, closed unconditionally on exit.
#[derive(Debug)]
pub struct Cleaner {
    adapter: Box<dyn DatabaseAdapter>,
}

impl Cleaner {
    /// Builds a cleaner for the configured driver.
    ///
    /// # Errors
    /// Returns a configuration error if the declared driver is not a
    /// supported engine. No connection is attempted here.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            adapter: create_adapter(config.database.clone())?,
        })
    }

    /// Builds a cleaner around an existing adapter.
    pub fn with_adapter(adapter: Box<dyn DatabaseAdapter>) -> Self {
        Self { adapter }
    }

    /// Establishes the database session, failing once `timeout` elapses.
    ///
    /// # Errors
    /// Returns a connection or timeout error; no further operations are
    /// attempted by callers after a failed connect.
    pub async fn connect(&mut self, timeout: Duration) -> Result<()> {
        self.adapter.connect(timeout).await
    }

    /// Releases the session. Idempotent; safe to call on error paths where
    /// `connect` never succeeded.
    pub async fn close(&mut self) {
        self.adapter.close().await;
    }

    /// Probes session liveness.
    ///
    /// # Errors
    /// Returns a connection error if the probe fails.
    pub async fn test_connection(&self) -> Result<()> {
        self.adapter.test_connection().await
    }

    /// Lists the base tables visible to the session.
    ///
    /// # Errors
    /// Returns a query error if introspection fails.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.adapter.list_tables().await
    }

    /// Cleans the given tables, strictly in input order.
    ///
    /// Empty input is a no-op success with zero adapter calls. Count
    /// failures during dry-run are informational; every other failure
    /// aborts the batch immediately, leaving earlier tables processed
    /// (operations commit per table, there is no cross-table transaction).
    ///
    /// # Errors
    /// Returns a configuration error for a table name outside the catalog,
    /// a not-implemented error when a backup is requested, or the first
    /// query error from a destructive operation.
    pub async fn clean_tables(&self, tables: &[String], opts: &CleanOptions) -> Result<()> {
        if tables.is_empty() {
            return Ok(());
        }

        // Requested names must come from the catalog; anything else never
        // reaches a DDL statement.
        let catalog = self.adapter.list_tables().await?;
        if let Some(unknown) = tables.iter().find(|t| !catalog.contains(*t)) {
            return Err(DbCleanerError::configuration(format!(
                "table '{unknown}' is not present in the database catalog"
            )));
        }

        if opts.backup && !opts.dry_run {
            // Backup is a reserved extension point; its not-implemented
            // failure aborts the batch before any table is touched.
            let path = PathBuf::from(format!("{}.backup", self.adapter.config().dbname));
            info!("creating database backup at {}", path.display());
            self.adapter.backup_database(&path).await?;
        }

        let action = if opts.truncate { "truncate" } else { "drop" };

        for table in tables {
            if opts.dry_run {
                match self.adapter.table_row_count(table).await {
                    Ok(count) => info!("would {action} table '{table}' ({count} rows)"),
                    // Informational only; mutation failures below are what
                    // abort the batch.
                    Err(e) => warn!("could not count rows in table '{table}': {e}"),
                }
                continue;
            }

            if opts.truncate {
                info!("truncating table '{table}'");
                self.adapter.truncate_table(table).await?;
            } else {
                info!("dropping table '{table}'");
                self.adapter.drop_table(table).await?;
            }
        }

        Ok(())
    }
}
