//! MySQL driver adapter.
//!
//! Mirrors the PostgreSQL adapter with two engine differences: identifiers
//! are backtick-quoted, and TRUNCATE/DROP run with `FOREIGN_KEY_CHECKS`
//! disabled for the statement, since InnoDB refuses to truncate or drop a
//! table referenced by a foreign key. `TRUNCATE TABLE` resets
//! `AUTO_INCREMENT` implicitly.

use super::{DatabaseAdapter, Driver};
use crate::config::DatabaseConfig;
use crate::error::{DbCleanerError, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlSslMode};
use std::path::Path;
use std::time::Duration;

/// MySQL adapter.
pub struct MySqlAdapter {
    config: DatabaseConfig,
    pool: Option<MySqlPool>,
}

impl std::fmt::Debug for MySqlAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlAdapter")
            .field("config", &self.config.to_string())
            .field("connected", &self.pool.is_some())
            .finish()
    }
}

impl MySqlAdapter {
    /// Creates a disconnected adapter owning the given connection settings.
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config, pool: None }
    }

    fn pool(&self) -> Result<&MySqlPool> {
        self.pool.as_ref().ok_or_else(DbCleanerError::not_connected)
    }

    fn connect_options(&self) -> Result<MySqlConnectOptions> {
        let ssl_mode = match self.config.sslmode.as_deref() {
            None | Some("disable" | "disabled") => MySqlSslMode::Disabled,
            Some("prefer" | "preferred") => MySqlSslMode::Preferred,
            Some("require" | "required") => MySqlSslMode::Required,
            Some("verify-ca") => MySqlSslMode::VerifyCa,
            Some("verify-full" | "verify-identity") => MySqlSslMode::VerifyIdentity,
            Some(other) => {
                return Err(DbCleanerError::configuration(format!(
                    "unrecognized sslmode for mysql: {other}"
                )));
            }
        };

        Ok(MySqlConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.user)
            .password(&self.config.password)
            .database(&self.config.dbname)
            .ssl_mode(ssl_mode))
    }

    /// Runs one destructive statement with foreign key checks disabled,
    /// restoring them afterwards even when the statement fails.
    async fn execute_without_fk_checks(&self, sql: &str, context: String) -> Result<()> {
        let pool = self.pool()?;

        sqlx::query("SET FOREIGN_KEY_CHECKS = 0")
            .execute(pool)
            .await
            .map_err(|e| DbCleanerError::query_failed("disabling foreign key checks", e))?;

        let outcome = sqlx::query(sql).execute(pool).await;

        let restore = sqlx::query("SET FOREIGN_KEY_CHECKS = 1").execute(pool).await;

        outcome.map_err(|e| DbCleanerError::query_failed(context, e))?;
        restore.map_err(|e| DbCleanerError::query_failed("restoring foreign key checks", e))?;
        Ok(())
    }
}

/// Quotes a table name as a MySQL identifier, doubling any embedded
/// backticks.
fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[async_trait]
impl DatabaseAdapter for MySqlAdapter {
    fn driver(&self) -> Driver {
        Driver::MySql
    }

    fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    async fn connect(&mut self, timeout: Duration) -> Result<()> {
        let options = self.connect_options()?;

        let connect = MySqlPoolOptions::new()
            // One session for the whole batch, owned exclusively by the
            // cleaner. FOREIGN_KEY_CHECKS toggles rely on this: the session
            // variable must apply to the same connection the statement
            // runs on.
            .max_connections(1)
            .connect_with(options);

        let pool = tokio::time::timeout(timeout, connect)
            .await
            .map_err(|_| DbCleanerError::ConnectionTimeout { elapsed: timeout })?
            .map_err(|e| {
                DbCleanerError::connection_failed(format!("connecting to {}", self.config), e)
            })?;

        self.pool = Some(pool);
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
        }
    }

    async fn test_connection(&self) -> Result<()> {
        let result: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(self.pool()?)
            .await
            .map_err(|e| {
                DbCleanerError::connection_failed(format!("liveness probe on {}", self.config), e)
            })?;

        if result != 1 {
            return Err(DbCleanerError::connection_failed(
                "liveness probe returned an unexpected result",
                sqlx::Error::RowNotFound,
            ));
        }
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE'",
        )
        .fetch_all(self.pool()?)
        .await
        .map_err(|e| DbCleanerError::query_failed("listing tables", e))
    }

    async fn truncate_table(&self, table: &str) -> Result<()> {
        let sql = format!("TRUNCATE TABLE {}", quote_ident(table));
        self.execute_without_fk_checks(&sql, format!("TRUNCATE on table '{table}'"))
            .await
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        let sql = format!("DROP TABLE IF EXISTS {}", quote_ident(table));
        self.execute_without_fk_checks(&sql, format!("DROP on table '{table}'"))
            .await
    }

    async fn table_row_count(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        sqlx::query_scalar(&sql)
            .fetch_one(self.pool()?)
            .await
            .map_err(|e| DbCleanerError::query_failed(format!("COUNT on table '{table}'"), e))
    }

    async fn backup_database(&self, _path: &Path) -> Result<()> {
        // Reserved for a mysqldump-based implementation.
        Err(DbCleanerError::not_implemented("mysql database backup"))
    }
}
