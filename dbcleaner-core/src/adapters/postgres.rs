//! PostgreSQL driver adapter.
//!
//! Connection options are built programmatically from [`DatabaseConfig`],
//! so no credential-bearing DSN string ever exists to leak into logs or
//! error messages. The session is a sqlx pool capped at one connection:
//! the whole batch runs on a single, exclusively-owned session.

use super::{DatabaseAdapter, Driver};
use crate::config::DatabaseConfig;
use crate::error::{DbCleanerError, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::path::Path;
use std::time::Duration;

/// PostgreSQL adapter.
pub struct PostgresAdapter {
    config: DatabaseConfig,
    pool: Option<PgPool>,
}

impl std::fmt::Debug for PostgresAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresAdapter")
            .field("config", &self.config.to_string())
            .field("connected", &self.pool.is_some())
            .finish()
    }
}

impl PostgresAdapter {
    /// Creates a disconnected adapter owning the given connection settings.
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config, pool: None }
    }

    fn pool(&self) -> Result<&PgPool> {
        self.pool.as_ref().ok_or_else(DbCleanerError::not_connected)
    }

    fn connect_options(&self) -> Result<PgConnectOptions> {
        let ssl_mode = match self.config.sslmode.as_deref() {
            None | Some("disable") => PgSslMode::Disable,
            Some("allow") => PgSslMode::Allow,
            Some("prefer") => PgSslMode::Prefer,
            Some("require") => PgSslMode::Require,
            Some("verify-ca") => PgSslMode::VerifyCa,
            Some("verify-full") => PgSslMode::VerifyFull,
            Some(other) => {
                return Err(DbCleanerError::configuration(format!(
                    "unrecognized sslmode for postgres: {other}"
                )));
            }
        };

        Ok(PgConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.user)
            .password(&self.config.password)
            .database(&self.config.dbname)
            .ssl_mode(ssl_mode)
            .application_name("dbcleaner"))
    }
}

/// Quotes a table name as a PostgreSQL identifier, doubling any embedded
/// double quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[async_trait]
impl DatabaseAdapter for PostgresAdapter {
    fn driver(&self) -> Driver {
        Driver::Postgres
    }

    fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    async fn connect(&mut self, timeout: Duration) -> Result<()> {
        use sqlx::Executor;

        let options = self.connect_options()?;

        let connect = PgPoolOptions::new()
            // One session for the whole batch; the cleaner owns it
            // exclusively and issues operations sequentially.
            .max_connections(1)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    // Statement execution stays unbounded, but waiting on
                    // another session's lock fails fast instead of hanging
                    // the batch.
                    conn.execute("SET lock_timeout = '30s'").await?;
                    Ok(())
                })
            })
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
        // Catalog order is passed through as-is; callers must not rely on
        // any particular ordering.
        sqlx::query_scalar(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_type = 'BASE TABLE'",
        )
        .fetch_all(self.pool()?)
        .await
        .map_err(|e| DbCleanerError::query_failed("listing tables", e))
    }

    async fn truncate_table(&self, table: &str) -> Result<()> {
        let sql = format!(
            "TRUNCATE TABLE {} RESTART IDENTITY CASCADE",
            quote_ident(table)
        );
        sqlx::query(&sql)
            .execute(self.pool()?)
            .await
            .map_err(|e| DbCleanerError::query_failed(format!("TRUNCATE on table '{table}'"), e))?;
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        let sql = format!("DROP TABLE IF EXISTS {} CASCADE", quote_ident(table));
        sqlx::query(&sql)
            .execute(self.pool()?)
            .await
            .map_err(|e| DbCleanerError::query_failed(format!("DROP on table '{table}'"), e))?;
        Ok(())
    }

    async fn table_row_count(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        sqlx::query_scalar(&sql)
            .fetch_one(self.pool()?)
            .await
            .map_err(|e| DbCleanerError::query_failed(format!("COUNT on table '{table}'"), e))
    }

    async fn backup_database(&self, _path: &Path) -> Result<()> {
        // Reserved for a pg_dump-based implementation.
        Err(DbCleanerError::not_implemented("postgres database backup"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(sslmode: Option<&str>) -> DatabaseConfig {
        DatabaseConfig {
            driver: "postgres".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            user: "admin".to_string(),
            password: "secret".to_string(),
            dbname: "app".to_string(),
            sslmode: sslmode.map(ToString::to_string),
        }
    }

    #[test]
    fn test_quote_ident_plain_name() {
        assert_eq!(quote_ident("users"), "\"users\"");
    }

    #[test]
    fn test_quote_ident_doubles_embedded_quotes() {
        assert_eq!(
            quote_ident("weird\"; DROP TABLE x; --"),
            "\"weird\"\"; DROP TABLE x; --\""
        );
    }

    #[test]
    fn test_sslmode_defaults_to_disable() {
        let adapter = PostgresAdapter::new(config(None));
        assert!(adapter.connect_options().is_ok());
    }

    #[test]
    fn test_unrecognized_sslmode_is_rejected() {
        let adapter = PostgresAdapter::new(config(Some("sideways")));
        let err = adapter.connect_options().unwrap_err();
        assert!(err.to_string().contains("sslmode"));
    }

    #[tokio::test]
    async fn test_operations_without_session_fail_with_connection_error() {
        let adapter = PostgresAdapter::new(config(None));
        let err = adapter.list_tables().await.unwrap_err();
        assert!(matches!(err, DbCleanerError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_close_without_connect_is_a_no_op() {
        let mut adapter = PostgresAdapter::new(config(None));
        adapter.close().await;
        adapter.close().await;
    }

    #[tokio::test]
    async fn test_backup_is_not_implemented() {
        let adapter = PostgresAdapter::new(config(None));
        let err = adapter
            .backup_database(Path::new("app.dump"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbCleanerError::NotImplemented { .. }));
    }

    #[test]
    fn test_debug_does_not_leak_password() {
        let adapter = PostgresAdapter::new(config(None));
        let debug = format!("{adapter:?}");
        assert!(!debug.contains("secret"));
    }
}
