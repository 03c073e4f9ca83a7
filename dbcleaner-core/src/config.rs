//! Configuration file loading and validation.
//!
//! The configuration is a YAML document with a mandatory `database` section
//! (driver and credentials) and an optional `cleaner` section (default
//! cleaning policy and table filters).
//!
//! Credentials never appear in logs: [`DatabaseConfig`]'s `Display`
//! implementation renders only `driver://host:port/dbname`.

use crate::adapters::Driver;
use crate::error::{DbCleanerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Cleaning policy defaults and table filters.
    #[serde(default)]
    pub cleaner: CleanerConfig,
}

/// Database connection settings.
///
/// Immutable once constructed; owned by exactly one driver adapter for its
/// lifetime.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Declared driver name (`postgres`, `postgresql`, or `mysql`).
    pub driver: String,
    /// Database host address.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Username to authenticate as.
    pub user: String,
    /// Password for the user.
    pub password: String,
    /// Name of the database to operate on.
    pub dbname: String,
    /// SSL mode (engine-specific; defaults to disabled when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sslmode: Option<String>,
}

/// Default cleaning policy, merged with CLI flags per invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanerConfig {
    /// Report intended actions without mutating any table.
    #[serde(default)]
    pub dry_run: bool,
    /// Request a backup before cleaning.
    #[serde(default)]
    pub backup_before: bool,
    /// Truncate tables instead of dropping them.
    #[serde(default)]
    pub truncate_only: bool,
    /// When non-empty, only these tables are offered for cleaning.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_tables: Vec<String>,
    /// Tables never offered for cleaning.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_tables: Vec<String>,
}

impl Config {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    /// Returns an I/O error if the file is unreadable, or a configuration
    /// error if the document is malformed or fails validation.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DbCleanerError::io(format!("reading {}", path.display()), e))?;
        Self::from_yaml(&content)
    }

    /// Parses and validates configuration from a YAML string.
    ///
    /// # Errors
    /// Returns an error if the document is malformed or fails validation.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to a YAML string.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Writes the configuration to a YAML file.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let yaml = self.to_yaml()?;
        std::fs::write(path, yaml)
            .map_err(|e| DbCleanerError::io(format!("writing {}", path.display()), e))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns a configuration error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.database.validate()
    }
}

impl DatabaseConfig {
    /// Validates connection settings.
    ///
    /// # Errors
    /// Returns a configuration error if a field is empty or out of range,
    /// or if the declared driver name is not a supported engine.
    pub fn validate(&self) -> Result<()> {
        // Rejecting unknown drivers here keeps bad driver names a
        // construction-time failure, never a mid-batch one.
        self.driver()?;

        if self.host.is_empty() {
            return Err(DbCleanerError::configuration("database.host cannot be empty"));
        }
        if self.port == 0 {
            return Err(DbCleanerError::configuration(
                "database.port must be greater than 0",
            ));
        }
        if self.dbname.is_empty() {
            return Err(DbCleanerError::configuration(
                "database.dbname cannot be empty",
            ));
        }
        Ok(())
    }

    /// Resolves the declared driver name to a supported engine.
    ///
    /// # Errors
    /// Returns a configuration error for unrecognized driver names.
    pub fn driver(&self) -> Result<Driver> {
        self.driver.parse()
    }
}

impl std::fmt::Display for DatabaseConfig {
    // Intentionally omits user and password.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}://{}:{}/{}",
            self.driver, self.host, self.port, self.dbname
        )
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"****")
            .field("dbname", &self.dbname)
            .field("sslmode", &self.sslmode)
            .finish()
    }
}

impl CleanerConfig {
    /// Applies the include/exclude filters to a candidate table list,
    /// preserving input order. An empty include list means "all tables".
    pub fn filter_tables(&self, tables: &[String]) -> Vec<String> {
        tables
            .iter()
            .filter(|t| self.include_tables.is_empty() || self.include_tables.contains(*t))
            .filter(|t| !self.exclude_tables.contains(*t))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            database: DatabaseConfig {
                driver: "postgres".to_string(),
                host: "db.internal".to_string(),
                port: 5432,
                user: "admin".to_string(),
                password: "s3cret".to_string(),
                dbname: "app".to_string(),
                sslmode: Some("require".to_string()),
            },
            cleaner: CleanerConfig {
                dry_run: true,
                backup_before: false,
                truncate_only: true,
                include_tables: vec![],
                exclude_tables: vec!["schema_migrations".to_string()],
            },
        }
    }

    #[test]
    fn test_yaml_round_trip_preserves_all_fields() {
        let config = sample_config();
        let yaml = config.to_yaml().unwrap();
        let reloaded = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config, reloaded);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbcleaner.yaml");

        let config = sample_config();
        config.save(&path).unwrap();
        let reloaded = Config::load(&path).unwrap();
        assert_eq!(config, reloaded);
    }

    #[test]
    fn test_load_missing_file_is_an_io_error() {
        let err = Config::load("/nonexistent/dbcleaner.yaml").unwrap_err();
        assert!(matches!(err, DbCleanerError::Io { .. }));
    }

    #[test]
    fn test_cleaner_section_is_optional() {
        let yaml = "
database:
  driver: mysql
  host: localhost
  port: 3306
  user: root
  password: root
  dbname: test
";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.cleaner, CleanerConfig::default());
        assert_eq!(config.database.sslmode, None);
    }

    #[test]
    fn test_unsupported_driver_fails_validation() {
        let mut config = sample_config();
        config.database.driver = "mongodb".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, DbCleanerError::Configuration { .. }));
        assert!(err.to_string().contains("mongodb"));
    }

    #[test]
    fn test_empty_host_fails_validation() {
        let mut config = sample_config();
        config.database.host = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_port_fails_validation() {
        let mut config = sample_config();
        config.database.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_display_omits_credentials() {
        let config = sample_config();
        let display = config.database.to_string();
        assert!(display.contains("db.internal"));
        assert!(display.contains("app"));
        assert!(!display.contains("admin"));
        assert!(!display.contains("s3cret"));
    }

    #[test]
    fn test_debug_masks_password() {
        let config = sample_config();
        let debug = format!("{:?}", config.database);
        assert!(debug.contains("****"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_filter_tables_include_then_exclude() {
        let tables: Vec<String> = ["users", "events", "schema_migrations", "audit"]
            .iter()
            .map(ToString::to_string)
            .collect();

        // Empty include list means all tables pass the first filter.
        let cleaner = CleanerConfig {
            exclude_tables: vec!["schema_migrations".to_string()],
            ..Default::default()
        };
        assert_eq!(cleaner.filter_tables(&tables), vec!["users", "events", "audit"]);

        // Include wins first, then exclude is applied on the survivors.
        let cleaner = CleanerConfig {
            include_tables: vec!["users".to_string(), "audit".to_string()],
            exclude_tables: vec!["audit".to_string()],
            ..Default::default()
        };
        assert_eq!(cleaner.filter_tables(&tables), vec!["users"]);
    }

    #[test]
    fn test_filter_tables_preserves_input_order() {
        let tables: Vec<String> = ["c", "a", "b"].iter().map(ToString::to_string).collect();
        let cleaner = CleanerConfig::default();
        assert_eq!(cleaner.filter_tables(&tables), vec!["c", "a", "b"]);
    }
}
