//! Error types for cleaning operations.
//!
//! All error messages carry enough context (table name, underlying driver
//! message) to report to the operator, and never contain passwords or other
//! connection credentials.

use std::time::Duration;
use thiserror::Error;

/// Main error type for dbcleaner operations.
#[derive(Debug, Error)]
pub enum DbCleanerError {
    /// Database connection failed or no session is established.
    #[error("database connection failed: {context}")]
    Connection {
        /// What was being attempted when the connection failed.
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The connect deadline elapsed before a session was established.
    #[error("connection attempt timed out after {elapsed:?}")]
    ConnectionTimeout {
        /// The deadline that was exceeded.
        elapsed: Duration,
    },

    /// Configuration or validation error. Always fatal before any
    /// connection attempt.
    #[error("configuration error: {message}")]
    Configuration {
        /// Human-readable description of what is wrong.
        message: String,
    },

    /// A query issued against the database failed (introspection,
    /// truncate, drop, or count).
    #[error("query failed: {context}")]
    Query {
        /// The operation and table the failure belongs to.
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An operation that is intentionally left unfinished was invoked.
    /// Callers must treat this as a hard failure, never a silent skip.
    #[error("{feature} is not implemented")]
    NotImplemented {
        /// The unfinished operation.
        feature: String,
    },

    /// I/O operation failed (configuration file reads/writes).
    #[error("I/O operation failed: {context}")]
    Io {
        /// The path or operation that failed.
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed or serialized.
    #[error("invalid configuration file: {source}")]
    Yaml {
        #[from]
        source: serde_yaml::Error,
    },
}

/// Convenience type alias for Results with [`DbCleanerError`].
pub type Result<T> = std::result::Result<T, DbCleanerError>;

impl DbCleanerError {
    /// Creates a connection error with context.
    pub fn connection_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            context: context.into(),
            source: Some(Box::new(error)),
        }
    }

    /// Creates the error returned when an operation is invoked on an
    /// adapter with no live session.
    pub fn not_connected() -> Self {
        Self::Connection {
            context: "no active session (connect() was not called or already closed)".to_string(),
            source: None,
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a query error with context.
    pub fn query_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Query {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a not-implemented error for a reserved extension point.
    pub fn not_implemented(feature: impl Into<String>) -> Self {
        Self::NotImplemented {
            feature: feature.into(),
        }
    }

    /// Creates an I/O error with path context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
