//! Driver adapters and cleaning orchestration for dbcleaner.
//!
//! This crate provides everything below the CLI surface: YAML
//! configuration, the object-safe [`DatabaseAdapter`] contract with
//! PostgreSQL and MySQL implementations, and the [`Cleaner`] that applies
//! dry-run / backup / truncate-or-drop policy across a batch of tables.
//!
//! # Architecture
//! - Factory pattern for adapter instantiation: the declared driver name
//!   resolves to a concrete adapter at construction time; unsupported
//!   names fail before any connection attempt.
//! - One exclusively-owned session per invocation, processed table by
//!   table with no internal parallelism.
//! - Errors never contain passwords or other connection credentials.

pub mod adapters;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod logging;

pub use adapters::{DatabaseAdapter, Driver, create_adapter};
pub use cleaner::{CleanOptions, Cleaner};
pub use config::{CleanerConfig, Config, DatabaseConfig};
pub use error::{DbCleanerError, Result};
pub use logging::init_logging;
