//! Configuration parsing for the Qryti compliance client
//!
//! This crate handles parsing and validation of qryti.toml files and layers
//! the global file, the project file, `QRYTI_*` environment variables and
//! command-line overrides into one effective configuration.

pub mod toml;
pub mod merge;

// Re-export main types
pub use self::toml::{ApiSection, CacheSection, EndpointsSection, QrytiToml, RetrySection, StorageSection};
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource, CONFIG_FILE, ENV_KEYS};

use qryti_core::error::QrytiError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, QrytiError>;
