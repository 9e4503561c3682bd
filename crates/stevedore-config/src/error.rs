//! Error types for configuration loading and validation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration at {path}")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path that failed to read.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// Configuration file was not valid TOML for the expected schema.
    #[error("failed to parse configuration at {path}")]
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Source TOML error.
        source: toml::de::Error,
    },
    /// An explicitly requested configuration file does not exist.
    #[error("configuration file not found at {path}")]
    Missing {
        /// Path that was requested.
        path: PathBuf,
    },
    /// No configuration file was supplied and no default location exists.
    #[error("no configuration file found in default locations")]
    NotFound,
    /// Field contained an invalid value.
    #[error("invalid value for '{field}' in '{section}': {reason}")]
    InvalidField {
        /// Section that failed validation.
        section: String,
        /// Field that failed validation.
        field: String,
        /// Human-readable reason for the failure.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(section: &str, field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            section: section.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
