use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration from {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration document was not valid JSON for the schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// An environment variable held an unparseable value.
    #[error("environment variable {key}={value:?} is invalid: {reason}")]
    InvalidEnv {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A field failed validation.
    #[error("invalid configuration field `{field}`: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Why the field was rejected.
        reason: &'static str,
    },
}

impl ConfigError {
    /// Creates a validation error for `field`.
    #[must_use]
    pub const fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::Invalid { field, reason }
    }
}
