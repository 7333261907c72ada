//! Shared error definitions for integration primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the integration runtime.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided UUID-backed identifier could not be parsed.
    #[error("invalid identifier: {source}")]
    InvalidId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// Service identifier failed validation.
    #[error("invalid service id `{id}`: {reason}")]
    InvalidServiceId {
        /// The offending identifier string.
        id: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Capability identifier failed validation.
    #[error("invalid capability id `{id}`: {reason}")]
    InvalidCapabilityId {
        /// The offending identifier string.
        id: String,
        /// Human-readable reason for rejection.
        reason: String,
    },
}
