//! Configuration for the integration runtime.
//!
//! [`IntegrationConfig`] carries every tunable with a default, can be loaded
//! from JSON or layered with `INTEGRATION_*` environment variables, and is
//! checked with [`IntegrationConfig::validate`] before components are built.

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    ENV_BASE_URL, ENV_HEALTH_WINDOW_SECS, ENV_METRICS_CAPACITY, ENV_TIMEOUT_SECS,
};
pub use schema::IntegrationConfig;
