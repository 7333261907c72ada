//! Strongly typed configuration schema.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_METRICS_CAPACITY: usize = 1000;
const DEFAULT_HEALTH_WINDOW_SECS: u64 = 300;

/// Settings for every component the integration manager builds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntegrationConfig {
    /// Base URL for the API client; the client is disabled when absent.
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Headers sent with every API request.
    pub default_headers: BTreeMap<String, String>,
    /// Maximum number of retained metric samples.
    pub metrics_capacity: usize,
    /// Trailing window for health classification in seconds.
    pub health_window_secs: u64,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_headers: BTreeMap::new(),
            metrics_capacity: DEFAULT_METRICS_CAPACITY,
            health_window_secs: DEFAULT_HEALTH_WINDOW_SECS,
        }
    }
}

impl IntegrationConfig {
    /// Sets the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Adds a default request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Health window as a [`Duration`].
    #[must_use]
    pub const fn health_window(&self) -> Duration {
        Duration::from_secs(self.health_window_secs)
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(base_url) = &self.base_url {
            let trimmed = base_url.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::invalid("base_url", "must not be empty"));
            }
            if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
                return Err(ConfigError::invalid(
                    "base_url",
                    "must start with http:// or https://",
                ));
            }
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid("timeout_secs", "must be greater than zero"));
        }
        if self.metrics_capacity == 0 {
            return Err(ConfigError::invalid(
                "metrics_capacity",
                "must be greater than zero",
            ));
        }
        if self.health_window_secs == 0 {
            return Err(ConfigError::invalid(
                "health_window_secs",
                "must be greater than zero",
            ));
        }
        if self
            .default_headers
            .keys()
            .any(|name| name.trim().is_empty())
        {
            return Err(ConfigError::invalid(
                "default_headers",
                "header names must not be empty",
            ));
        }
        Ok(())
    }
}
