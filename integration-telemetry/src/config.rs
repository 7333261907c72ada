//! Store configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use thiserror::Error;

/// Number of samples retained when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Trailing window used for health classification.
pub const DEFAULT_HEALTH_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Errors produced by telemetry configuration and queries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TelemetryError {
    /// The configuration was invalid.
    #[error("invalid metrics configuration: {0}")]
    InvalidConfig(&'static str),
    /// A time range ended before it started.
    #[error("time range end precedes start")]
    InvalidTimeRange,
}

/// Configuration for [`MetricsStore`](crate::MetricsStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsConfig {
    capacity: NonZeroUsize,
    health_window: Duration,
}

impl MetricsConfig {
    /// Creates a configuration with the provided capacity.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            health_window: DEFAULT_HEALTH_WINDOW,
        }
    }

    /// Sets the trailing window used for health classification.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::InvalidConfig`] when the window is zero.
    pub fn with_health_window(mut self, window: Duration) -> Result<Self, TelemetryError> {
        if window.is_zero() {
            return Err(TelemetryError::InvalidConfig(
                "health window must be greater than zero",
            ));
        }
        self.health_window = window;
        Ok(self)
    }

    /// Returns the configured capacity.
    #[must_use]
    pub const fn capacity(self) -> NonZeroUsize {
        self.capacity
    }

    /// Returns the health window.
    #[must_use]
    pub const fn health_window(self) -> Duration {
        self.health_window
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            capacity: NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            health_window: DEFAULT_HEALTH_WINDOW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_limits() {
        let config = MetricsConfig::default();
        assert_eq!(config.capacity().get(), 1000);
        assert_eq!(config.health_window(), Duration::from_secs(300));
    }

    #[test]
    fn rejects_zero_window() {
        let err = MetricsConfig::default()
            .with_health_window(Duration::ZERO)
            .expect_err("zero window");
        assert!(matches!(err, TelemetryError::InvalidConfig(_)));
    }
}
