//! Metrics, health, and performance reporting.
//!
//! [`MetricsStore`] keeps a bounded, insertion-ordered series of
//! [`MetricSample`]s. Health ([`HealthStatus`]) and performance
//! ([`PerformanceReport`]) views are derived from the live samples on every
//! call; nothing derived is stored.

#![warn(missing_docs, clippy::pedantic)]

mod config;
mod health;
mod report;
mod sample;
mod store;

pub use config::{DEFAULT_CAPACITY, DEFAULT_HEALTH_WINDOW, MetricsConfig, TelemetryError};
pub use health::{HealthState, HealthStatus, ServiceHealth};
pub use report::{MetricSummary, PerformanceReport, ReportSummary, Trend};
pub use sample::{MetricSample, MetricSampleBuilder, TimeRange};
pub use store::{MetricsStore, StoreStats};
