//! Service integration and observability layer.
//!
//! Depend on this crate to pull the component crates in behind feature flags.
//! The default `manager` feature enables everything, including the
//! [`IntegrationManager`](manager::IntegrationManager) that composes them.

#![warn(missing_docs, clippy::pedantic)]

/// Identifiers and dynamic payload values.
pub use integration_primitives as primitives;

/// HTTP API client with JSON and event-stream support (enabled by `client` feature).
#[cfg(feature = "client")]
pub use integration_client as client;

/// Service catalog (enabled by `registry` feature).
#[cfg(feature = "registry")]
pub use integration_registry as registry;

/// Publish/subscribe event bus (enabled by `events` feature).
#[cfg(feature = "events")]
pub use integration_events as events;

/// Metrics, health, and performance reports (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use integration_telemetry as telemetry;

/// Tool contract and orchestration (enabled by `tools` feature).
#[cfg(feature = "tools")]
pub use integration_tools as tools;

/// Configuration loading (enabled by `config` feature).
#[cfg(feature = "config")]
pub use integration_config as config;

/// Instrumented runtime (enabled by `manager` feature).
#[cfg(feature = "manager")]
pub use integration_manager as manager;

/// Types most applications need, in one import.
#[cfg(feature = "manager")]
pub mod prelude {
    pub use integration_config::IntegrationConfig;
    pub use integration_events::{Event, EventCategory, HandlerResult, Severity};
    pub use integration_manager::{IntegrationManager, ManagerError};
    pub use integration_primitives::{CapabilityId, DynamicValue, Payload, ServiceId};
    pub use integration_registry::{ServiceDescriptor, ServiceQuery};
    pub use integration_telemetry::{HealthState, MetricSample, TimeRange};
    pub use integration_tools::{FnTool, Tool, ToolError, ToolMetadata, ToolOutput};
}
