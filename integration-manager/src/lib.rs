//! Integration runtime that ties the service layer together.
//!
//! [`IntegrationManager`] owns shared handles to a
//! [`ServiceRegistry`](integration_registry::ServiceRegistry), an
//! [`EventBus`](integration_events::EventBus), a
//! [`MetricsStore`](integration_telemetry::MetricsStore), and a
//! [`ToolOrchestrator`](integration_tools::ToolOrchestrator). Tools registered
//! through the manager become discoverable services, and each execution or
//! health probe leaves a metric sample and an event behind.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod manager;

pub use error::{ManagerError, ManagerResult};
pub use manager::{
    EVENT_SOURCE, IntegrationManager, IntegrationManagerBuilder, METRIC_EXECUTION_ERROR,
    METRIC_EXECUTION_SUCCESS, METRIC_EXECUTION_TIME, METRIC_HEALTH_CHECK_ERROR,
    METRIC_HEALTH_CHECK_LATENCY, TOOL_ENDPOINT_SCHEME,
};
