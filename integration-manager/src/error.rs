//! Errors surfaced by [`IntegrationManager`](crate::IntegrationManager).

use integration_client::ApiError;
use integration_config::ConfigError;
use integration_primitives::ServiceId;
use integration_registry::RegistryError;
use integration_telemetry::TelemetryError;
use integration_tools::ToolError;
use thiserror::Error;

/// Result alias for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Errors produced while building the manager or registering and probing
/// services.
///
/// Tool execution returns [`ToolError`] directly so callers see the
/// orchestrator's error unchanged.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Metrics configuration was rejected.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// The tool layer rejected a registration.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The registry rejected a descriptor.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The API client failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// No service with the id is registered.
    #[error("service `{id}` is not registered")]
    UnknownService {
        /// Requested id.
        id: ServiceId,
    },

    /// The service does not declare a health-check endpoint.
    #[error("service `{id}` has no health-check endpoint")]
    NoHealthCheck {
        /// Service that was probed.
        id: ServiceId,
    },

    /// Probing requires an API client and none was configured.
    #[error("no API client configured")]
    ClientUnavailable,
}
