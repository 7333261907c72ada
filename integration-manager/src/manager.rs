//! Instrumented composition of registry, event bus, metrics, and tools.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use integration_client::{ApiClient, ApiError, ApiRequest, ClientConfig};
use integration_config::IntegrationConfig;
use integration_events::{Event, EventBus, EventCategory, EventHandler, Severity, Subscription};
use integration_primitives::{DynamicValue, Payload, ServiceId};
use integration_registry::{RegistryResult, ServiceDescriptor, ServiceQuery, ServiceRegistry};
use integration_telemetry::{
    HealthStatus, MetricSample, MetricsConfig, MetricsStore, PerformanceReport, TelemetryError,
    TimeRange,
};
use integration_tools::{
    LocalOrchestrator, Tool, ToolError, ToolMetadata, ToolOrchestrator, ToolOutput, ToolResult,
};
use tracing::{debug, info, warn};

use crate::error::{ManagerError, ManagerResult};

/// Source name stamped on every event the manager publishes.
pub const EVENT_SOURCE: &str = "integration-manager";

/// Scheme of the endpoint recorded for tools registered as services.
pub const TOOL_ENDPOINT_SCHEME: &str = "tool://";

/// Metric recorded with the duration of every completed tool call.
pub const METRIC_EXECUTION_TIME: &str = "execution_time";
/// Metric recorded as 1 or 0 after every completed tool call.
pub const METRIC_EXECUTION_SUCCESS: &str = "execution_success";
/// Metric recorded when a tool call fails.
pub const METRIC_EXECUTION_ERROR: &str = "execution_error";
/// Metric recorded with the latency of a successful health probe.
pub const METRIC_HEALTH_CHECK_LATENCY: &str = "health_check_latency";
/// Metric recorded when a health probe fails.
pub const METRIC_HEALTH_CHECK_ERROR: &str = "health_check_error";

/// Wraps tool execution and service probing with metrics and events.
///
/// Every component is held behind an [`Arc`], so the same registry, bus, or
/// store can be shared with other parts of the process.
pub struct IntegrationManager {
    registry: Arc<ServiceRegistry>,
    events: Arc<EventBus>,
    metrics: Arc<MetricsStore>,
    orchestrator: Arc<dyn ToolOrchestrator>,
    client: Option<Arc<ApiClient>>,
}

impl fmt::Debug for IntegrationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationManager")
            .field("services", &self.registry.len())
            .field("subscriptions", &self.events.subscription_count())
            .field("metrics", &self.metrics.stats())
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl Default for IntegrationManager {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl IntegrationManager {
    /// Starts building a manager; unset components get fresh defaults.
    #[must_use]
    pub fn builder() -> IntegrationManagerBuilder {
        IntegrationManagerBuilder::default()
    }

    /// Builds every component from validated configuration.
    ///
    /// The API client is only created when a base URL is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Config`] when validation fails, or
    /// [`ManagerError::Api`] when the base URL is rejected by the client.
    pub fn from_config(config: &IntegrationConfig) -> ManagerResult<Self> {
        config.validate()?;

        let capacity = NonZeroUsize::new(config.metrics_capacity).ok_or(
            TelemetryError::InvalidConfig("capacity must be greater than zero"),
        )?;
        let metrics_config =
            MetricsConfig::new(capacity).with_health_window(config.health_window())?;
        let mut builder = Self::builder().metrics(Arc::new(MetricsStore::new(metrics_config)));

        if let Some(base_url) = &config.base_url {
            let mut client_config = ClientConfig::new(base_url)?.with_timeout(config.timeout());
            for (name, value) in &config.default_headers {
                client_config = client_config.with_header(name.clone(), value.clone());
            }
            builder = builder.client(Arc::new(ApiClient::new(client_config)));
        }

        Ok(builder.build())
    }

    /// Returns the service registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Returns the event bus.
    #[must_use]
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Returns the metrics store.
    #[must_use]
    pub fn metrics(&self) -> &Arc<MetricsStore> {
        &self.metrics
    }

    /// Returns the tool orchestrator.
    #[must_use]
    pub fn orchestrator(&self) -> &Arc<dyn ToolOrchestrator> {
        &self.orchestrator
    }

    /// Returns the API client, if one is configured.
    #[must_use]
    pub fn client(&self) -> Option<&Arc<ApiClient>> {
        self.client.as_ref()
    }

    /// Registers a tool with the orchestrator and exposes it as a service.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Tool`] when the orchestrator rejects the tool,
    /// or [`ManagerError::Registry`] when its metadata does not form a valid
    /// descriptor; the orchestrator registration is rolled back in that case.
    pub fn register_tool(&self, tool: Arc<dyn Tool>) -> ManagerResult<ServiceDescriptor> {
        let metadata = self.orchestrator.register(tool)?;
        let descriptor = match tool_descriptor(&metadata) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                self.orchestrator.unregister(metadata.id());
                return Err(err.into());
            }
        };

        self.registry.register(descriptor.clone());
        info!(service_id = %descriptor.id(), version = descriptor.version(), "tool registered");
        self.announce_registered(&descriptor);
        Ok(descriptor)
    }

    /// Removes a tool from the orchestrator and the registry.
    ///
    /// Returns the removed descriptor. `ServiceUnregistered` is published
    /// when either side held the tool.
    pub fn unregister_tool(&self, id: &ServiceId) -> Option<ServiceDescriptor> {
        let tool = self.orchestrator.unregister(id);
        let service = self.registry.unregister(id);
        if tool.is_some() || service.is_some() {
            info!(service_id = %id, "tool unregistered");
            self.announce_unregistered(id);
        }
        service
    }

    /// Registers an external service, replacing any descriptor with the same id.
    pub fn register_service(&self, descriptor: ServiceDescriptor) -> Option<ServiceDescriptor> {
        let previous = self.registry.register(descriptor.clone());
        info!(
            service_id = %descriptor.id(),
            replaced = previous.is_some(),
            "service registered"
        );
        self.announce_registered(&descriptor);
        previous
    }

    /// Removes an external service.
    pub fn unregister_service(&self, id: &ServiceId) -> Option<ServiceDescriptor> {
        let removed = self.registry.unregister(id)?;
        info!(service_id = %id, "service unregistered");
        self.announce_unregistered(id);
        Some(removed)
    }

    /// Executes a tool, recording its duration and outcome.
    ///
    /// A completed call records `execution_time` and `execution_success` and
    /// publishes `ToolExecuted`. A failed call records `execution_error`,
    /// publishes `ErrorOccurred`, and returns the orchestrator's error.
    ///
    /// # Errors
    ///
    /// Returns the [`ToolError`] produced by the orchestrator unchanged.
    pub async fn execute_tool(
        &self,
        id: &ServiceId,
        parameters: Payload,
    ) -> ToolResult<ToolOutput> {
        let started = Instant::now();
        let result = self.orchestrator.execute(id, parameters).await;
        let elapsed_ms = elapsed_millis(started);

        match &result {
            Ok(output) => self.record_execution(id, output, elapsed_ms),
            Err(err) => self.record_execution_error(id, err, elapsed_ms),
        }
        result
    }

    /// Calls the service's health-check endpoint through the API client.
    ///
    /// A relative endpoint is resolved against the client's base URL; an
    /// absolute `http(s)://` endpoint is requested directly. A successful
    /// probe records `health_check_latency` and publishes `HealthChecked`;
    /// a failed one records `health_check_error` and publishes a warning
    /// `ErrorOccurred`.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::UnknownService`],
    /// [`ManagerError::NoHealthCheck`], or [`ManagerError::ClientUnavailable`]
    /// before any request is made, and [`ManagerError::Api`] when the request
    /// fails.
    pub async fn probe_service(&self, id: &ServiceId) -> ManagerResult<Payload> {
        let descriptor = self
            .registry
            .find_by_id(id)
            .ok_or_else(|| ManagerError::UnknownService { id: id.clone() })?;
        let endpoint = descriptor
            .health_check_endpoint()
            .ok_or_else(|| ManagerError::NoHealthCheck { id: id.clone() })?;
        let client = self.client.as_ref().ok_or(ManagerError::ClientUnavailable)?;

        let started = Instant::now();
        let result = client.execute_raw(&ApiRequest::get(endpoint)).await;
        let elapsed_ms = elapsed_millis(started);

        match result {
            Ok(body) => {
                self.record_probe(id, elapsed_ms);
                Ok(body)
            }
            Err(err) => {
                self.record_probe_error(id, &err, elapsed_ms);
                Err(err.into())
            }
        }
    }

    /// Appends a caller-supplied sample to the metrics store.
    pub fn record_metric(&self, sample: MetricSample) {
        self.metrics.record_metric(sample);
    }

    /// Publishes a caller-supplied event, returning the number of handlers invoked.
    pub fn publish_event(&self, event: Event) -> usize {
        self.events.publish(event)
    }

    /// Health of every service that reported within the configured window.
    #[must_use]
    pub fn get_health_status(&self) -> HealthStatus {
        self.metrics.get_health_status()
    }

    /// Performance report over the range.
    #[must_use]
    pub fn get_performance_report(&self, range: &TimeRange) -> PerformanceReport {
        self.metrics.get_performance_report(range)
    }

    /// Samples recorded for the service within the range.
    #[must_use]
    pub fn get_metrics(&self, id: &ServiceId, range: &TimeRange) -> Vec<MetricSample> {
        self.metrics.get_metrics(id, range)
    }

    /// Every registered service, ordered by id.
    #[must_use]
    pub fn discover_services(&self) -> Vec<ServiceDescriptor> {
        self.registry.discover_all()
    }

    /// Services matching the query.
    #[must_use]
    pub fn find_services(&self, query: &ServiceQuery) -> Vec<ServiceDescriptor> {
        self.registry.find_services(query)
    }

    /// Subscribes a handler to one event category.
    pub fn subscribe_to_events<H>(&self, category: EventCategory, handler: H) -> Subscription
    where
        H: EventHandler + 'static,
    {
        self.events.subscribe(category, handler)
    }

    /// Removes a subscription. Returns `false` if it was already removed.
    pub fn unsubscribe_from_events(&self, subscription: &Subscription) -> bool {
        self.events.unsubscribe(subscription)
    }

    fn record_execution(&self, id: &ServiceId, output: &ToolOutput, elapsed_ms: f64) {
        self.metrics.record_metric(
            MetricSample::builder(id.clone(), METRIC_EXECUTION_TIME, elapsed_ms)
                .unit("ms")
                .success(output.success)
                .build(),
        );
        self.metrics.record_metric(
            MetricSample::builder(
                id.clone(),
                METRIC_EXECUTION_SUCCESS,
                if output.success { 1.0 } else { 0.0 },
            )
            .success(output.success)
            .build(),
        );

        let severity = if output.success {
            debug!(tool_id = %id, elapsed_ms, "tool executed");
            Severity::Info
        } else {
            warn!(tool_id = %id, elapsed_ms, "tool reported an unsuccessful result");
            Severity::Warning
        };
        self.events.publish(
            Event::builder(EventCategory::ToolExecuted, EVENT_SOURCE)
                .severity(severity)
                .data("tool_id", id.as_str())
                .data("success", output.success)
                .data("execution_time_ms", elapsed_ms)
                .build(),
        );
    }

    fn record_execution_error(&self, id: &ServiceId, err: &ToolError, elapsed_ms: f64) {
        let message = err.to_string();
        self.metrics.record_metric(
            MetricSample::builder(id.clone(), METRIC_EXECUTION_ERROR, elapsed_ms)
                .unit("ms")
                .success(false)
                .tag("error", message.as_str())
                .build(),
        );

        warn!(tool_id = %id, elapsed_ms, %err, "tool execution failed");
        self.events.publish(
            Event::builder(EventCategory::ErrorOccurred, EVENT_SOURCE)
                .severity(Severity::Error)
                .data("tool_id", id.as_str())
                .data("error", message)
                .data("execution_time_ms", elapsed_ms)
                .build(),
        );
    }

    fn record_probe(&self, id: &ServiceId, elapsed_ms: f64) {
        self.metrics.record_metric(
            MetricSample::builder(id.clone(), METRIC_HEALTH_CHECK_LATENCY, elapsed_ms)
                .unit("ms")
                .success(true)
                .build(),
        );

        debug!(service_id = %id, elapsed_ms, "health check passed");
        self.events.publish(
            Event::builder(EventCategory::HealthChecked, EVENT_SOURCE)
                .data("service_id", id.as_str())
                .data("healthy", true)
                .data("latency_ms", elapsed_ms)
                .build(),
        );
    }

    fn record_probe_error(&self, id: &ServiceId, err: &ApiError, elapsed_ms: f64) {
        self.metrics.record_metric(
            MetricSample::builder(id.clone(), METRIC_HEALTH_CHECK_ERROR, elapsed_ms)
                .unit("ms")
                .success(false)
                .tag("code", err.code().as_str())
                .tag("error", err.message())
                .build(),
        );

        warn!(service_id = %id, %err, "health check failed");
        self.events.publish(
            Event::builder(EventCategory::ErrorOccurred, EVENT_SOURCE)
                .severity(Severity::Warning)
                .data("service_id", id.as_str())
                .data("code", err.code().as_str())
                .data("status", err.status().map(u64::from))
                .data("error", err.to_string())
                .build(),
        );
    }

    fn announce_registered(&self, descriptor: &ServiceDescriptor) {
        let capabilities: Vec<DynamicValue> = descriptor
            .capabilities()
            .iter()
            .map(|capability| DynamicValue::from(capability.as_str()))
            .collect();
        self.events.publish(
            Event::builder(EventCategory::ServiceRegistered, EVENT_SOURCE)
                .data("service_id", descriptor.id().as_str())
                .data("name", descriptor.name())
                .data("endpoint", descriptor.endpoint())
                .data("capabilities", capabilities)
                .build(),
        );
    }

    fn announce_unregistered(&self, id: &ServiceId) {
        self.events.publish(
            Event::builder(EventCategory::ServiceUnregistered, EVENT_SOURCE)
                .data("service_id", id.as_str())
                .build(),
        );
    }
}

/// Builder for [`IntegrationManager`].
#[derive(Default)]
pub struct IntegrationManagerBuilder {
    registry: Option<Arc<ServiceRegistry>>,
    events: Option<Arc<EventBus>>,
    metrics: Option<Arc<MetricsStore>>,
    orchestrator: Option<Arc<dyn ToolOrchestrator>>,
    client: Option<Arc<ApiClient>>,
}

impl fmt::Debug for IntegrationManagerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationManagerBuilder")
            .field("registry", &self.registry.is_some())
            .field("events", &self.events.is_some())
            .field("metrics", &self.metrics.is_some())
            .field("orchestrator", &self.orchestrator.is_some())
            .field("client", &self.client.is_some())
            .finish()
    }
}

impl IntegrationManagerBuilder {
    /// Uses an existing registry.
    #[must_use]
    pub fn registry(mut self, registry: Arc<ServiceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Uses an existing event bus.
    #[must_use]
    pub fn events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Uses an existing metrics store.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<MetricsStore>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Uses a custom orchestrator instead of [`LocalOrchestrator`].
    #[must_use]
    pub fn orchestrator(mut self, orchestrator: Arc<dyn ToolOrchestrator>) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    /// Enables service probing through the client.
    #[must_use]
    pub fn client(mut self, client: Arc<ApiClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Finalises the manager.
    #[must_use]
    pub fn build(self) -> IntegrationManager {
        IntegrationManager {
            registry: self.registry.unwrap_or_default(),
            events: self.events.unwrap_or_default(),
            metrics: self.metrics.unwrap_or_default(),
            orchestrator: self
                .orchestrator
                .unwrap_or_else(|| Arc::new(LocalOrchestrator::new())),
            client: self.client,
        }
    }
}

fn tool_descriptor(metadata: &ToolMetadata) -> RegistryResult<ServiceDescriptor> {
    let mut builder = ServiceDescriptor::builder(metadata.id().clone(), metadata.name())
        .version(metadata.version())
        .endpoint(format!("{TOOL_ENDPOINT_SCHEME}{}", metadata.id()))
        .capabilities(metadata.capabilities().iter().cloned());
    if let Some(description) = metadata.description() {
        builder = builder.description(description);
    }
    builder.build()
}

fn elapsed_millis(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
