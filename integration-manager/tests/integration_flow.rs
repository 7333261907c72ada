use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use integration_client::{ApiClient, ClientConfig, ErrorCode};
use integration_events::{Event, EventCategory, HandlerResult, Severity};
use integration_manager::{
    IntegrationManager, METRIC_EXECUTION_ERROR, METRIC_HEALTH_CHECK_ERROR,
    METRIC_HEALTH_CHECK_LATENCY, ManagerError,
};
use integration_primitives::{CapabilityId, DynamicValue, Payload, ServiceId};
use integration_registry::{ServiceDescriptor, ServiceQuery};
use integration_telemetry::{HealthState, TimeRange};
use integration_tools::{FnTool, Tool, ToolError, ToolMetadata, ToolOutput};

fn id(value: &str) -> ServiceId {
    ServiceId::new(value).unwrap()
}

fn capability(value: &str) -> CapabilityId {
    CapabilityId::new(value).unwrap()
}

fn recent() -> TimeRange {
    TimeRange::trailing(chrono::Duration::minutes(5), Utc::now())
}

fn collect(manager: &IntegrationManager, category: EventCategory) -> Arc<Mutex<Vec<Event>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    manager.subscribe_to_events(category, move |event: &Event| -> HandlerResult {
        sink.lock().unwrap().push(event.clone());
        Ok(())
    });
    seen
}

fn failing_tool() -> Arc<dyn Tool> {
    let metadata = ToolMetadata::new(id("broken"), "Broken", "1.0.0").unwrap();
    Arc::new(FnTool::new(metadata, |_: Payload| async {
        Err(ToolError::execution("upstream refused"))
    }))
}

fn capability_tool(tool_id: &str, capability_name: &str) -> Arc<dyn Tool> {
    let metadata = ToolMetadata::new(id(tool_id), tool_id, "1.0.0")
        .unwrap()
        .with_capabilities(vec![capability(capability_name)]);
    Arc::new(FnTool::new(metadata, |parameters: Payload| async move {
        Ok(ToolOutput::success(parameters))
    }))
}

#[tokio::test]
async fn always_failing_tool_is_observable() {
    let manager = IntegrationManager::default();
    let errors = collect(&manager, EventCategory::ErrorOccurred);
    let executed = collect(&manager, EventCategory::ToolExecuted);
    manager.register_tool(failing_tool()).unwrap();

    let err = manager
        .execute_tool(&id("broken"), Payload::new())
        .await
        .expect_err("tool always fails");
    assert_eq!(err, ToolError::execution("upstream refused"));

    let samples = manager.get_metrics(&id("broken"), &recent());
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].name(), METRIC_EXECUTION_ERROR);
    assert_eq!(samples[0].success(), Some(false));
    assert_eq!(
        samples[0].tags().get("error").and_then(DynamicValue::as_str),
        Some("tool execution failed: upstream refused")
    );

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].severity(), Severity::Error);
    assert_eq!(
        errors[0].data().get("tool_id").and_then(DynamicValue::as_str),
        Some("broken")
    );
    assert!(executed.lock().unwrap().is_empty());

    let health = manager.get_health_status();
    assert_eq!(health.service(&id("broken")), Some(HealthState::Unhealthy));
    assert_eq!(health.overall, HealthState::Unhealthy);

    let report = manager.get_performance_report(&recent());
    assert_eq!(report.summary.failed, 1);
    assert!((report.summary.error_rate - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn discovery_filters_by_capability() {
    let manager = IntegrationManager::default();
    manager.register_tool(capability_tool("finder", "search")).unwrap();
    manager.register_tool(capability_tool("indexer", "index")).unwrap();

    let found = manager.find_services(&ServiceQuery::ByCapability(capability("search")));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), &id("finder"));
    assert_eq!(found[0].endpoint(), "tool://finder");

    let by_name = manager.find_services(&ServiceQuery::ByName("INDEX".into()));
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].id(), &id("indexer"));

    assert_eq!(manager.discover_services().len(), 2);
}

#[tokio::test]
async fn repeated_executions_feed_report_and_health() {
    let manager = IntegrationManager::default();
    manager.register_tool(capability_tool("finder", "search")).unwrap();

    for n in 0..5 {
        let mut parameters = Payload::new();
        parameters.insert("page".into(), DynamicValue::from(n));
        manager.execute_tool(&id("finder"), parameters).await.unwrap();
    }

    let report = manager.get_performance_report(&recent());
    assert_eq!(report.metrics["execution_time"].count, 5);
    assert_eq!(report.metrics["execution_success"].count, 5);
    assert_eq!(report.summary.total_samples, 10);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(manager.get_health_status().overall, HealthState::Healthy);
}

async fn handle(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let response = match req.uri().path() {
        "/health" => Response::builder().body(Body::from(r#"{"status":"ok"}"#)),
        _ => Response::builder()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .body(Body::from("down")),
    };
    Ok(response.unwrap_or_else(|_| Response::new(Body::empty())))
}

fn spawn_listener() -> SocketAddr {
    let addr: SocketAddr = ([127, 0, 0, 1], 0).into();
    let make_svc = make_service_fn(|_conn| async { Ok::<_, Infallible>(service_fn(handle)) });
    let server = Server::bind(&addr).serve(make_svc);
    let local = server.local_addr();
    tokio::spawn(server);
    local
}

fn client_for(base_url: &str) -> Arc<ApiClient> {
    let config = ClientConfig::new(base_url)
        .unwrap()
        .with_timeout(Duration::from_secs(5));
    Arc::new(ApiClient::new(config))
}

fn spawn_server() -> Arc<ApiClient> {
    client_for(&format!("http://{}", spawn_listener()))
}

fn service(service_id: &str, health_path: &str) -> ServiceDescriptor {
    ServiceDescriptor::builder(id(service_id), service_id)
        .endpoint(format!("http://{service_id}.internal"))
        .health_check_endpoint(health_path)
        .build()
        .unwrap()
}

#[tokio::test]
async fn probing_records_latency_and_failures() {
    let manager = IntegrationManager::builder().client(spawn_server()).build();
    let checked = collect(&manager, EventCategory::HealthChecked);
    let errors = collect(&manager, EventCategory::ErrorOccurred);
    manager.register_service(service("catalog", "/health"));
    manager.register_service(service("billing", "/down"));

    let body = manager.probe_service(&id("catalog")).await.unwrap();
    assert_eq!(body.get("status").and_then(DynamicValue::as_str), Some("ok"));
    let samples = manager.get_metrics(&id("catalog"), &recent());
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].name(), METRIC_HEALTH_CHECK_LATENCY);
    assert_eq!(checked.lock().unwrap().len(), 1);

    let err = manager.probe_service(&id("billing")).await.unwrap_err();
    match err {
        ManagerError::Api(api) => {
            assert_eq!(api.code(), ErrorCode::Http);
            assert_eq!(api.status(), Some(503));
        }
        other => panic!("unexpected error: {other}"),
    }
    let samples = manager.get_metrics(&id("billing"), &recent());
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].name(), METRIC_HEALTH_CHECK_ERROR);

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].severity(), Severity::Warning);

    let health = manager.get_health_status();
    assert_eq!(health.service(&id("catalog")), Some(HealthState::Healthy));
    assert_eq!(health.service(&id("billing")), Some(HealthState::Unhealthy));
}

#[tokio::test]
async fn absolute_health_endpoint_is_requested_directly() {
    let target = spawn_listener();
    let manager = IntegrationManager::builder()
        .client(client_for("http://127.0.0.1:1"))
        .build();
    manager.register_service(service("ledger", &format!("http://{target}/health")));

    let body = manager.probe_service(&id("ledger")).await.unwrap();
    assert_eq!(body.get("status").and_then(DynamicValue::as_str), Some("ok"));

    let samples = manager.get_metrics(&id("ledger"), &recent());
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].name(), METRIC_HEALTH_CHECK_LATENCY);

    manager.register_service(service("archive", &format!("http://{target}/down")));
    let err = manager.probe_service(&id("archive")).await.unwrap_err();
    assert!(matches!(err, ManagerError::Api(ref api) if api.status() == Some(503)));
}
