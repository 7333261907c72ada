//! Registers two tools, runs them through the integration manager, and prints
//! the resulting health status and performance report.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use service_integration::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(about = "Exercise the service integration layer end to end")]
struct Args {
    /// JSON configuration file; falls back to INTEGRATION_* environment variables.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of calls made to each tool.
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Every n-th call to the flaky tool fails.
    #[arg(long, default_value_t = 3)]
    fail_every: usize,

    /// Health-check path of an external service to probe (requires a base URL).
    #[arg(long, env = "INTEGRATION_HEALTH_PATH")]
    health_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => IntegrationConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => IntegrationConfig::from_env().context("reading environment")?,
    };
    let manager = IntegrationManager::from_config(&config)?;

    manager.subscribe_to_events(EventCategory::ErrorOccurred, |event: &Event| -> HandlerResult {
        warn!(severity = %event.severity(), data = ?event.data(), "error event");
        Ok(())
    });

    manager.register_tool(word_count()?)?;
    manager.register_tool(flaky(args.fail_every.max(1))?)?;

    let word_count_id = ServiceId::new("word-count")?;
    let flaky_id = ServiceId::new("flaky")?;
    for n in 0..args.iterations {
        let mut parameters = Payload::new();
        parameters.insert(
            "text".into(),
            DynamicValue::from(format!("call number {n} of the demo")),
        );
        let output = manager
            .execute_tool(&word_count_id, parameters.clone())
            .await?;
        info!(call = n, data = ?output.data, "word-count finished");

        if let Err(err) = manager.execute_tool(&flaky_id, parameters).await {
            info!(call = n, %err, "flaky failed as expected");
        }
    }

    if let Some(path) = &args.health_path {
        let descriptor = ServiceDescriptor::builder(ServiceId::new("upstream")?, "Upstream API")
            .endpoint(config.base_url.clone().unwrap_or_default())
            .health_check_endpoint(path.clone())
            .build()?;
        manager.register_service(descriptor);
        match manager.probe_service(&ServiceId::new("upstream")?).await {
            Ok(body) => info!(?body, "upstream healthy"),
            Err(err) => warn!(%err, "upstream probe failed"),
        }
    }

    let search = manager.find_services(&ServiceQuery::ByCapability(CapabilityId::new("search")?));
    info!(count = search.len(), "services advertising search");

    let range = TimeRange::trailing(chrono::Duration::minutes(5), chrono::Utc::now());
    println!(
        "{}",
        serde_json::to_string_pretty(&manager.get_health_status())?
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&manager.get_performance_report(&range))?
    );

    Ok(())
}

fn word_count() -> Result<Arc<dyn Tool>> {
    let metadata = ToolMetadata::new(ServiceId::new("word-count")?, "Word count", "1.0.0")?
        .with_description("Counts whitespace-separated words")
        .with_capabilities(vec![CapabilityId::new("search")?]);
    Ok(Arc::new(FnTool::new(metadata, |parameters: Payload| async move {
        let text = parameters
            .get("text")
            .and_then(DynamicValue::as_str)
            .ok_or_else(|| ToolError::execution("missing `text` parameter"))?;
        let mut data = Payload::new();
        data.insert("words".into(), DynamicValue::from(text.split_whitespace().count() as u64));
        Ok(ToolOutput::success(data))
    })))
}

fn flaky(fail_every: usize) -> Result<Arc<dyn Tool>> {
    let metadata = ToolMetadata::new(ServiceId::new("flaky")?, "Flaky", "0.1.0")?
        .with_capabilities(vec![CapabilityId::new("index")?]);
    let calls = Arc::new(AtomicUsize::new(0));
    Ok(Arc::new(FnTool::new(metadata, move |_: Payload| {
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if call % fail_every == 0 {
                Err(ToolError::execution(format!("call {call} rejected")))
            } else {
                Ok(ToolOutput::success(DynamicValue::from(call as u64)))
            }
        }
    })))
}
