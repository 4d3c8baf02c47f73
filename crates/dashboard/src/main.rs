//! Cluster dashboard - read-only cluster observability backend
//!
//! Serves a JSON snapshot of nodes, pods, deployments and node usage at
//! `/api/metrics`, next to the prebuilt front-end bundle.

use anyhow::{Context, Result};
use dashboard_lib::{
    api,
    health::{components, HealthRegistry},
    observability::{DashboardMetrics, StructuredLogger},
    source::{detect_metrics_capability, KubeClusterSource},
    SnapshotAggregator,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

const DASHBOARD_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting cluster-dashboard");

    let config = config::DashboardConfig::load()?;
    info!(
        listen_port = config.listen_port,
        static_dir = %config.static_dir,
        "Dashboard configured"
    );

    // No usable credentials means nothing to serve
    let client = kube::Client::try_default()
        .await
        .context("Failed to build Kubernetes client from ambient credentials")?;

    let health_registry = HealthRegistry::new();
    health_registry.register(components::CLUSTER_API).await;
    health_registry.register(components::METRICS_API).await;

    let metrics = DashboardMetrics::new();
    let logger = StructuredLogger::new(config.instance_name.clone());

    let capability = detect_metrics_capability(&client, config.metrics_api_enabled).await;
    metrics.set_metrics_api_available(capability.is_available());
    if !capability.is_available() {
        health_registry
            .set_degraded(components::METRICS_API, "metrics.k8s.io not available")
            .await;
    }

    let aggregator = SnapshotAggregator::new(
        Arc::new(KubeClusterSource::new(client)),
        capability.clone(),
        health_registry.clone(),
        metrics.clone(),
        logger.clone(),
    );
    let app_state = Arc::new(api::AppState::new(
        aggregator,
        health_registry.clone(),
        metrics,
    ));

    health_registry.set_ready(true).await;
    logger.log_startup(
        DASHBOARD_VERSION,
        config.listen_port,
        capability.is_available(),
    );

    let shutdown_logger = logger.clone();
    api::serve(config.listen_port, app_state, &config.static_dir, async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => shutdown_logger.log_shutdown("SIGINT received"),
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        }
    })
    .await
    .context("HTTP server failed")?;

    info!("Shut down");
    Ok(())
}
