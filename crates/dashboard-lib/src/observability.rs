//! Observability for the dashboard backend
//!
//! Provides:
//! - Prometheus metrics (upstream query latency and errors, snapshots served)
//! - Structured JSON logging with tracing

use crate::source::UpstreamKind;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for control plane round trips (in seconds)
const QUERY_LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

static GLOBAL_METRICS: OnceLock<DashboardMetricsInner> = OnceLock::new();

struct DashboardMetricsInner {
    upstream_query_duration_seconds: HistogramVec,
    upstream_query_errors: IntCounterVec,
    snapshots_served: IntCounter,
    metrics_api_available: IntGauge,
}

impl DashboardMetricsInner {
    fn new() -> Self {
        Self {
            upstream_query_duration_seconds: register_histogram_vec!(
                "cluster_dashboard_upstream_query_duration_seconds",
                "Time spent on one upstream list query",
                &["resource"],
                QUERY_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register upstream_query_duration_seconds"),

            upstream_query_errors: register_int_counter_vec!(
                "cluster_dashboard_upstream_query_errors_total",
                "Upstream list queries that failed and were answered with empty data",
                &["resource"]
            )
            .expect("Failed to register upstream_query_errors_total"),

            snapshots_served: register_int_counter!(
                "cluster_dashboard_snapshots_served_total",
                "Snapshots returned by the /api/metrics endpoint"
            )
            .expect("Failed to register snapshots_served_total"),

            metrics_api_available: register_int_gauge!(
                "cluster_dashboard_metrics_api_available",
                "1 if the metrics aggregation API was detected at startup"
            )
            .expect("Failed to register metrics_api_available"),
        }
    }
}

/// Handle to the process-wide dashboard metrics
///
/// Clones share the same underlying collectors.
#[derive(Clone)]
pub struct DashboardMetrics {
    _private: (),
}

impl Default for DashboardMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(DashboardMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &DashboardMetricsInner {
        GLOBAL_METRICS.get_or_init(DashboardMetricsInner::new)
    }

    pub fn observe_query_latency(&self, kind: UpstreamKind, duration_secs: f64) {
        self.inner()
            .upstream_query_duration_seconds
            .with_label_values(&[kind.as_str()])
            .observe(duration_secs);
    }

    pub fn inc_query_errors(&self, kind: UpstreamKind) {
        self.inner()
            .upstream_query_errors
            .with_label_values(&[kind.as_str()])
            .inc();
    }

    pub fn inc_snapshots_served(&self) {
        self.inner().snapshots_served.inc();
    }

    pub fn set_metrics_api_available(&self, available: bool) {
        self.inner()
            .metrics_api_available
            .set(i64::from(available));
    }
}

/// Structured logger for process lifecycle events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, listen_port: u16, metrics_api: bool) {
        info!(
            event = "dashboard_started",
            instance = %self.instance,
            version = %version,
            listen_port = listen_port,
            metrics_api = metrics_api,
            "Cluster dashboard started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "dashboard_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Cluster dashboard shutting down"
        );
    }

    /// An upstream list query failed and its collection was left empty
    pub fn log_query_failure(&self, kind: UpstreamKind, error: &str) {
        warn!(
            event = "upstream_query_failed",
            instance = %self.instance,
            resource = %kind,
            error = %error,
            "Upstream query failed, serving empty collection"
        );
    }
}
