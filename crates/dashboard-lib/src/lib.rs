//! Cluster dashboard backend library
//!
//! This crate provides:
//! - Upstream readers for the control plane and metrics.k8s.io
//! - Translators from raw cluster objects to reporting records
//! - Snapshot aggregation tolerant of partial upstream failure
//! - The HTTP router, health checks and observability

pub mod api;
pub mod health;
pub mod metrics_api;
pub mod models;
pub mod observability;
pub mod snapshot;
pub mod source;
pub mod translate;

pub use api::{create_router, AppState};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{DashboardMetrics, StructuredLogger};
pub use snapshot::SnapshotAggregator;
pub use source::{
    ClusterSource, KubeClusterSource, KubeMetricsSource, MetricsCapability, MetricsSource,
    SourceError, UpstreamKind,
};
