//! Snapshot aggregation for one `/api/metrics` request
//!
//! The four upstream queries run one after another. Each one either
//! contributes its translated collection or nothing; a failure never stops
//! the remaining queries and never turns into an error for the caller.

use crate::health::{components, HealthRegistry};
use crate::models::Snapshot;
use crate::observability::{DashboardMetrics, StructuredLogger};
use crate::source::{ClusterSource, MetricsCapability, SourceError, UpstreamKind};
use crate::translate;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Builds a fresh [`Snapshot`] per request from the configured sources
#[derive(Clone)]
pub struct SnapshotAggregator {
    cluster: Arc<dyn ClusterSource>,
    metrics: MetricsCapability,
    health: HealthRegistry,
    instruments: DashboardMetrics,
    logger: StructuredLogger,
}

impl SnapshotAggregator {
    pub fn new(
        cluster: Arc<dyn ClusterSource>,
        metrics: MetricsCapability,
        health: HealthRegistry,
        instruments: DashboardMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            cluster,
            metrics,
            health,
            instruments,
            logger,
        }
    }

    pub fn metrics_capability(&self) -> &MetricsCapability {
        &self.metrics
    }

    /// Query every upstream once and assemble whatever succeeded
    pub async fn collect(&self) -> Snapshot {
        let nodes = self.run(UpstreamKind::Nodes, self.cluster.list_nodes()).await;
        let pods = self.run(UpstreamKind::Pods, self.cluster.list_pods()).await;
        let deployments = self
            .run(UpstreamKind::Deployments, self.cluster.list_deployments())
            .await;

        let cluster_errors: Vec<String> = [
            nodes.as_ref().err(),
            pods.as_ref().err(),
            deployments.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .map(ToString::to_string)
        .collect();
        self.health
            .record_query(
                components::CLUSTER_API,
                (!cluster_errors.is_empty())
                    .then(|| cluster_errors.join("; "))
                    .as_deref(),
            )
            .await;

        let node_metrics = match &self.metrics {
            MetricsCapability::Available(source) => {
                let result = self
                    .run(UpstreamKind::NodeMetrics, source.list_node_metrics())
                    .await;
                let error = result.as_ref().err().map(ToString::to_string);
                self.health
                    .record_query(components::METRICS_API, error.as_deref())
                    .await;
                result
                    .ok()
                    .map(|items| items.iter().map(translate::node_metrics).collect())
            }
            MetricsCapability::Absent => None,
        };

        Snapshot {
            nodes: nodes
                .map(|items| items.iter().map(translate::node_info).collect())
                .unwrap_or_default(),
            pods: pods
                .map(|items| items.iter().map(translate::pod_info).collect())
                .unwrap_or_default(),
            deployments: deployments
                .map(|items| items.iter().map(translate::deployment_info).collect())
                .unwrap_or_default(),
            node_metrics,
        }
    }

    async fn run<T, F>(&self, kind: UpstreamKind, query: F) -> Result<Vec<T>, SourceError>
    where
        F: Future<Output = Result<Vec<T>, SourceError>>,
    {
        let started = Instant::now();
        let result = query.await;
        self.instruments
            .observe_query_latency(kind, started.elapsed().as_secs_f64());

        if let Err(err) = &result {
            self.instruments.inc_query_errors(kind);
            self.logger.log_query_failure(kind, &err.to_string());
        }
        result
    }
}
