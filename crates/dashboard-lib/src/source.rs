//! Upstream readers for the control plane and the metrics aggregation API
//!
//! Each list call is a single unfiltered, unpaginated request. Failures are
//! returned to the caller untouched; deciding what a failure means for the
//! response is the aggregator's job.

use crate::metrics_api::{self, NodeMetrics};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Node, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIGroupList;
use kube::api::{Api, ListParams};
use kube::Client;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// The four upstream queries behind one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamKind {
    Nodes,
    Pods,
    Deployments,
    NodeMetrics,
}

impl UpstreamKind {
    pub const ALL: [UpstreamKind; 4] = [
        UpstreamKind::Nodes,
        UpstreamKind::Pods,
        UpstreamKind::Deployments,
        UpstreamKind::NodeMetrics,
    ];

    /// Stable label used in logs, metrics and health reports
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamKind::Nodes => "nodes",
            UpstreamKind::Pods => "pods",
            UpstreamKind::Deployments => "deployments",
            UpstreamKind::NodeMetrics => "node_metrics",
        }
    }
}

impl fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("listing {kind} failed: {source}")]
    Kube {
        kind: UpstreamKind,
        #[source]
        source: kube::Error,
    },

    /// Raised by sources that are not backed by a `kube::Client`, such as
    /// in-memory fakes
    #[error("{kind} unavailable: {reason}")]
    Unavailable { kind: UpstreamKind, reason: String },
}

impl SourceError {
    pub fn kind(&self) -> UpstreamKind {
        match self {
            SourceError::Kube { kind, .. } | SourceError::Unavailable { kind, .. } => *kind,
        }
    }
}

/// Read access to the orchestration control plane
#[async_trait]
pub trait ClusterSource: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<Node>, SourceError>;

    /// Pods across all namespaces
    async fn list_pods(&self) -> Result<Vec<Pod>, SourceError>;

    /// Deployments across all namespaces
    async fn list_deployments(&self) -> Result<Vec<Deployment>, SourceError>;
}

/// Read access to the metrics aggregation API
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn list_node_metrics(&self) -> Result<Vec<NodeMetrics>, SourceError>;
}

/// Whether the metrics aggregation API can be queried at all
///
/// Decided once at startup and never re-probed.
#[derive(Clone)]
pub enum MetricsCapability {
    Available(Arc<dyn MetricsSource>),
    Absent,
}

impl MetricsCapability {
    pub fn is_available(&self) -> bool {
        matches!(self, MetricsCapability::Available(_))
    }
}

impl fmt::Debug for MetricsCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsCapability::Available(_) => f.write_str("Available"),
            MetricsCapability::Absent => f.write_str("Absent"),
        }
    }
}

async fn list_all<K>(client: &Client, kind: UpstreamKind) -> Result<Vec<K>, SourceError>
where
    K: kube::Resource<DynamicType = ()> + Clone + DeserializeOwned + fmt::Debug,
{
    let api: Api<K> = Api::all(client.clone());
    api.list(&ListParams::default())
        .await
        .map(|list| list.items)
        .map_err(|source| SourceError::Kube { kind, source })
}

/// Control plane reader backed by a `kube::Client`
#[derive(Clone)]
pub struct KubeClusterSource {
    client: Client,
}

impl KubeClusterSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterSource for KubeClusterSource {
    async fn list_nodes(&self) -> Result<Vec<Node>, SourceError> {
        list_all(&self.client, UpstreamKind::Nodes).await
    }

    async fn list_pods(&self) -> Result<Vec<Pod>, SourceError> {
        list_all(&self.client, UpstreamKind::Pods).await
    }

    async fn list_deployments(&self) -> Result<Vec<Deployment>, SourceError> {
        list_all(&self.client, UpstreamKind::Deployments).await
    }
}

/// metrics.k8s.io reader backed by a `kube::Client`
#[derive(Clone)]
pub struct KubeMetricsSource {
    client: Client,
}

impl KubeMetricsSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MetricsSource for KubeMetricsSource {
    async fn list_node_metrics(&self) -> Result<Vec<NodeMetrics>, SourceError> {
        list_all(&self.client, UpstreamKind::NodeMetrics).await
    }
}

/// Probe API discovery once for `metrics.k8s.io/v1beta1`
///
/// A discovery failure disables the capability rather than aborting startup.
pub async fn detect_metrics_capability(client: &Client, enabled: bool) -> MetricsCapability {
    if !enabled {
        info!("Metrics API disabled by configuration");
        return MetricsCapability::Absent;
    }

    match client.list_api_groups().await {
        Ok(groups) => {
            if serves_metrics_api(&groups) {
                info!(
                    group = metrics_api::GROUP,
                    version = metrics_api::VERSION,
                    "Metrics API available"
                );
                MetricsCapability::Available(Arc::new(KubeMetricsSource::new(client.clone())))
            } else {
                warn!(
                    group = metrics_api::GROUP,
                    "Metrics API not served by this cluster, node usage disabled"
                );
                MetricsCapability::Absent
            }
        }
        Err(err) => {
            warn!(error = %err, "API discovery failed, node usage disabled");
            MetricsCapability::Absent
        }
    }
}

/// True if discovery lists `metrics.k8s.io` with the `v1beta1` version
pub fn serves_metrics_api(groups: &APIGroupList) -> bool {
    groups.groups.iter().any(|group| {
        group.name == metrics_api::GROUP
            && group
                .versions
                .iter()
                .any(|v| v.version == metrics_api::VERSION)
    })
}
