//! Reporting records served to the dashboard front-end
//!
//! Every record is built fresh per request from exactly one upstream object
//! and discarded once the snapshot has been serialized.

use serde::{Deserialize, Serialize};

/// A cluster node as shown on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub name: String,
    /// Normalized roles, `control-plane` always before `worker`
    pub roles: Vec<String>,
    pub ready: bool,
    #[serde(rename = "cpuCapacity")]
    pub cpu_capacity: String,
    #[serde(rename = "memCapacity")]
    pub mem_capacity: String,
}

/// Point-in-time resource usage of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub name: String,
    pub cpu: String,
    pub memory: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodInfo {
    pub name: String,
    pub namespace: String,
    /// Upstream lifecycle phase, copied unmodified
    pub phase: String,
    /// Sum of restart counters over all container statuses
    pub restarts: i32,
    pub node: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentInfo {
    pub name: String,
    pub namespace: String,
    pub desired: i32,
    pub ready: i32,
}

/// The single payload of `GET /api/metrics`
///
/// List fields are always present; `node_metrics` is omitted entirely when
/// the metrics API is absent or its query failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub nodes: Vec<NodeInfo>,
    pub pods: Vec<PodInfo>,
    pub deployments: Vec<DeploymentInfo>,
    #[serde(rename = "nodeMetrics", skip_serializing_if = "Option::is_none", default)]
    pub node_metrics: Option<Vec<NodeMetrics>>,
}
