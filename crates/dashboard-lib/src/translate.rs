//! Shape translators from raw cluster objects to reporting records
//!
//! Translators never fail: every absent upstream field maps to a fixed
//! default (`""` for strings, `"0"` for quantities, `0` for counters).

use crate::metrics_api;
use crate::models::{DeploymentInfo, NodeInfo, NodeMetrics, PodInfo};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Node, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

pub const ROLE_CONTROL_PLANE: &str = "control-plane";
pub const ROLE_WORKER: &str = "worker";

/// Recognized role labels, scanned in this order
const ROLE_LABELS: &[(&str, &str)] = &[
    ("node-role.kubernetes.io/control-plane", ROLE_CONTROL_PLANE),
    ("node-role.kubernetes.io/master", ROLE_CONTROL_PLANE),
    ("node-role.kubernetes.io/worker", ROLE_WORKER),
];

const CONDITION_READY: &str = "Ready";
const STATUS_TRUE: &str = "True";

/// Rendering of a quantity the upstream object did not report
const ZERO_QUANTITY: &str = "0";

pub fn node_info(node: &Node) -> NodeInfo {
    let status = node.status.as_ref();
    let capacity = status.and_then(|s| s.capacity.as_ref());

    let ready = status
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| {
            conditions
                .iter()
                .rev()
                .find(|c| c.type_ == CONDITION_READY)
        })
        .map(|c| c.status == STATUS_TRUE)
        .unwrap_or(false);

    NodeInfo {
        name: node.metadata.name.clone().unwrap_or_default(),
        roles: node_roles(node.metadata.labels.as_ref()),
        ready,
        cpu_capacity: capacity_of(capacity, "cpu"),
        mem_capacity: capacity_of(capacity, "memory"),
    }
}

/// Derive normalized roles from node labels, defaulting to `worker`
pub fn node_roles(labels: Option<&BTreeMap<String, String>>) -> Vec<String> {
    let mut roles: Vec<String> = Vec::new();

    if let Some(labels) = labels {
        for (key, role) in ROLE_LABELS {
            if labels.contains_key(*key) && !roles.iter().any(|r| r == role) {
                roles.push(role.to_string());
            }
        }
    }

    if roles.is_empty() {
        roles.push(ROLE_WORKER.to_string());
    }
    roles
}

pub fn pod_info(pod: &Pod) -> PodInfo {
    let status = pod.status.as_ref();

    let restarts = status
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| statuses.iter().map(|cs| cs.restart_count).sum())
        .unwrap_or(0);

    PodInfo {
        name: pod.metadata.name.clone().unwrap_or_default(),
        namespace: pod.metadata.namespace.clone().unwrap_or_default(),
        phase: status.and_then(|s| s.phase.clone()).unwrap_or_default(),
        restarts,
        node: pod
            .spec
            .as_ref()
            .and_then(|s| s.node_name.clone())
            .unwrap_or_default(),
    }
}

/// Unset and explicitly-zero desired replicas both become 0
pub fn deployment_info(deployment: &Deployment) -> DeploymentInfo {
    DeploymentInfo {
        name: deployment.metadata.name.clone().unwrap_or_default(),
        namespace: deployment.metadata.namespace.clone().unwrap_or_default(),
        desired: deployment
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .unwrap_or(0),
        ready: deployment
            .status
            .as_ref()
            .and_then(|s| s.ready_replicas)
            .unwrap_or(0),
    }
}

pub fn node_metrics(metrics: &metrics_api::NodeMetrics) -> NodeMetrics {
    NodeMetrics {
        name: metrics.metadata.name.clone().unwrap_or_default(),
        cpu: quantity_string(metrics.usage.cpu.as_ref()),
        memory: quantity_string(metrics.usage.memory.as_ref()),
    }
}

fn capacity_of(capacity: Option<&BTreeMap<String, Quantity>>, resource: &str) -> String {
    quantity_string(capacity.and_then(|c| c.get(resource)))
}

// Upstream quantity strings are already canonical and pass through verbatim.
fn quantity_string(quantity: Option<&Quantity>) -> String {
    quantity
        .map(|q| q.0.clone())
        .unwrap_or_else(|| ZERO_QUANTITY.to_string())
}
