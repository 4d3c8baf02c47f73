//! Integration tests for the dashboard HTTP endpoints

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use dashboard_lib::{
    create_router,
    health::components,
    metrics_api,
    AppState, ClusterSource, DashboardMetrics, HealthRegistry, MetricsCapability, MetricsSource,
    SnapshotAggregator, SourceError, StructuredLogger, UpstreamKind,
};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{Node, NodeCondition, NodeStatus, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn failure(kind: UpstreamKind) -> SourceError {
    SourceError::Unavailable {
        kind,
        reason: "forbidden".to_string(),
    }
}

/// Each `None` list makes the corresponding query fail
#[derive(Clone, Default)]
struct StaticCluster {
    nodes: Option<Vec<Node>>,
    pods: Option<Vec<Pod>>,
    deployments: Option<Vec<Deployment>>,
}

#[async_trait]
impl ClusterSource for StaticCluster {
    async fn list_nodes(&self) -> Result<Vec<Node>, SourceError> {
        self.nodes.clone().ok_or_else(|| failure(UpstreamKind::Nodes))
    }

    async fn list_pods(&self) -> Result<Vec<Pod>, SourceError> {
        self.pods.clone().ok_or_else(|| failure(UpstreamKind::Pods))
    }

    async fn list_deployments(&self) -> Result<Vec<Deployment>, SourceError> {
        self.deployments
            .clone()
            .ok_or_else(|| failure(UpstreamKind::Deployments))
    }
}

struct StaticMetrics {
    items: Option<Vec<metrics_api::NodeMetrics>>,
}

#[async_trait]
impl MetricsSource for StaticMetrics {
    async fn list_node_metrics(&self) -> Result<Vec<metrics_api::NodeMetrics>, SourceError> {
        self.items
            .clone()
            .ok_or_else(|| failure(UpstreamKind::NodeMetrics))
    }
}

fn node(name: &str, labels: &[&str], ready: &str) -> Node {
    let capacity: BTreeMap<String, Quantity> = [
        ("cpu".to_string(), Quantity("4".to_string())),
        ("memory".to_string(), Quantity("16Gi".to_string())),
    ]
    .into_iter()
    .collect();

    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(
                labels
                    .iter()
                    .map(|l| (l.to_string(), String::new()))
                    .collect(),
            ),
            ..Default::default()
        },
        spec: None,
        status: Some(NodeStatus {
            capacity: Some(capacity),
            conditions: Some(vec![NodeCondition {
                type_: "Ready".to_string(),
                status: ready.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
    }
}

fn two_nodes() -> Vec<Node> {
    vec![
        node(
            "cp-1",
            &[
                "node-role.kubernetes.io/control-plane",
                "node-role.kubernetes.io/master",
            ],
            "True",
        ),
        node("worker-1", &[], "Unknown"),
    ]
}

struct TestApp {
    router: Router,
    health: HealthRegistry,
    _static_dir: TempDir,
}

async fn setup_test_app(cluster: StaticCluster, metrics: MetricsCapability) -> TestApp {
    let static_dir = tempfile::tempdir().unwrap();
    tokio::fs::write(
        static_dir.path().join("index.html"),
        "<html>dashboard</html>",
    )
    .await
    .unwrap();
    tokio::fs::write(static_dir.path().join("app.js"), "console.log('ui');")
        .await
        .unwrap();

    let health = HealthRegistry::new();
    health.register(components::CLUSTER_API).await;
    health.register(components::METRICS_API).await;

    let instruments = DashboardMetrics::new();
    let aggregator = SnapshotAggregator::new(
        Arc::new(cluster),
        metrics,
        health.clone(),
        instruments.clone(),
        StructuredLogger::new("test"),
    );
    let state = Arc::new(AppState::new(aggregator, health.clone(), instruments));

    TestApp {
        router: create_router(state, static_dir.path()),
        health,
        _static_dir: static_dir,
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, content_type, body.to_vec())
}

#[tokio::test]
async fn test_partial_failure_returns_ok_without_node_metrics() {
    let cluster = StaticCluster {
        nodes: Some(two_nodes()),
        pods: None,
        deployments: Some(Vec::new()),
    };
    let app = setup_test_app(cluster, MetricsCapability::Absent).await;

    let (status, content_type, body) = get(&app.router, "/api/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));

    let snapshot: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        snapshot,
        json!({
            "nodes": [
                {
                    "name": "cp-1",
                    "roles": ["control-plane"],
                    "ready": true,
                    "cpuCapacity": "4",
                    "memCapacity": "16Gi"
                },
                {
                    "name": "worker-1",
                    "roles": ["worker"],
                    "ready": false,
                    "cpuCapacity": "4",
                    "memCapacity": "16Gi"
                }
            ],
            "pods": [],
            "deployments": []
        })
    );
    assert!(snapshot.get("nodeMetrics").is_none());
}

#[tokio::test]
async fn test_total_failure_still_returns_ok() {
    let metrics = MetricsCapability::Available(Arc::new(StaticMetrics { items: None }));
    let app = setup_test_app(StaticCluster::default(), metrics).await;

    let (status, _, body) = get(&app.router, "/api/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        r#"{"nodes":[],"pods":[],"deployments":[]}"#
    );

    let health = app.health.health().await;
    assert_eq!(health.status, dashboard_lib::ComponentStatus::Degraded);
}

#[tokio::test]
async fn test_metrics_present_includes_node_metrics() {
    let usage = metrics_api::NodeMetrics {
        metadata: ObjectMeta {
            name: Some("worker-1".to_string()),
            ..Default::default()
        },
        usage: metrics_api::NodeMetricsUsage {
            cpu: Some(Quantity("250m".to_string())),
            memory: Some(Quantity("1Gi".to_string())),
        },
        ..Default::default()
    };
    let metrics = MetricsCapability::Available(Arc::new(StaticMetrics {
        items: Some(vec![usage]),
    }));
    let cluster = StaticCluster {
        nodes: Some(Vec::new()),
        pods: Some(Vec::new()),
        deployments: Some(vec![Deployment {
            metadata: ObjectMeta {
                name: Some("api".to_string()),
                namespace: Some("shop".to_string()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec::default()),
            status: None,
        }]),
    };
    let app = setup_test_app(cluster, metrics).await;

    let (status, _, body) = get(&app.router, "/api/metrics").await;
    assert_eq!(status, StatusCode::OK);

    let snapshot: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        snapshot["nodeMetrics"],
        json!([{ "name": "worker-1", "cpu": "250m", "memory": "1Gi" }])
    );
    assert_eq!(
        snapshot["deployments"],
        json!([{ "name": "api", "namespace": "shop", "desired": 0, "ready": 0 }])
    );
}

#[tokio::test]
async fn test_repeated_requests_are_byte_identical() {
    let cluster = StaticCluster {
        nodes: Some(two_nodes()),
        pods: Some(vec![Pod::default()]),
        deployments: Some(Vec::new()),
    };
    let app = setup_test_app(cluster, MetricsCapability::Absent).await;

    let (_, _, first) = get(&app.router, "/api/metrics").await;
    let (_, _, second) = get(&app.router, "/api/metrics").await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_healthz_ok_while_degraded() {
    let app = setup_test_app(StaticCluster::default(), MetricsCapability::Absent).await;
    get(&app.router, "/api/metrics").await;

    let (status, _, body) = get(&app.router, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "degraded");
    assert!(health["components"]["cluster_api"].is_object());
}

#[tokio::test]
async fn test_readyz_reflects_startup() {
    let app = setup_test_app(StaticCluster::default(), MetricsCapability::Absent).await;

    let (status, _, _) = get(&app.router, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    app.health.set_ready(true).await;
    let (status, _, body) = get(&app.router, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    let readiness: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_prometheus_endpoint_exposes_query_metrics() {
    let app = setup_test_app(StaticCluster::default(), MetricsCapability::Absent).await;
    get(&app.router, "/api/metrics").await;

    let (status, content_type, body) = get(&app.router, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().contains("text/plain"));
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("cluster_dashboard_upstream_query_duration_seconds_bucket"));
    assert!(text.contains("cluster_dashboard_upstream_query_errors_total"));
    assert!(text.contains("cluster_dashboard_snapshots_served_total"));
}

#[tokio::test]
async fn test_static_assets_are_served() {
    let app = setup_test_app(StaticCluster::default(), MetricsCapability::Absent).await;

    let (status, _, body) = get(&app.router, "/app.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"console.log('ui');");

    let (status, content_type, body) = get(&app.router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    assert_eq!(body, b"<html>dashboard</html>");
}

#[tokio::test]
async fn test_unknown_paths_fall_back_to_index() {
    let app = setup_test_app(StaticCluster::default(), MetricsCapability::Absent).await;

    let (status, _, body) = get(&app.router, "/nodes/worker-1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"<html>dashboard</html>");
}
