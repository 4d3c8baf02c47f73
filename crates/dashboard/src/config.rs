//! Dashboard configuration

use anyhow::{Context, Result};
use serde::Deserialize;

/// Dashboard configuration, read from `DASHBOARD_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// HTTP port for the API and the UI bundle
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Directory holding the prebuilt front-end
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Set to false to skip metrics.k8s.io even if the cluster serves it
    #[serde(default = "default_metrics_api_enabled")]
    pub metrics_api_enabled: bool,

    /// Name reported in structured log events
    #[serde(default = "default_instance_name")]
    pub instance_name: String,
}

fn default_listen_port() -> u16 {
    8080
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_metrics_api_enabled() -> bool {
    true
}

fn default_instance_name() -> String {
    std::env::var("POD_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| "cluster-dashboard".to_string())
}

impl DashboardConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix("DASHBOARD").try_parsing(true))
    }

    fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(source)
            .build()
            .context("Failed to read dashboard configuration")?
            .try_deserialize()
            .context("Invalid dashboard configuration")
    }
}
