//! fleetlens.toml configuration parser.
//!
//! Every section is optional; missing values fall back to defaults so an
//! empty file is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid duration for {field}: {value}")]
    InvalidDuration { field: &'static str, value: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LensConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Member clusters reachable for node/pod probing.
    #[serde(default)]
    pub clusters: Vec<ClusterEndpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Path of the redb snapshot database.
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Bound applied to every member-cluster call (e.g. "5s", "500ms").
    #[serde(default = "default_probe_timeout")]
    pub timeout: String,
    /// Clusters probed in parallel.
    #[serde(default = "default_cluster_concurrency")]
    pub cluster_concurrency: usize,
    /// Nodes probed in parallel within one cluster.
    #[serde(default = "default_node_concurrency")]
    pub node_concurrency: usize,
    /// Require matched pods to live in the workload's namespace.
    #[serde(default)]
    pub strict_namespace: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: default_probe_timeout(),
            cluster_concurrency: default_cluster_concurrency(),
            node_concurrency: default_node_concurrency(),
            strict_namespace: false,
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.timeout).ok_or_else(|| ConfigError::InvalidDuration {
            field: "probe.timeout",
            value: self.timeout.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Allocations above this per-cluster count are flagged.
    #[serde(default = "default_max_replicas_per_cluster")]
    pub max_replicas_per_cluster: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_replicas_per_cluster: default_max_replicas_per_cluster(),
        }
    }
}

/// How to reach one member cluster's Kubernetes-style API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterEndpoint {
    pub name: String,
    /// `host:port` of the API (or of a proxy in front of it).
    pub endpoint: String,
    /// Path prepended to every request, e.g. the control plane's
    /// per-cluster proxy path.
    #[serde(default)]
    pub path_prefix: String,
    /// Optional bearer token.
    #[serde(default)]
    pub token: Option<String>,
}

impl LensConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: LensConfig = toml::from_str(content)?;
        // Surface bad durations at load time rather than on first probe.
        config.probe.timeout()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Parse a duration string like "5s", "500ms", "1m". A bare number is seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok()?.checked_mul(60).map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_state_path() -> PathBuf {
    PathBuf::from("/var/lib/fleetlens/fleetlens.redb")
}

fn default_probe_timeout() -> String {
    "5s".to_string()
}

fn default_cluster_concurrency() -> usize {
    8
}

fn default_node_concurrency() -> usize {
    16
}

fn default_max_replicas_per_cluster() -> u32 {
    100
}
