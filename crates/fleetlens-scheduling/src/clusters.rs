//! Per-cluster resource view for the dashboard.

use fleetlens_state::{ClusterRecord, NodeSummary, Taint};
use serde::{Deserialize, Serialize};

const REGION_LABELS: [&str; 2] = ["region", "cluster.karmada.io/region"];
const ZONE_LABELS: [&str; 2] = ["zone", "cluster.karmada.io/zone"];
const CAPABILITY_LABELS: [&str; 3] = ["gpu", "ssd-storage", "high-memory"];
const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadLevel {
    Low,
    Medium,
    High,
}

impl LoadLevel {
    /// From the mean of CPU and memory allocation percentages.
    pub fn from_fractions(cpu: f64, memory: f64) -> Self {
        let load = (cpu + memory) / 2.0;
        if load < 30.0 {
            Self::Low
        } else if load < 70.0 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUsage {
    pub cpu_capacity: u64,
    pub cpu_allocated_percent: f64,
    pub memory_capacity: u64,
    pub memory_allocated_percent: f64,
    pub pod_capacity: u64,
    pub pods_allocated: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResourceView {
    pub name: String,
    pub ready: bool,
    pub kubernetes_version: String,
    pub region: String,
    pub zone: String,
    pub load_level: LoadLevel,
    pub capabilities: Vec<String>,
    pub taints: Vec<Taint>,
    pub resources: ResourceUsage,
    pub nodes: NodeSummary,
}

fn first_label(cluster: &ClusterRecord, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| cluster.labels.get(*k))
        .cloned()
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn capabilities(cluster: &ClusterRecord) -> Vec<String> {
    let found: Vec<String> = CAPABILITY_LABELS
        .iter()
        .filter(|label| cluster.labels.contains_key(**label))
        .map(|label| label.to_string())
        .collect();
    if found.is_empty() {
        vec!["basic-compute".to_string()]
    } else {
        found
    }
}

impl From<&ClusterRecord> for ClusterResourceView {
    fn from(cluster: &ClusterRecord) -> Self {
        let r = &cluster.resources;
        Self {
            name: cluster.name.clone(),
            ready: cluster.ready,
            kubernetes_version: cluster.kubernetes_version.clone(),
            region: first_label(cluster, &REGION_LABELS),
            zone: first_label(cluster, &ZONE_LABELS),
            load_level: LoadLevel::from_fractions(r.cpu_fraction, r.memory_fraction),
            capabilities: capabilities(cluster),
            taints: cluster.taints.clone(),
            resources: ResourceUsage {
                cpu_capacity: r.cpu_capacity,
                cpu_allocated_percent: r.cpu_fraction,
                memory_capacity: r.memory_capacity,
                memory_allocated_percent: r.memory_fraction,
                pod_capacity: r.pod_capacity,
                pods_allocated: r.allocated_pods,
            },
            nodes: cluster.node_summary.clone(),
        }
    }
}

pub fn cluster_views(clusters: &[ClusterRecord]) -> Vec<ClusterResourceView> {
    clusters.iter().map(ClusterResourceView::from).collect()
}
