//! Bounded, timeout-guarded fan-out over member clusters and their nodes.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use fleetlens_core::{ConfigError, ProbeConfig, WorkloadIdentity};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::client::MemberClusterClient;
use crate::error::{ProbeError, ProbeResult};
use crate::matcher::match_pod;
use crate::objects::{NodeObject, PodObject, parse_bytes, parse_count, parse_cpu_millis};
use crate::registry::ClientRegistry;

/// Fan-out limits and matching behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Bound on every member-cluster call.
    pub timeout: Duration,
    pub cluster_concurrency: usize,
    pub node_concurrency: usize,
    /// Require matched pods to share the workload's namespace.
    pub strict_namespace: bool,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            cluster_concurrency: 8,
            node_concurrency: 16,
            strict_namespace: false,
        }
    }
}

impl ProbeOptions {
    pub fn from_config(config: &ProbeConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            timeout: config.timeout()?,
            cluster_concurrency: config.cluster_concurrency.max(1),
            node_concurrency: config.node_concurrency.max(1),
            strict_namespace: config.strict_namespace,
        })
    }
}

// ── Result shapes ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    Ready,
    NotReady,
    Unknown,
}

impl NodeStatus {
    fn of(node: &NodeObject) -> Self {
        match node.ready_condition() {
            Some("True") => Self::Ready,
            Some("False") => Self::NotReady,
            _ => Self::Unknown,
        }
    }
}

/// Capacity and allocatable quantities of one node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResourceSummary {
    pub cpu_capacity_millis: u64,
    pub cpu_allocatable_millis: u64,
    pub memory_capacity_bytes: u64,
    pub memory_allocatable_bytes: u64,
    pub pod_capacity: u64,
    pub pod_allocatable: u64,
}

impl NodeResourceSummary {
    fn of(node: &NodeObject) -> Self {
        let capacity = &node.status.capacity;
        let allocatable = &node.status.allocatable;
        Self {
            cpu_capacity_millis: quantity(capacity, "cpu", parse_cpu_millis),
            cpu_allocatable_millis: quantity(allocatable, "cpu", parse_cpu_millis),
            memory_capacity_bytes: quantity(capacity, "memory", parse_bytes),
            memory_allocatable_bytes: quantity(allocatable, "memory", parse_bytes),
            pod_capacity: quantity(capacity, "pods", parse_count),
            pod_allocatable: quantity(allocatable, "pods", parse_count),
        }
    }
}

fn quantity(map: &HashMap<String, String>, key: &str, parse: fn(&str) -> Option<u64>) -> u64 {
    map.get(key).and_then(|v| parse(v)).unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodDetail {
    pub name: String,
    pub namespace: String,
    pub phase: String,
    pub pod_ip: String,
    pub restart_count: u32,
    pub created_at: Option<String>,
    pub labels: HashMap<String, String>,
}

impl PodDetail {
    fn of(pod: &PodObject) -> Self {
        Self {
            name: pod.metadata.name.clone(),
            namespace: pod.metadata.namespace.clone(),
            phase: pod.status.phase.clone(),
            pod_ip: pod.status.pod_ip.clone(),
            restart_count: pod.restart_count(),
            created_at: pod.metadata.creation_timestamp.clone(),
            labels: pod.metadata.labels.clone(),
        }
    }
}

/// Where a workload's pods run on one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePlacement {
    pub node_name: String,
    pub pod_count: u32,
    pub running_pods: u32,
    pub pending_pods: u32,
    pub failed_pods: u32,
    pub node_status: NodeStatus,
    pub node_roles: Vec<String>,
    #[serde(rename = "nodeIP")]
    pub node_ip: String,
    pub resources: NodeResourceSummary,
    pub pod_details: Vec<PodDetail>,
    /// Placeholder for an unscheduled workload: the node could host it.
    pub potential: bool,
}

impl NodePlacement {
    fn build(node: &NodeObject, pods: &[&PodObject], potential: bool) -> Self {
        let count_phase = |phase: &str| pods.iter().filter(|p| p.status.phase == phase).count() as u32;
        Self {
            node_name: node.name().to_string(),
            pod_count: pods.len() as u32,
            running_pods: count_phase("Running"),
            pending_pods: count_phase("Pending"),
            failed_pods: count_phase("Failed"),
            node_status: NodeStatus::of(node),
            node_roles: node.roles(),
            node_ip: node.internal_ip().unwrap_or_default().to_string(),
            resources: NodeResourceSummary::of(node),
            pod_details: pods.iter().map(|p| PodDetail::of(p)).collect(),
            potential,
        }
    }
}

/// One cluster's contribution to a probe. `error` is set when the cluster
/// could not be probed at all; `nodes` is then empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProbeOutcome {
    pub cluster_name: String,
    pub nodes: Vec<NodePlacement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClusterProbeOutcome {
    fn failed(cluster: &str, error: impl ToString) -> Self {
        Self {
            cluster_name: cluster.to_string(),
            nodes: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

// ── Probe ─────────────────────────────────────────────────────────

/// Discovers where a workload's pods run across member clusters.
#[derive(Clone)]
pub struct ClusterProbe {
    registry: Arc<ClientRegistry>,
    options: ProbeOptions,
}

impl ClusterProbe {
    pub fn new(registry: Arc<ClientRegistry>, options: ProbeOptions) -> Self {
        Self { registry, options }
    }

    /// Probe every cluster in `clusters`. Outcomes come back in input order.
    ///
    /// With `potential` set, nodes are reported as placeholders without
    /// listing pods.
    pub async fn probe_clusters(
        &self,
        clusters: &[String],
        workload: &WorkloadIdentity,
        potential: bool,
    ) -> Vec<ClusterProbeOutcome> {
        let permits = Arc::new(Semaphore::new(self.options.cluster_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (index, cluster) in clusters.iter().enumerate() {
            let client = self.registry.get(cluster).await;
            let permits = permits.clone();
            let cluster = cluster.clone();
            let workload = workload.clone();
            let options = self.options;
            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return (index, ClusterProbeOutcome::failed(&cluster, "probe cancelled"));
                };
                let outcome = probe_cluster(&cluster, client, &workload, options, potential).await;
                (index, outcome)
            });
        }

        let mut outcomes: Vec<Option<ClusterProbeOutcome>> = vec![None; clusters.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => warn!(error = %e, "cluster probe task failed"),
            }
        }

        outcomes
            .into_iter()
            .zip(clusters)
            .map(|(outcome, cluster)| {
                outcome.unwrap_or_else(|| ClusterProbeOutcome::failed(cluster, "probe task failed"))
            })
            .collect()
    }

    /// Probe a single cluster.
    pub async fn probe_one(
        &self,
        cluster: &str,
        workload: &WorkloadIdentity,
        potential: bool,
    ) -> ClusterProbeOutcome {
        let client = self.registry.get(cluster).await;
        probe_cluster(cluster, client, workload, self.options, potential).await
    }
}

async fn probe_cluster(
    cluster: &str,
    client: Option<Arc<dyn MemberClusterClient>>,
    workload: &WorkloadIdentity,
    options: ProbeOptions,
    potential: bool,
) -> ClusterProbeOutcome {
    let Some(client) = client else {
        let err = ProbeError::NoClient(cluster.to_string());
        warn!(%cluster, error = %err, "skipping cluster");
        return ClusterProbeOutcome::failed(cluster, err);
    };

    let nodes = match with_timeout("list nodes", options.timeout, client.list_nodes()).await {
        Ok(nodes) => nodes,
        Err(e) => {
            warn!(%cluster, error = %e, "node listing failed");
            return ClusterProbeOutcome::failed(cluster, e);
        }
    };
    debug!(%cluster, nodes = nodes.len(), potential, "nodes listed");

    if potential {
        return ClusterProbeOutcome {
            cluster_name: cluster.to_string(),
            nodes: nodes
                .iter()
                .map(|node| NodePlacement::build(node, &[], true))
                .collect(),
            error: None,
        };
    }

    let permits = Arc::new(Semaphore::new(options.node_concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let node_count = nodes.len();

    for (index, node) in nodes.into_iter().enumerate() {
        let client = client.clone();
        let permits = permits.clone();
        let workload = workload.clone();
        let cluster = cluster.to_string();
        tasks.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return (index, None);
            };
            let pods = match with_timeout(
                "list pods",
                options.timeout,
                client.list_pods_on_node(node.name()),
            )
            .await
            {
                Ok(pods) => pods,
                Err(e) => {
                    warn!(%cluster, node = %node.name(), error = %e, "pod listing failed, node omitted");
                    return (index, None);
                }
            };

            let matched: Vec<&PodObject> = pods
                .iter()
                .filter(|p| match_pod(p, &workload, options.strict_namespace).is_some())
                .collect();
            if matched.is_empty() {
                return (index, None);
            }
            (index, Some(NodePlacement::build(&node, &matched, false)))
        });
    }

    let mut placements: Vec<Option<NodePlacement>> = vec![None; node_count];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, placement)) => placements[index] = placement,
            Err(e) => warn!(%cluster, error = %e, "node probe task failed"),
        }
    }

    ClusterProbeOutcome {
        cluster_name: cluster.to_string(),
        nodes: placements.into_iter().flatten().collect(),
        error: None,
    }
}

async fn with_timeout<T>(
    operation: &str,
    timeout: Duration,
    call: impl Future<Output = ProbeResult<T>>,
) -> ProbeResult<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Timeout {
            operation: operation.to_string(),
            timeout,
        }),
    }
}
