//! Record types for the fleetlens snapshot store.
//!
//! These mirror the shapes the control plane publishes: scheduling
//! records (bindings), propagation/override policies, and member clusters.
//! JSON field names are camelCase so published objects import unchanged.

use std::collections::HashMap;

use fleetlens_core::WorkloadIdentity;
use serde::{Deserialize, Serialize};

// ── Policies ──────────────────────────────────────────────────────

/// Selects workloads by (apiVersion, kind, namespace, name).
/// An empty field is a wildcard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceSelector {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

/// Explicit list of target cluster names.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterAffinity {
    pub cluster_names: Vec<String>,
}

/// Cluster label constraints; every entry must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelSelector {
    pub match_labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetClusters {
    pub cluster_names: Vec<String>,
}

/// One static weight entry: every named cluster gets `weight`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaticWeight {
    pub target_cluster: TargetClusters,
    pub weight: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WeightPreference {
    pub static_weight_list: Vec<StaticWeight>,
}

/// How replicas are spread over the selected clusters.
///
/// `replica_scheduling_type` is kept as published (`Divided`,
/// `Duplicated`, or anything else); interpretation happens at simulation
/// time so unknown modes can be reported instead of rejected on import.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplicaScheduling {
    pub replica_scheduling_type: String,
    pub weight_preference: Option<WeightPreference>,
}

/// Placement rule shared by policies and simulation requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlacementSpec {
    pub cluster_affinity: Option<ClusterAffinity>,
    pub cluster_selector: Option<LabelSelector>,
    pub replica_scheduling: Option<ReplicaScheduling>,
}

impl PlacementSpec {
    /// Cluster names listed in the affinity, if any.
    pub fn cluster_names(&self) -> &[String] {
        self.cluster_affinity
            .as_ref()
            .map(|a| a.cluster_names.as_slice())
            .unwrap_or(&[])
    }

    /// Flatten the static weight list into `cluster → weight`.
    ///
    /// When a cluster is listed twice the later entry wins.
    pub fn static_weights(&self) -> HashMap<String, u32> {
        let mut weights = HashMap::new();
        let list = self
            .replica_scheduling
            .as_ref()
            .and_then(|r| r.weight_preference.as_ref())
            .map(|w| w.static_weight_list.as_slice())
            .unwrap_or(&[]);
        for entry in list {
            for name in &entry.target_cluster.cluster_names {
                weights.insert(name.clone(), entry.weight);
            }
        }
        weights
    }
}

/// Which policy family a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Propagation,
    Override,
}

/// A propagation or override policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRecord {
    pub name: String,
    /// `None` for cluster-scoped policies.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub resource_selectors: Vec<ResourceSelector>,
    #[serde(default)]
    pub placement: PlacementSpec,
}

impl PolicyRecord {
    pub fn is_cluster_scoped(&self) -> bool {
        self.namespace.is_none()
    }

    pub fn namespace_str(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }

    /// Build the composite key for the policy tables.
    pub fn table_key(&self) -> String {
        format!("{}/{}", self.namespace_str(), self.name)
    }

    /// Copy with an empty namespace read as cluster scope.
    pub fn normalized(&self) -> Self {
        Self {
            namespace: self.namespace.clone().filter(|ns| !ns.is_empty()),
            ..self.clone()
        }
    }
}

// ── Scheduling records ────────────────────────────────────────────

/// The workload a scheduling record governs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectReference {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ObjectReference {
    pub fn matches(&self, identity: &WorkloadIdentity) -> bool {
        identity.same_object(&self.kind, &self.namespace, &self.name)
    }
}

/// Planned replica count for one cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetCluster {
    pub name: String,
    #[serde(default)]
    pub replicas: u32,
}

/// Last observed status snapshot from one member cluster.
///
/// `status` is opaque: whatever the member cluster reported for the
/// workload, kept as free-form JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedStatusItem {
    pub cluster_name: String,
    #[serde(default)]
    pub status: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// A named tri-state flag on a scheduling record (`Scheduled`, `FullyApplied`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
}

/// The control plane's record of where a workload's replicas go.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingRecord {
    pub namespace: String,
    pub name: String,
    pub resource: ObjectReference,
    #[serde(default)]
    pub clusters: Vec<TargetCluster>,
    #[serde(default)]
    pub aggregated_status: Vec<AggregatedStatusItem>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl SchedulingRecord {
    /// Build the composite key for the bindings table.
    pub fn table_key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    pub fn condition(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    pub fn status_for(&self, cluster: &str) -> Option<&AggregatedStatusItem> {
        self.aggregated_status
            .iter()
            .find(|s| s.cluster_name == cluster)
    }

    pub fn planned_total(&self) -> u32 {
        self.clusters.iter().map(|c| c.replicas).fold(0u32, u32::saturating_add)
    }
}

// ── Clusters ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Taint {
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub effect: String,
}

/// Capacity and allocation summary as published for a member cluster.
///
/// Fractions are percentages (0–100).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterResources {
    /// CPU capacity in cores.
    pub cpu_capacity: u64,
    pub cpu_fraction: f64,
    /// Memory capacity in bytes.
    pub memory_capacity: u64,
    pub memory_fraction: f64,
    pub pod_capacity: u64,
    pub allocated_pods: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeSummary {
    pub total: u32,
    pub ready: u32,
}

/// A member cluster registered with the control plane.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRecord {
    pub name: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub kubernetes_version: String,
    #[serde(default)]
    pub taints: Vec<Taint>,
    #[serde(default)]
    pub resources: ClusterResources,
    #[serde(default)]
    pub node_summary: NodeSummary,
}

// ── Snapshot import ───────────────────────────────────────────────

/// A bulk export of published state, loaded by `StateStore::import`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub clusters: Vec<ClusterRecord>,
    pub bindings: Vec<SchedulingRecord>,
    pub propagation_policies: Vec<PolicyRecord>,
    pub override_policies: Vec<PolicyRecord>,
}
