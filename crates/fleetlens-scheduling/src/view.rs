//! Shapes returned by `SchedulingEngine::resolve_scheduling`.

use fleetlens_core::WorkloadIdentity;
use fleetlens_probe::ClusterProbeOutcome;
use fleetlens_state::SchedulingRecord;
use serde::{Deserialize, Serialize};

use crate::binding::ClusterPlacement;
use crate::extractor::extract_field;
use crate::phase::SchedulingStatus;
use crate::resolver::PolicyInfo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadInfo {
    pub name: String,
    pub namespace: String,
    pub kind: String,
    pub api_version: String,
    /// Sum of planned replicas across target clusters.
    pub replicas: u32,
    /// Sum of `readyReplicas` across the aggregated status entries.
    pub ready_replicas: u32,
}

impl WorkloadInfo {
    pub fn new(workload: &WorkloadIdentity, record: Option<&SchedulingRecord>) -> Self {
        let (replicas, ready_replicas) = match record {
            Some(r) => (
                r.planned_total(),
                r.aggregated_status
                    .iter()
                    .map(|s| extract_field(s.status.as_ref(), "readyReplicas"))
                    .fold(0u32, u32::saturating_add),
            ),
            None => (0, 0),
        };
        Self {
            name: workload.name.clone(),
            namespace: workload.namespace.clone(),
            kind: workload.kind.clone(),
            api_version: workload.api_version.clone(),
            replicas,
            ready_replicas,
        }
    }
}

/// Everything known about where one workload runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSchedulingView {
    pub workload_info: WorkloadInfo,
    pub propagation_policy: Option<PolicyInfo>,
    pub override_policy: Option<PolicyInfo>,
    pub cluster_placements: Vec<ClusterPlacement>,
    pub scheduling_status: SchedulingStatus,
    /// Per-cluster probe results, in `cluster_placements` order.
    pub node_placements: Vec<ClusterProbeOutcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl WorkloadSchedulingView {
    /// Clusters whose probe failed.
    pub fn failed_clusters(&self) -> impl Iterator<Item = &ClusterProbeOutcome> {
        self.node_placements.iter().filter(|o| !o.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetlens_state::{AggregatedStatusItem, ObjectReference, TargetCluster};
    use serde_json::json;

    #[test]
    fn info_sums_planned_and_ready() {
        let record = SchedulingRecord {
            namespace: "default".into(),
            name: "nginx-deployment".into(),
            resource: ObjectReference::default(),
            clusters: vec![
                TargetCluster {
                    name: "A".into(),
                    replicas: 3,
                },
                TargetCluster {
                    name: "B".into(),
                    replicas: 2,
                },
            ],
            aggregated_status: vec![
                AggregatedStatusItem {
                    cluster_name: "A".into(),
                    status: Some(json!({"readyReplicas": 3})),
                },
                AggregatedStatusItem {
                    cluster_name: "B".into(),
                    status: Some(json!({"availableReplicas": 2})),
                },
            ],
            conditions: vec![],
        };
        let nginx = WorkloadIdentity::new("default", "nginx", "Deployment");
        let info = WorkloadInfo::new(&nginx, Some(&record));
        assert_eq!(info.replicas, 5);
        assert_eq!(info.ready_replicas, 3);
        assert_eq!(info.api_version, "apps/v1");
    }

    #[test]
    fn info_without_record_is_zero() {
        let nginx = WorkloadIdentity::new("default", "nginx", "Deployment");
        let info = WorkloadInfo::new(&nginx, None);
        assert_eq!((info.replicas, info.ready_replicas), (0, 0));
    }
}
