//! Distribution summary over every binding in a scope.

use std::collections::BTreeMap;

use fleetlens_state::SchedulingRecord;
use serde::{Deserialize, Serialize};

use crate::extractor::extract_replicas;
use crate::phase::{SchedulingPhase, classify};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewTotals {
    pub workloads: u32,
    pub planned_replicas: u32,
    pub ready_replicas: u32,
    pub scheduled: u32,
    pub pending: u32,
    pub failed: u32,
}

impl OverviewTotals {
    fn count_phase(&mut self, phase: SchedulingPhase) {
        match phase {
            SchedulingPhase::Scheduled => self.scheduled += 1,
            SchedulingPhase::Pending => self.pending += 1,
            SchedulingPhase::Failed => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDistribution {
    pub cluster_name: String,
    pub workloads: u32,
    pub planned_replicas: u32,
    pub ready_replicas: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceDistribution {
    pub namespace: String,
    pub workloads: u32,
    pub planned_replicas: u32,
    pub ready_replicas: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingOverview {
    pub totals: OverviewTotals,
    /// Sorted by cluster name.
    pub per_cluster: Vec<ClusterDistribution>,
    /// Sorted by namespace.
    pub per_namespace: Vec<NamespaceDistribution>,
}

/// Fold `records` into totals and per-cluster / per-namespace rows.
pub fn summarize(records: &[SchedulingRecord]) -> SchedulingOverview {
    let mut totals = OverviewTotals::default();
    let mut clusters: BTreeMap<&str, ClusterDistribution> = BTreeMap::new();
    let mut namespaces: BTreeMap<&str, NamespaceDistribution> = BTreeMap::new();

    for record in records {
        totals.workloads += 1;
        totals.count_phase(classify(record).phase);

        let ns = namespaces
            .entry(record.namespace.as_str())
            .or_insert_with(|| NamespaceDistribution {
                namespace: record.namespace.clone(),
                ..NamespaceDistribution::default()
            });
        ns.workloads += 1;

        for target in &record.clusters {
            let ready = extract_replicas(
                record
                    .status_for(&target.name)
                    .and_then(|s| s.status.as_ref()),
            );

            let row = clusters
                .entry(target.name.as_str())
                .or_insert_with(|| ClusterDistribution {
                    cluster_name: target.name.clone(),
                    ..ClusterDistribution::default()
                });
            row.workloads += 1;
            row.planned_replicas = row.planned_replicas.saturating_add(target.replicas);
            row.ready_replicas = row.ready_replicas.saturating_add(ready);

            ns.planned_replicas = ns.planned_replicas.saturating_add(target.replicas);
            ns.ready_replicas = ns.ready_replicas.saturating_add(ready);
            totals.planned_replicas = totals.planned_replicas.saturating_add(target.replicas);
            totals.ready_replicas = totals.ready_replicas.saturating_add(ready);
        }
    }

    SchedulingOverview {
        totals,
        per_cluster: clusters.into_values().collect(),
        per_namespace: namespaces.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetlens_state::{
        AggregatedStatusItem, Condition, ConditionStatus, ObjectReference, TargetCluster,
    };
    use serde_json::json;

    fn record(ns: &str, name: &str, clusters: &[(&str, u32, u32)]) -> SchedulingRecord {
        SchedulingRecord {
            namespace: ns.into(),
            name: name.into(),
            resource: ObjectReference::default(),
            clusters: clusters
                .iter()
                .map(|(c, planned, _)| TargetCluster {
                    name: c.to_string(),
                    replicas: *planned,
                })
                .collect(),
            aggregated_status: clusters
                .iter()
                .map(|(c, _, ready)| AggregatedStatusItem {
                    cluster_name: c.to_string(),
                    status: Some(json!({"readyReplicas": ready})),
                })
                .collect(),
            conditions: vec![],
        }
    }

    #[test]
    fn folds_by_cluster_and_namespace() {
        let mut failed = record("prod", "api", &[("member1", 2, 0)]);
        failed.conditions.push(Condition {
            type_: "Scheduled".into(),
            status: ConditionStatus::False,
            reason: String::new(),
            message: String::new(),
        });
        let records = vec![
            record("default", "nginx", &[("member2", 3, 3), ("member1", 2, 1)]),
            record("default", "idle", &[]),
            failed,
        ];

        let overview = summarize(&records);
        assert_eq!(
            overview.totals,
            OverviewTotals {
                workloads: 3,
                planned_replicas: 7,
                ready_replicas: 4,
                scheduled: 1,
                pending: 1,
                failed: 1,
            }
        );

        let clusters: Vec<_> = overview
            .per_cluster
            .iter()
            .map(|c| (c.cluster_name.as_str(), c.workloads, c.planned_replicas, c.ready_replicas))
            .collect();
        assert_eq!(clusters, vec![("member1", 2, 4, 1), ("member2", 1, 3, 3)]);

        let namespaces: Vec<_> = overview
            .per_namespace
            .iter()
            .map(|n| (n.namespace.as_str(), n.workloads, n.planned_replicas))
            .collect();
        assert_eq!(namespaces, vec![("default", 2, 5), ("prod", 1, 2)]);
    }

    #[test]
    fn replica_totals_saturate() {
        let records = vec![record("default", "huge", &[("A", u32::MAX, 0), ("B", 1, 1)])];
        let overview = summarize(&records);
        assert_eq!(overview.totals.planned_replicas, u32::MAX);
        assert_eq!(overview.totals.scheduled, 1);
        assert_eq!(overview.per_namespace[0].planned_replicas, u32::MAX);
    }

    #[test]
    fn empty_scope() {
        assert_eq!(summarize(&[]), SchedulingOverview::default());
    }
}
