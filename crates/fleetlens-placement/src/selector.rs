//! Placement predicates.
//!
//! Two pure checks: does a resource selector pick a workload, and does a
//! placement rule pick a cluster. An empty field or absent constraint
//! matches everything.

use std::collections::HashMap;

use fleetlens_core::WorkloadIdentity;
use fleetlens_state::{ClusterRecord, PlacementSpec, PolicyRecord, ResourceSelector};

/// True if every non-empty selector field equals the workload's.
pub fn selector_matches(selector: &ResourceSelector, workload: &WorkloadIdentity) -> bool {
    field_matches(&selector.api_version, &workload.api_version)
        && field_matches(&selector.kind, &workload.kind)
        && field_matches(&selector.namespace, &workload.namespace)
        && field_matches(&selector.name, &workload.name)
}

/// True if any of the policy's selectors picks the workload.
pub fn policy_matches(policy: &PolicyRecord, workload: &WorkloadIdentity) -> bool {
    policy
        .resource_selectors
        .iter()
        .any(|s| selector_matches(s, workload))
}

/// True if the placement's name list (when present) contains `name` and
/// every label in its selector (when present) is set on the cluster.
pub fn cluster_matches(
    placement: &PlacementSpec,
    name: &str,
    labels: &HashMap<String, String>,
) -> bool {
    let names = placement.cluster_names();
    if !names.is_empty() && !names.iter().any(|n| n == name) {
        return false;
    }

    match &placement.cluster_selector {
        Some(selector) => selector
            .match_labels
            .iter()
            .all(|(k, v)| labels.get(k).is_some_and(|cv| cv == v)),
        None => true,
    }
}

/// Cluster names a placement would target, in placement order.
///
/// With an explicit name list the listed order is kept; names of
/// registered clusters are still checked against the label selector,
/// unregistered names pass through. Without a list every registered
/// cluster that matches the label selector is returned.
pub fn candidate_cluster_names(placement: &PlacementSpec, clusters: &[ClusterRecord]) -> Vec<String> {
    let names = placement.cluster_names();
    if names.is_empty() {
        return clusters
            .iter()
            .filter(|c| cluster_matches(placement, &c.name, &c.labels))
            .map(|c| c.name.clone())
            .collect();
    }

    names
        .iter()
        .filter(|name| match clusters.iter().find(|c| &c.name == *name) {
            Some(cluster) => cluster_matches(placement, &cluster.name, &cluster.labels),
            None => true,
        })
        .cloned()
        .collect()
}

fn field_matches(wanted: &str, actual: &str) -> bool {
    wanted.is_empty() || wanted == actual
}
