//! Pod-to-workload ownership matching.
//!
//! Pods carry no direct link to the workload that created them, so
//! ownership is inferred in order of confidence:
//!
//! 1. an owner reference naming the workload itself;
//! 2. an owner reference of the intermediate controller kind
//!    (`ReplicaSet` for a `Deployment`, `Job` for a `CronJob`) whose name
//!    starts with `{workload}-`. The intermediate's own owner is not
//!    checked, so same-named workloads sharing a node can be confused;
//! 3. an `app` or `app.kubernetes.io/name` label equal to the workload name.

use fleetlens_core::{WorkloadIdentity, intermediate_owner_kind};
use serde::Serialize;

use crate::objects::PodObject;

/// Labels conventionally carrying the application name.
pub const APP_NAME_LABELS: [&str; 2] = ["app", "app.kubernetes.io/name"];

/// Which rule accepted a pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OwnershipMatch {
    Owner,
    IntermediateOwner,
    AppLabel,
}

/// Decide whether `pod` belongs to `workload`.
///
/// With `strict_namespace` the pod must also live in the workload's
/// namespace.
pub fn match_pod(
    pod: &PodObject,
    workload: &WorkloadIdentity,
    strict_namespace: bool,
) -> Option<OwnershipMatch> {
    if strict_namespace && pod.metadata.namespace != workload.namespace {
        return None;
    }

    let owners = &pod.metadata.owner_references;

    if owners
        .iter()
        .any(|o| o.kind == workload.kind && o.name == workload.name)
    {
        return Some(OwnershipMatch::Owner);
    }

    if let Some(intermediate) = intermediate_owner_kind(&workload.kind) {
        let prefix = format!("{}-", workload.name);
        if owners
            .iter()
            .any(|o| o.kind == intermediate && o.name.starts_with(&prefix))
        {
            return Some(OwnershipMatch::IntermediateOwner);
        }
    }

    let labels = &pod.metadata.labels;
    if APP_NAME_LABELS
        .iter()
        .any(|key| labels.get(*key).is_some_and(|v| v == &workload.name))
    {
        return Some(OwnershipMatch::AppLabel);
    }

    None
}
