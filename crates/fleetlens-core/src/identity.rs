//! Workload identity: the key used to correlate policies, bindings,
//! and member-cluster pods.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default `apiVersion` for the apps-group workload kinds.
pub const APPS_V1: &str = "apps/v1";

/// Identity of a workload as seen by the control plane.
///
/// An empty `namespace` means "all namespaces" when the identity is used
/// as a query; `api_version` may be empty when the caller doesn't know it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadIdentity {
    pub namespace: String,
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub api_version: String,
}

impl WorkloadIdentity {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        let kind = canonical_kind(&kind.into());
        let api_version = default_api_version(&kind).to_string();
        Self {
            namespace: namespace.into(),
            name: name.into(),
            kind,
            api_version,
        }
    }

    /// Override the `apiVersion`.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Exact (kind, namespace, name) equality, ignoring `apiVersion`.
    pub fn same_object(&self, kind: &str, namespace: &str, name: &str) -> bool {
        self.kind == kind && self.namespace == namespace && self.name == name
    }
}

impl fmt::Display for WorkloadIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// Map a lowercase resource type (`deployment`, `cronjob`, ...) to its
/// Kind spelling. Unknown values pass through unchanged.
pub fn canonical_kind(resource_type: &str) -> String {
    let kind = match resource_type.to_ascii_lowercase().as_str() {
        "deployment" | "deployments" => "Deployment",
        "statefulset" | "statefulsets" => "StatefulSet",
        "daemonset" | "daemonsets" => "DaemonSet",
        "replicaset" | "replicasets" => "ReplicaSet",
        "job" | "jobs" => "Job",
        "cronjob" | "cronjobs" => "CronJob",
        "service" | "services" => "Service",
        "pod" | "pods" => "Pod",
        _ => return resource_type.to_string(),
    };
    kind.to_string()
}

/// The controller kind that sits between a workload and its pods, if any.
///
/// Deployments own ReplicaSets which own pods; CronJobs own Jobs.
pub fn intermediate_owner_kind(kind: &str) -> Option<&'static str> {
    match kind {
        "Deployment" => Some("ReplicaSet"),
        "CronJob" => Some("Job"),
        _ => None,
    }
}

fn default_api_version(kind: &str) -> &'static str {
    match kind {
        "Deployment" | "StatefulSet" | "DaemonSet" | "ReplicaSet" => APPS_V1,
        "Job" | "CronJob" => "batch/v1",
        _ => "v1",
    }
}
