//! Read-side store seams used by the scheduling engine.

use crate::error::StateResult;
use crate::store::StateStore;
use crate::types::{ClusterRecord, PolicyKind, PolicyRecord, SchedulingRecord};

/// Lists propagation and override policies.
pub trait PolicyStore: Send + Sync {
    /// Namespaced policies in `namespace`; empty means every namespace.
    fn list_policies(&self, kind: PolicyKind, namespace: &str) -> StateResult<Vec<PolicyRecord>>;

    /// Cluster-scoped policies.
    fn list_cluster_policies(&self, kind: PolicyKind) -> StateResult<Vec<PolicyRecord>>;
}

/// Lists scheduling records.
pub trait BindingStore: Send + Sync {
    /// Records in `namespace`; empty means every namespace.
    fn list_bindings(&self, namespace: &str) -> StateResult<Vec<SchedulingRecord>>;
}

/// Lists registered member clusters.
pub trait ClusterStore: Send + Sync {
    fn list_clusters(&self) -> StateResult<Vec<ClusterRecord>>;
}

impl PolicyStore for StateStore {
    fn list_policies(&self, kind: PolicyKind, namespace: &str) -> StateResult<Vec<PolicyRecord>> {
        StateStore::list_policies(self, kind, namespace)
    }

    fn list_cluster_policies(&self, kind: PolicyKind) -> StateResult<Vec<PolicyRecord>> {
        StateStore::list_cluster_policies(self, kind)
    }
}

impl BindingStore for StateStore {
    fn list_bindings(&self, namespace: &str) -> StateResult<Vec<SchedulingRecord>> {
        StateStore::list_bindings(self, namespace)
    }
}

impl ClusterStore for StateStore {
    fn list_clusters(&self) -> StateResult<Vec<ClusterRecord>> {
        StateStore::list_clusters(self)
    }
}
