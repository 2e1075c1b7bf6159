//! Policy resolution: which propagation and override policies govern a
//! workload. Namespaced policies are consulted before cluster-scoped ones.

use std::sync::Arc;

use fleetlens_core::WorkloadIdentity;
use fleetlens_placement::policy_matches;
use fleetlens_state::{PlacementSpec, PolicyKind, PolicyRecord, PolicyStore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SchedulingError, SchedulingResult};

/// Policy summary attached to a scheduling view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyInfo {
    pub name: String,
    /// Empty for cluster-scoped policies.
    pub namespace: String,
    pub cluster_scoped: bool,
    pub placement: PlacementSpec,
}

impl From<&PolicyRecord> for PolicyInfo {
    fn from(policy: &PolicyRecord) -> Self {
        Self {
            name: policy.name.clone(),
            namespace: policy.namespace_str().to_string(),
            cluster_scoped: policy.is_cluster_scoped(),
            placement: policy.placement.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedPolicies {
    pub propagation: Option<PolicyRecord>,
    pub override_policy: Option<PolicyRecord>,
}

/// Looks up governing policies through a [`PolicyStore`].
#[derive(Clone)]
pub struct PolicyResolver {
    store: Arc<dyn PolicyStore>,
}

impl PolicyResolver {
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self { store }
    }

    /// First policy of `kind` whose selectors match `workload`.
    pub fn resolve(
        &self,
        kind: PolicyKind,
        workload: &WorkloadIdentity,
    ) -> SchedulingResult<Option<PolicyRecord>> {
        let namespaced = self
            .store
            .list_policies(kind, &workload.namespace)
            .map_err(SchedulingError::upstream("policy"))?;
        if let Some(policy) = namespaced.into_iter().find(|p| policy_matches(p, workload)) {
            debug!(%workload, policy = %policy.name, ?kind, "namespaced policy matched");
            return Ok(Some(policy));
        }

        let cluster_scoped = self
            .store
            .list_cluster_policies(kind)
            .map_err(SchedulingError::upstream("policy"))?;
        let found = cluster_scoped
            .into_iter()
            .find(|p| policy_matches(p, workload));
        if let Some(policy) = &found {
            debug!(%workload, policy = %policy.name, ?kind, "cluster-scoped policy matched");
        }
        Ok(found)
    }

    /// Both the propagation and the override policy.
    pub fn resolve_all(&self, workload: &WorkloadIdentity) -> SchedulingResult<ResolvedPolicies> {
        Ok(ResolvedPolicies {
            propagation: self.resolve(PolicyKind::Propagation, workload)?,
            override_policy: self.resolve(PolicyKind::Override, workload)?,
        })
    }

    /// Namespaced policies of `namespace` followed by every cluster-scoped
    /// one: the candidates for a workload living in `namespace`.
    pub fn policies_visible_to(
        &self,
        kind: PolicyKind,
        namespace: &str,
    ) -> SchedulingResult<Vec<PolicyRecord>> {
        let mut policies = self
            .store
            .list_policies(kind, namespace)
            .map_err(SchedulingError::upstream("policy"))?;
        policies.extend(
            self.store
                .list_cluster_policies(kind)
                .map_err(SchedulingError::upstream("policy"))?,
        );
        Ok(policies)
    }

    /// Policies of `kind` visible in `namespace`; an empty namespace also
    /// includes cluster-scoped policies.
    pub fn policies_in_scope(
        &self,
        kind: PolicyKind,
        namespace: &str,
    ) -> SchedulingResult<Vec<PolicyRecord>> {
        let mut policies = self
            .store
            .list_policies(kind, namespace)
            .map_err(SchedulingError::upstream("policy"))?;
        if namespace.is_empty() {
            policies.extend(
                self.store
                    .list_cluster_policies(kind)
                    .map_err(SchedulingError::upstream("policy"))?,
            );
        }
        Ok(policies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetlens_state::{ResourceSelector, StateError, StateResult, StateStore};

    fn policy(namespace: Option<&str>, name: &str, kind: &str) -> PolicyRecord {
        PolicyRecord {
            name: name.into(),
            namespace: namespace.map(str::to_string),
            resource_selectors: vec![ResourceSelector {
                api_version: "apps/v1".into(),
                kind: kind.into(),
                ..ResourceSelector::default()
            }],
            placement: PlacementSpec::default(),
        }
    }

    fn nginx() -> WorkloadIdentity {
        WorkloadIdentity::new("default", "nginx", "Deployment")
    }

    fn store_with(policies: &[(PolicyKind, PolicyRecord)]) -> Arc<StateStore> {
        let store = StateStore::open_in_memory().unwrap();
        for (kind, p) in policies {
            store.put_policy(*kind, p).unwrap();
        }
        Arc::new(store)
    }

    #[test]
    fn namespaced_beats_cluster_scoped() {
        let store = store_with(&[
            (PolicyKind::Propagation, policy(None, "cluster-wide", "Deployment")),
            (PolicyKind::Propagation, policy(Some("default"), "local", "Deployment")),
        ]);
        let resolver = PolicyResolver::new(store);
        let found = resolver.resolve(PolicyKind::Propagation, &nginx()).unwrap();
        assert_eq!(found.map(|p| p.name), Some("local".to_string()));
    }

    #[test]
    fn falls_back_to_cluster_scoped() {
        let store = store_with(&[
            (PolicyKind::Propagation, policy(None, "cluster-wide", "Deployment")),
            (PolicyKind::Propagation, policy(Some("default"), "services", "Service")),
            (PolicyKind::Propagation, policy(Some("prod"), "other-ns", "Deployment")),
        ]);
        let resolver = PolicyResolver::new(store);
        let found = resolver.resolve(PolicyKind::Propagation, &nginx()).unwrap();
        assert_eq!(found.map(|p| p.name), Some("cluster-wide".to_string()));
    }

    #[test]
    fn resolves_override_separately() {
        let store = store_with(&[
            (PolicyKind::Propagation, policy(Some("default"), "pp", "Deployment")),
            (PolicyKind::Override, policy(Some("default"), "op", "Deployment")),
        ]);
        let resolved = PolicyResolver::new(store).resolve_all(&nginx()).unwrap();
        assert_eq!(resolved.propagation.map(|p| p.name), Some("pp".to_string()));
        assert_eq!(resolved.override_policy.map(|p| p.name), Some("op".to_string()));
    }

    #[test]
    fn no_policy_is_not_an_error() {
        let resolver = PolicyResolver::new(store_with(&[]));
        assert!(resolver.resolve_all(&nginx()).unwrap().propagation.is_none());
    }

    struct Unreachable;

    impl PolicyStore for Unreachable {
        fn list_policies(&self, _: PolicyKind, _: &str) -> StateResult<Vec<PolicyRecord>> {
            Err(StateError::Unavailable("connection refused".into()))
        }

        fn list_cluster_policies(&self, _: PolicyKind) -> StateResult<Vec<PolicyRecord>> {
            Err(StateError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn store_failure_is_upstream_unavailable() {
        let resolver = PolicyResolver::new(Arc::new(Unreachable));
        let err = resolver.resolve_all(&nginx()).unwrap_err();
        assert!(matches!(
            err,
            SchedulingError::UpstreamUnavailable { store: "policy", .. }
        ));
    }

    #[test]
    fn scope_includes_cluster_policies_only_when_unfiltered() {
        let store = store_with(&[
            (PolicyKind::Propagation, policy(None, "cluster-wide", "Deployment")),
            (PolicyKind::Propagation, policy(Some("default"), "local", "Deployment")),
        ]);
        let resolver = PolicyResolver::new(store);
        assert_eq!(resolver.policies_in_scope(PolicyKind::Propagation, "").unwrap().len(), 2);
        assert_eq!(resolver.policies_in_scope(PolicyKind::Propagation, "default").unwrap().len(), 1);
    }
}
