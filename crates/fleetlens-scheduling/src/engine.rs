//! The read-side scheduling engine.
//!
//! Every query is recomputed from the stores; nothing is cached between
//! calls.

use std::collections::HashMap;
use std::sync::Arc;

use fleetlens_core::WorkloadIdentity;
use fleetlens_placement::{
    SimulateRequest, SimulateResponse, SimulationLimits, VisualSimulateRequest,
    VisualSimulateResponse, candidate_cluster_names,
};
use fleetlens_probe::ClusterProbe;
use fleetlens_state::{
    BindingStore, ClusterRecord, ClusterStore, PolicyKind, PolicyRecord, PolicyStore, StateStore,
};
use tracing::{info, warn};

use crate::binding::{ClusterPlacement, aggregate};
use crate::clusters::{ClusterResourceView, cluster_views};
use crate::error::{SchedulingError, SchedulingResult};
use crate::overview::{SchedulingOverview, summarize};
use crate::resolver::{PolicyInfo, PolicyResolver};
use crate::tree::{SchedulingTree, TreeScope, build_overview_tree, build_resource_tree};
use crate::view::{WorkloadInfo, WorkloadSchedulingView};

#[derive(Clone)]
pub struct SchedulingEngine {
    resolver: PolicyResolver,
    bindings: Arc<dyn BindingStore>,
    clusters: Arc<dyn ClusterStore>,
    probe: ClusterProbe,
    limits: SimulationLimits,
}

impl SchedulingEngine {
    pub fn new(
        policies: Arc<dyn PolicyStore>,
        bindings: Arc<dyn BindingStore>,
        clusters: Arc<dyn ClusterStore>,
        probe: ClusterProbe,
        limits: SimulationLimits,
    ) -> Self {
        Self {
            resolver: PolicyResolver::new(policies),
            bindings,
            clusters,
            probe,
            limits,
        }
    }

    /// Engine reading all three record kinds from one [`StateStore`].
    pub fn with_state(store: Arc<StateStore>, probe: ClusterProbe, limits: SimulationLimits) -> Self {
        Self::new(store.clone(), store.clone(), store, probe, limits)
    }

    // ── Resolution ────────────────────────────────────────────────

    /// Where `workload` runs, or would run.
    ///
    /// With a binding, its planned clusters are probed for the workload's
    /// pods. Without one, the propagation policy's candidate clusters stand
    /// in with zero planned replicas and are probed for nodes only.
    pub async fn resolve_scheduling(
        &self,
        workload: &WorkloadIdentity,
    ) -> SchedulingResult<WorkloadSchedulingView> {
        let policies = self.resolver.resolve_all(workload)?;
        let records = self
            .bindings
            .list_bindings(&workload.namespace)
            .map_err(SchedulingError::upstream("binding"))?;

        let weights = policies
            .propagation
            .as_ref()
            .map(|p| p.placement.static_weights())
            .unwrap_or_default();
        let resolution = aggregate(&records, workload, &weights);

        let mut warnings = Vec::new();
        if resolution.matches > 1 {
            warnings.push(format!(
                "{} bindings govern this workload, showing the first",
                resolution.matches
            ));
        }

        let workload_info = WorkloadInfo::new(workload, resolution.record);
        let bound = resolution.record.is_some();
        let cluster_placements = match (&policies.propagation, bound) {
            (Some(policy), false) => {
                let registered = self.registered_clusters(&mut warnings);
                placeholders(policy, &registered, &weights)
            }
            _ => resolution.placements,
        };

        let cluster_names: Vec<String> = cluster_placements
            .iter()
            .map(|p| p.cluster_name.clone())
            .collect();
        let node_placements = self
            .probe
            .probe_clusters(&cluster_names, workload, !bound)
            .await;

        let failed = node_placements.iter().filter(|o| !o.is_ok()).count();
        info!(
            %workload,
            bound,
            clusters = cluster_names.len(),
            failed,
            phase = ?resolution.status.phase,
            "scheduling resolved"
        );

        Ok(WorkloadSchedulingView {
            workload_info,
            propagation_policy: policies.propagation.as_ref().map(PolicyInfo::from),
            override_policy: policies.override_policy.as_ref().map(PolicyInfo::from),
            cluster_placements,
            scheduling_status: resolution.status,
            node_placements,
            warnings,
        })
    }

    /// Registered clusters for candidate filtering. A store failure reads
    /// as no clusters plus a warning.
    fn registered_clusters(&self, warnings: &mut Vec<String>) -> Vec<ClusterRecord> {
        match self.clusters.list_clusters() {
            Ok(clusters) => clusters,
            Err(e) => {
                warn!(error = %e, "cluster store unreachable, skipping label checks");
                warnings.push(format!("cluster store unreachable: {e}"));
                Vec::new()
            }
        }
    }

    // ── Simulation ────────────────────────────────────────────────

    pub fn simulate(&self, request: &SimulateRequest) -> SchedulingResult<SimulateResponse> {
        let clusters = self
            .clusters
            .list_clusters()
            .map_err(SchedulingError::upstream("cluster"))?;
        Ok(fleetlens_placement::simulate(request, &clusters, &self.limits))
    }

    pub fn simulate_allocation(&self, request: &VisualSimulateRequest) -> VisualSimulateResponse {
        fleetlens_placement::simulate_allocation(request, &self.limits)
    }

    // ── Presentation ──────────────────────────────────────────────

    pub fn build_tree(&self, scope: &TreeScope) -> SchedulingResult<SchedulingTree> {
        let clusters = self
            .clusters
            .list_clusters()
            .map_err(SchedulingError::upstream("cluster"))?;

        match scope {
            TreeScope::Resource(workload) => {
                let policies = self
                    .resolver
                    .policies_visible_to(PolicyKind::Propagation, &workload.namespace)?;
                Ok(build_resource_tree(workload, &policies, &clusters))
            }
            TreeScope::Overview { namespace } => {
                let policies = self
                    .resolver
                    .policies_in_scope(PolicyKind::Propagation, namespace)?;
                Ok(build_overview_tree(&policies, &clusters))
            }
        }
    }

    pub fn overview(&self, namespace: &str) -> SchedulingResult<SchedulingOverview> {
        let records = self
            .bindings
            .list_bindings(namespace)
            .map_err(SchedulingError::upstream("binding"))?;
        Ok(summarize(&records))
    }

    pub fn cluster_resources(&self) -> SchedulingResult<Vec<ClusterResourceView>> {
        let clusters = self
            .clusters
            .list_clusters()
            .map_err(SchedulingError::upstream("cluster"))?;
        Ok(cluster_views(&clusters))
    }
}

fn placeholders(
    policy: &PolicyRecord,
    registered: &[ClusterRecord],
    weights: &HashMap<String, u32>,
) -> Vec<ClusterPlacement> {
    candidate_cluster_names(&policy.placement, registered)
        .into_iter()
        .map(|name| ClusterPlacement {
            weight: weights.get(&name).copied(),
            reason: format!("candidate cluster of policy {}", policy.name),
            cluster_name: name,
            planned_replicas: 0,
            actual_replicas: 0,
        })
        .collect()
}
