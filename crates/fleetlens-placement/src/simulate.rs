//! Simulation front-ends over the allocator.
//!
//! Neither entry point reads binding state. The placement form filters the
//! registered clusters through the placement rule first; the visual form
//! takes an explicit cluster list and strategy name.

use std::collections::HashMap;

use fleetlens_state::{ClusterRecord, PlacementSpec};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::allocator::{Allocation, AllocationMode, SchedulingType, allocate};
use crate::selector::cluster_matches;

/// Marker appended to the reason of an over-capacity allocation.
pub const CAPACITY_MARKER: &str = " (capacity warning)";

/// Caller-side checks applied to every simulated allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationLimits {
    pub max_replicas_per_cluster: u32,
}

impl Default for SimulationLimits {
    fn default() -> Self {
        Self {
            max_replicas_per_cluster: 100,
        }
    }
}

pub type SchedulingResult = Allocation;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkloadSpec {
    pub kind: String,
    pub replicas: u32,
}

/// Simulate a workload against a placement rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulateRequest {
    pub workload: WorkloadSpec,
    pub placement: PlacementSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    pub scheduling_result: Vec<SchedulingResult>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub feasible: bool,
}

/// Simulate an explicit cluster list with a named strategy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualSimulateRequest {
    pub workload: WorkloadSpec,
    pub clusters: Vec<String>,
    pub strategy: String,
    pub weights: HashMap<String, u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VisualSimulateResponse {
    pub allocation: Vec<SchedulingResult>,
    pub warnings: Vec<String>,
    pub feasible: bool,
}

/// Placement-form simulation.
///
/// An absent scheduling type means `Duplicated`. An unrecognised type is
/// reported as infeasible rather than failing.
pub fn simulate(
    request: &SimulateRequest,
    clusters: &[ClusterRecord],
    limits: &SimulationLimits,
) -> SimulateResponse {
    let placement = &request.placement;
    let targets: Vec<String> = clusters
        .iter()
        .filter(|c| cluster_matches(placement, &c.name, &c.labels))
        .map(|c| c.name.clone())
        .collect();

    let mut response = SimulateResponse {
        feasible: true,
        ..SimulateResponse::default()
    };

    if targets.is_empty() {
        response
            .warnings
            .push("no registered cluster matches the placement".to_string());
        return response;
    }

    let type_name = placement
        .replica_scheduling
        .as_ref()
        .map(|r| r.replica_scheduling_type.as_str())
        .unwrap_or("");

    let mode = if type_name.is_empty() {
        AllocationMode::Duplicated
    } else {
        match SchedulingType::parse(type_name) {
            Some(SchedulingType::Duplicated) => AllocationMode::Duplicated,
            Some(SchedulingType::Divided) => AllocationMode::divided(placement.static_weights()),
            None => {
                response.feasible = false;
                response
                    .warnings
                    .push(format!("unsupported scheduling strategy: {type_name}"));
                return response;
            }
        }
    };

    debug!(
        kind = %request.workload.kind,
        replicas = request.workload.replicas,
        targets = targets.len(),
        ?mode,
        "simulating placement"
    );

    response.scheduling_result = allocate(request.workload.replicas, &targets, &mode);
    response.warnings = check_allocations(&mut response.scheduling_result, limits);
    response
}

/// Visual simulation over an explicit cluster list.
pub fn simulate_allocation(
    request: &VisualSimulateRequest,
    limits: &SimulationLimits,
) -> VisualSimulateResponse {
    let mode = match SchedulingType::parse(&request.strategy) {
        Some(SchedulingType::Duplicated) => AllocationMode::Duplicated,
        Some(SchedulingType::Divided) => AllocationMode::divided(request.weights.clone()),
        None => {
            return VisualSimulateResponse {
                allocation: Vec::new(),
                warnings: vec![format!(
                    "unsupported scheduling strategy: {}",
                    request.strategy
                )],
                feasible: false,
            };
        }
    };

    if request.clusters.is_empty() {
        return VisualSimulateResponse {
            allocation: Vec::new(),
            warnings: vec!["no target clusters given".to_string()],
            feasible: false,
        };
    }

    debug!(
        strategy = %request.strategy,
        replicas = request.workload.replicas,
        clusters = request.clusters.len(),
        "simulating allocation"
    );

    let mut allocation = allocate(request.workload.replicas, &request.clusters, &mode);
    let warnings = check_allocations(&mut allocation, limits);
    VisualSimulateResponse {
        allocation,
        warnings,
        feasible: true,
    }
}

/// Flag zero-replica and over-capacity clusters.
fn check_allocations(allocations: &mut [Allocation], limits: &SimulationLimits) -> Vec<String> {
    let mut warnings = Vec::new();
    for allocation in allocations.iter_mut() {
        if allocation.replicas == 0 {
            warnings.push(format!(
                "cluster {} receives no replicas",
                allocation.cluster_name
            ));
        }
        if allocation.replicas > limits.max_replicas_per_cluster {
            warnings.push(format!(
                "cluster {} may lack capacity for {} replicas",
                allocation.cluster_name, allocation.replicas
            ));
            allocation.reason.push_str(CAPACITY_MARKER);
        }
    }
    warnings
}
