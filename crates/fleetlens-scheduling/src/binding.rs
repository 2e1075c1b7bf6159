//! Binding aggregation: the planned and observed placement of one workload.
//!
//! Lookup is a linear scan of the records visible in the workload's
//! namespace. At most one record is expected per workload; if several
//! match, the first in store order is used and the duplication is
//! reported.

use std::collections::HashMap;

use fleetlens_core::WorkloadIdentity;
use fleetlens_state::SchedulingRecord;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::extractor::extract_replicas;
use crate::phase::{SchedulingStatus, classify};

/// Planned vs. observed replicas in one member cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPlacement {
    pub cluster_name: String,
    pub planned_replicas: u32,
    pub actual_replicas: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    pub reason: String,
}

/// Result of aggregating the bindings for one workload.
#[derive(Debug, Clone)]
pub struct BindingResolution<'a> {
    pub record: Option<&'a SchedulingRecord>,
    pub placements: Vec<ClusterPlacement>,
    pub status: SchedulingStatus,
    /// Number of records matching the workload (more than one is a
    /// broken precondition).
    pub matches: usize,
}

/// First record governing `workload`, plus the total match count.
pub fn find_binding<'a>(
    records: &'a [SchedulingRecord],
    workload: &WorkloadIdentity,
) -> (Option<&'a SchedulingRecord>, usize) {
    let mut matching = records.iter().filter(|r| r.resource.matches(workload));
    let first = matching.next();
    let extra = matching.count();

    if extra > 0 {
        warn!(
            %workload,
            duplicates = extra + 1,
            "multiple bindings govern one workload, using the first"
        );
    }
    (first, first.map_or(0, |_| extra + 1))
}

/// Build cluster placements and a phase for `workload`.
///
/// `weights` annotates placements with the governing policy's static
/// weights; pass an empty map when there is none.
pub fn aggregate<'a>(
    records: &'a [SchedulingRecord],
    workload: &WorkloadIdentity,
    weights: &HashMap<String, u32>,
) -> BindingResolution<'a> {
    let (record, matches) = find_binding(records, workload);
    let Some(record) = record else {
        return BindingResolution {
            record: None,
            placements: Vec::new(),
            status: SchedulingStatus::no_binding(),
            matches: 0,
        };
    };

    let placements = record
        .clusters
        .iter()
        .map(|target| ClusterPlacement {
            cluster_name: target.name.clone(),
            planned_replicas: target.replicas,
            actual_replicas: extract_replicas(
                record
                    .status_for(&target.name)
                    .and_then(|s| s.status.as_ref()),
            ),
            weight: weights.get(&target.name).copied(),
            reason: format!("{} replicas assigned by the scheduling policy", target.replicas),
        })
        .collect();

    BindingResolution {
        record: Some(record),
        placements,
        status: classify(record),
        matches,
    }
}
