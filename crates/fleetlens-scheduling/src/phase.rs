//! Scheduling phase classification.
//!
//! Rules, first match wins:
//!
//! 1. `Scheduled` condition is False → Failed
//! 2. no target clusters → Pending
//! 3. `FullyApplied` condition is False → Pending
//! 4. `Scheduled` is True, or target clusters exist → Scheduled
//! 5. otherwise → Failed

use fleetlens_state::{ConditionStatus, SchedulingRecord};
use serde::{Deserialize, Serialize};

pub const CONDITION_SCHEDULED: &str = "Scheduled";
pub const CONDITION_FULLY_APPLIED: &str = "FullyApplied";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchedulingPhase {
    Scheduled,
    Pending,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingStatus {
    pub phase: SchedulingPhase,
    pub message: String,
}

impl SchedulingStatus {
    pub fn new(phase: SchedulingPhase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
        }
    }

    /// Status of a workload with no scheduling record.
    pub fn no_binding() -> Self {
        Self::new(SchedulingPhase::Pending, "no binding found")
    }
}

/// Classify from the three inputs the rules look at.
pub fn classify_parts(
    scheduled: Option<ConditionStatus>,
    fully_applied: Option<ConditionStatus>,
    has_clusters: bool,
) -> SchedulingPhase {
    if scheduled == Some(ConditionStatus::False) {
        SchedulingPhase::Failed
    } else if !has_clusters {
        SchedulingPhase::Pending
    } else if fully_applied == Some(ConditionStatus::False) {
        SchedulingPhase::Pending
    } else if scheduled == Some(ConditionStatus::True) || has_clusters {
        SchedulingPhase::Scheduled
    } else {
        SchedulingPhase::Failed
    }
}

/// Classify a scheduling record, with a human-readable message.
pub fn classify(record: &SchedulingRecord) -> SchedulingStatus {
    let scheduled = record.condition(CONDITION_SCHEDULED);
    let fully_applied = record.condition(CONDITION_FULLY_APPLIED);
    let has_clusters = !record.clusters.is_empty();

    let phase = classify_parts(
        scheduled.map(|c| c.status),
        fully_applied.map(|c| c.status),
        has_clusters,
    );

    let condition_message = |c: Option<&fleetlens_state::Condition>| {
        c.map(|c| c.message.as_str())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    };

    let message = match phase {
        SchedulingPhase::Failed if scheduled.is_some() => {
            condition_message(scheduled).unwrap_or_else(|| "scheduling failed".to_string())
        }
        SchedulingPhase::Failed => "scheduling state could not be determined".to_string(),
        SchedulingPhase::Pending if !has_clusters => "no target clusters assigned yet".to_string(),
        SchedulingPhase::Pending => condition_message(fully_applied)
            .unwrap_or_else(|| "not all replicas have been applied".to_string()),
        SchedulingPhase::Scheduled => format!(
            "{} replicas scheduled to {} clusters",
            record.planned_total(),
            record.clusters.len()
        ),
    };

    SchedulingStatus::new(phase, message)
}
