//! Replica allocation across an ordered cluster list.
//!
//! Divided mode is integer-exact: per-cluster shares are floored and the
//! last cluster takes whatever is left, so the shares always sum to the
//! requested total.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Default weight for clusters missing from a weight map.
pub const DEFAULT_WEIGHT: u32 = 1;

/// Replica scheduling type as published on a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulingType {
    Duplicated,
    Divided,
}

impl SchedulingType {
    /// Parse a published type name. Matching is exact.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Duplicated" => Some(Self::Duplicated),
            "Divided" => Some(Self::Divided),
            _ => None,
        }
    }
}

impl fmt::Display for SchedulingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicated => write!(f, "Duplicated"),
            Self::Divided => write!(f, "Divided"),
        }
    }
}

/// How to spread replicas.
#[derive(Debug, Clone, PartialEq)]
pub enum AllocationMode {
    /// Every cluster runs the full replica count.
    Duplicated,
    /// Split by weight; clusters absent from the map weigh [`DEFAULT_WEIGHT`].
    Weighted(HashMap<String, u32>),
    /// Split evenly; the first `R mod n` clusters get one extra.
    Uniform,
}

impl AllocationMode {
    /// Divided mode picks weighted allocation when weights are given.
    pub fn divided(weights: HashMap<String, u32>) -> Self {
        if weights.is_empty() {
            Self::Uniform
        } else {
            Self::Weighted(weights)
        }
    }
}

/// Replicas assigned to one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub cluster_name: String,
    pub replicas: u32,
    pub reason: String,
}

/// Allocate `replicas` over `clusters` in list order.
///
/// An empty cluster list yields an empty allocation.
pub fn allocate(replicas: u32, clusters: &[String], mode: &AllocationMode) -> Vec<Allocation> {
    if clusters.is_empty() {
        return Vec::new();
    }
    match mode {
        AllocationMode::Duplicated => duplicated(replicas, clusters),
        AllocationMode::Weighted(weights) => weighted(replicas, clusters, weights),
        AllocationMode::Uniform => uniform(replicas, clusters),
    }
}

fn duplicated(replicas: u32, clusters: &[String]) -> Vec<Allocation> {
    clusters
        .iter()
        .map(|name| Allocation {
            cluster_name: name.clone(),
            replicas,
            reason: format!("duplicated: every target cluster runs all {replicas} replicas"),
        })
        .collect()
}

fn weighted(replicas: u32, clusters: &[String], weights: &HashMap<String, u32>) -> Vec<Allocation> {
    let weight_of = |name: &String| weights.get(name).copied().unwrap_or(DEFAULT_WEIGHT);
    let total_weight: u64 = clusters.iter().map(|n| u64::from(weight_of(n))).sum();

    let last = clusters.len() - 1;
    let mut allocated: u32 = 0;
    let mut result = Vec::with_capacity(clusters.len());

    for (i, name) in clusters.iter().enumerate() {
        let weight = weight_of(name);
        let share = if i == last {
            replicas - allocated
        } else if total_weight == 0 {
            0
        } else {
            // floor(R * w / W) <= R, so the narrowing cannot truncate.
            (u64::from(replicas) * u64::from(weight) / total_weight) as u32
        };
        if i != last {
            allocated += share;
        }
        result.push(Allocation {
            cluster_name: name.clone(),
            replicas: share,
            reason: format!("divided by weight {weight}/{total_weight}"),
        });
    }
    result
}

fn uniform(replicas: u32, clusters: &[String]) -> Vec<Allocation> {
    let n = clusters.len() as u32;
    let base = replicas / n;
    let remainder = replicas % n;

    clusters
        .iter()
        .enumerate()
        .map(|(i, name)| Allocation {
            cluster_name: name.clone(),
            replicas: if (i as u32) < remainder { base + 1 } else { base },
            reason: format!("divided evenly across {n} clusters"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn replicas(allocations: &[Allocation]) -> Vec<u32> {
        allocations.iter().map(|a| a.replicas).collect()
    }

    #[test]
    fn weighted_last_cluster_absorbs_remainder() {
        let weights = HashMap::from([("X".to_string(), 2), ("Y".to_string(), 1)]);
        let result = allocate(10, &names(&["X", "Y", "Z"]), &AllocationMode::Weighted(weights));

        assert_eq!(replicas(&result), vec![5, 2, 3]);
        assert_eq!(result[0].reason, "divided by weight 2/4");
        assert_eq!(result[2].reason, "divided by weight 1/4");
    }

    #[test]
    fn uniform_gives_extras_to_leading_clusters() {
        let result = allocate(7, &names(&["a", "b", "c"]), &AllocationMode::Uniform);
        assert_eq!(replicas(&result), vec![3, 2, 2]);
        assert!(result[0].reason.contains("evenly"));
    }

    #[test]
    fn duplicated_copies_full_count() {
        let result = allocate(4, &names(&["a", "b"]), &AllocationMode::Duplicated);
        assert_eq!(replicas(&result), vec![4, 4]);
    }

    #[test]
    fn zero_total_weight_sends_everything_to_last() {
        let weights = HashMap::from([("a".to_string(), 0), ("b".to_string(), 0)]);
        let result = allocate(6, &names(&["a", "b"]), &AllocationMode::Weighted(weights));
        assert_eq!(replicas(&result), vec![0, 6]);
    }

    #[test]
    fn zero_replicas_and_empty_clusters() {
        assert!(allocate(5, &[], &AllocationMode::Uniform).is_empty());
        let result = allocate(0, &names(&["a", "b"]), &AllocationMode::Uniform);
        assert_eq!(replicas(&result), vec![0, 0]);
    }

    #[test]
    fn large_weights_do_not_overflow() {
        let weights = HashMap::from([("a".to_string(), u32::MAX), ("b".to_string(), u32::MAX)]);
        let result = allocate(u32::MAX, &names(&["a", "b"]), &AllocationMode::Weighted(weights));
        let total: u64 = result.iter().map(|a| u64::from(a.replicas)).sum();
        assert_eq!(total, u64::from(u32::MAX));
    }

    #[test]
    fn divided_without_weights_is_uniform() {
        assert_eq!(AllocationMode::divided(HashMap::new()), AllocationMode::Uniform);
        assert!(matches!(
            AllocationMode::divided(HashMap::from([("a".to_string(), 1)])),
            AllocationMode::Weighted(_)
        ));
    }

    #[test]
    fn scheduling_type_parse() {
        assert_eq!(SchedulingType::parse("Divided"), Some(SchedulingType::Divided));
        assert_eq!(SchedulingType::parse("Duplicated"), Some(SchedulingType::Duplicated));
        assert_eq!(SchedulingType::parse("divided"), None);
        assert_eq!(SchedulingType::Divided.to_string(), "Divided");
    }
}
