//! Scheduling relationship graph for the dashboard.
//!
//! Identifiers derive from kind, namespace and name so repeated calls
//! produce the same graph. Positions follow enumeration order.

use std::collections::HashMap;

use fleetlens_core::{WorkloadIdentity, canonical_kind};
use fleetlens_placement::policy_matches;
use fleetlens_state::{ClusterRecord, PolicyRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub const SUMMARY_NODE_ID: &str = "resources-summary";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeNodeKind {
    Resource,
    Policy,
    Cluster,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeEdgeKind {
    Propagate,
    Schedule,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TreeNodeKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: TreeEdgeKind,
    pub label: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulingTree {
    pub nodes: Vec<TreeNode>,
    pub edges: Vec<TreeEdge>,
}

/// What the graph is built around.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeScope {
    /// One workload and the policies that select it.
    Resource(WorkloadIdentity),
    /// Every cluster and every policy in a namespace (empty = all).
    Overview { namespace: String },
}

impl TreeScope {
    /// Single-resource mode needs both a namespace and a name; anything
    /// less is an overview of `namespace`.
    pub fn from_query(resource_type: &str, namespace: &str, resource_name: &str) -> Self {
        if !namespace.is_empty() && !resource_name.is_empty() {
            let kind = if resource_type.is_empty() {
                "Deployment".to_string()
            } else {
                canonical_kind(resource_type)
            };
            Self::Resource(WorkloadIdentity::new(namespace, resource_name, kind))
        } else {
            Self::Overview {
                namespace: namespace.to_string(),
            }
        }
    }
}

pub fn resource_node_id(workload: &WorkloadIdentity) -> String {
    format!("resource-{}-{}", workload.namespace, workload.name)
}

pub fn policy_node_id(policy: &PolicyRecord) -> String {
    match &policy.namespace {
        Some(ns) => format!("policy-{ns}-{}", policy.name),
        None => format!("policy-{}", policy.name),
    }
}

pub fn cluster_node_id(cluster: &str) -> String {
    format!("cluster-{cluster}")
}

fn edge(source: &str, target: &str, kind: TreeEdgeKind) -> TreeEdge {
    let label = match kind {
        TreeEdgeKind::Propagate => "applies policy",
        TreeEdgeKind::Schedule => "schedules to",
    };
    TreeEdge {
        id: format!("edge-{source}-{target}"),
        source: source.to_string(),
        target: target.to_string(),
        kind,
        label: label.to_string(),
        status: "active".to_string(),
    }
}

fn properties(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn cluster_status(cluster: Option<&ClusterRecord>) -> &'static str {
    match cluster {
        Some(c) if c.ready => "ready",
        Some(_) => "not-ready",
        None => "unknown",
    }
}

fn cluster_node(name: &str, cluster: Option<&ClusterRecord>, position: Position) -> TreeNode {
    let props = match cluster {
        Some(c) => json!({"ready": c.ready, "kubernetesVersion": c.kubernetes_version}),
        None => json!({"ready": false}),
    };
    TreeNode {
        id: cluster_node_id(name),
        kind: TreeNodeKind::Cluster,
        name: name.to_string(),
        namespace: String::new(),
        status: cluster_status(cluster).to_string(),
        properties: properties(props),
        position,
    }
}

fn policy_node(policy: &PolicyRecord, position: Position) -> TreeNode {
    TreeNode {
        id: policy_node_id(policy),
        kind: TreeNodeKind::Policy,
        name: policy.name.clone(),
        namespace: policy.namespace_str().to_string(),
        status: "ready".to_string(),
        properties: properties(json!({
            "resourceSelectors": policy.resource_selectors.len(),
            "targetClusters": policy.placement.cluster_names().len(),
            "clusterScoped": policy.is_cluster_scoped(),
        })),
        position,
    }
}

/// Graph around one workload: resource → policy → cluster.
pub fn build_resource_tree(
    workload: &WorkloadIdentity,
    policies: &[PolicyRecord],
    clusters: &[ClusterRecord],
) -> SchedulingTree {
    let known: HashMap<&str, &ClusterRecord> =
        clusters.iter().map(|c| (c.name.as_str(), c)).collect();
    let mut tree = SchedulingTree::default();

    let resource_id = resource_node_id(workload);
    tree.nodes.push(TreeNode {
        id: resource_id.clone(),
        kind: TreeNodeKind::Resource,
        name: workload.name.clone(),
        namespace: workload.namespace.clone(),
        status: "ready".to_string(),
        properties: properties(json!({"kind": workload.kind, "apiVersion": workload.api_version})),
        position: Position { x: 100.0, y: 100.0 },
    });

    let mut seen_clusters: Vec<String> = Vec::new();
    let matching = policies.iter().filter(|p| policy_matches(p, workload));

    for (i, policy) in matching.enumerate() {
        let x = 300.0 + 250.0 * i as f64;
        let node = policy_node(policy, Position { x, y: 100.0 });
        tree.edges
            .push(edge(&resource_id, &node.id, TreeEdgeKind::Propagate));

        for (j, name) in policy.placement.cluster_names().iter().enumerate() {
            let cluster_id = cluster_node_id(name);
            if !seen_clusters.contains(name) {
                seen_clusters.push(name.clone());
                let position = Position {
                    x,
                    y: 250.0 + 80.0 * j as f64,
                };
                tree.nodes
                    .push(cluster_node(name, known.get(name.as_str()).copied(), position));
            }
            tree.edges
                .push(edge(&node.id, &cluster_id, TreeEdgeKind::Schedule));
        }
        tree.nodes.push(node);
    }

    tree
}

/// Graph of every cluster and policy in scope, with a trailing summary.
pub fn build_overview_tree(policies: &[PolicyRecord], clusters: &[ClusterRecord]) -> SchedulingTree {
    let mut tree = SchedulingTree::default();
    let mut cluster_ids: Vec<String> = Vec::new();

    for (i, cluster) in clusters.iter().enumerate() {
        let position = Position {
            x: 100.0,
            y: 100.0 + 100.0 * i as f64,
        };
        tree.nodes
            .push(cluster_node(&cluster.name, Some(cluster), position));
        cluster_ids.push(cluster.name.clone());
    }

    for (i, policy) in policies.iter().enumerate() {
        let node = policy_node(
            policy,
            Position {
                x: 300.0,
                y: 100.0 + 120.0 * i as f64,
            },
        );
        for name in policy.placement.cluster_names() {
            if !cluster_ids.contains(name) {
                // Named by the policy but not registered.
                let position = Position {
                    x: 100.0,
                    y: 100.0 + 100.0 * cluster_ids.len() as f64,
                };
                tree.nodes.push(cluster_node(name, None, position));
                cluster_ids.push(name.clone());
            }
            tree.edges
                .push(edge(&node.id, &cluster_node_id(name), TreeEdgeKind::Schedule));
        }
        tree.nodes.push(node);
    }

    tree.nodes.push(TreeNode {
        id: SUMMARY_NODE_ID.to_string(),
        kind: TreeNodeKind::Summary,
        name: "scheduling overview".to_string(),
        namespace: String::new(),
        status: "active".to_string(),
        properties: properties(json!({
            "totalPolicies": policies.len(),
            "totalClusters": clusters.len(),
        })),
        position: Position { x: 500.0, y: 50.0 },
    });

    tree
}
