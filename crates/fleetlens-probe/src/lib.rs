//! fleetlens-probe — node and pod placement discovery on member clusters.
//!
//! Given a workload and a list of member clusters, the probe lists each
//! cluster's nodes, lists the pods scheduled to every node, and keeps the
//! pods that belong to the workload. The result is one `NodePlacement` per
//! node that runs the workload.
//!
//! # Architecture
//!
//! ```text
//! ClusterProbe
//!   ├── ClientRegistry (cluster name → Arc<dyn MemberClusterClient>)
//!   ├── Cluster fan-out (JoinSet + Semaphore, cluster_concurrency)
//!   │   ├── list_nodes()            ── timeout
//!   │   └── Node fan-out (JoinSet + Semaphore, node_concurrency)
//!   │       ├── list_pods_on_node() ── timeout
//!   │       └── match_pod() → NodePlacement
//!   └── Vec<ClusterProbeOutcome> in input order
//! ```
//!
//! # Failure isolation
//!
//! A missing client or failed node listing marks only that cluster's
//! outcome as failed. A failed pod listing drops only that node. Dropping
//! the probe future aborts every in-flight task.

pub mod client;
pub mod error;
pub mod matcher;
pub mod objects;
pub mod probe;
pub mod registry;

pub use client::{BoxFuture, HttpClusterClient, MemberClusterClient};
pub use error::{ProbeError, ProbeResult};
pub use matcher::{OwnershipMatch, match_pod};
pub use objects::{NodeObject, PodObject};
pub use probe::{
    ClusterProbe, ClusterProbeOutcome, NodePlacement, NodeResourceSummary, NodeStatus, PodDetail,
    ProbeOptions,
};
pub use registry::ClientRegistry;
