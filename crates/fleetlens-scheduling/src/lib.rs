//! fleetlens-scheduling — read-side scheduling engine.
//!
//! Reconstructs where a workload's replicas were placed across member
//! clusters by correlating three independently updated sources: the
//! governing policies, the workload's scheduling record (binding), and the
//! live pod listings of each member cluster.
//!
//! # Architecture
//!
//! ```text
//! SchedulingEngine
//!   ├── PolicyResolver ─── PolicyStore (namespaced, then cluster-scoped)
//!   ├── BindingStore ───── aggregate() → ClusterPlacement + phase
//!   │                        └── extract_replicas() per status payload
//!   ├── ClusterStore ───── candidate clusters, trees, resource views
//!   └── ClusterProbe ───── per-cluster NodePlacement fan-out
//! ```
//!
//! `simulate` and `simulate_allocation` delegate to `fleetlens-placement`
//! and never read binding state.
//!
//! # Failure model
//!
//! An unreachable policy or binding store aborts a query with
//! [`SchedulingError::UpstreamUnavailable`]. Member-cluster failures are
//! reported per cluster inside the returned view. Malformed status payloads
//! read as zero replicas.

pub mod binding;
pub mod clusters;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod overview;
pub mod phase;
pub mod resolver;
pub mod tree;
pub mod view;

pub use binding::{BindingResolution, ClusterPlacement, aggregate, find_binding};
pub use clusters::{ClusterResourceView, LoadLevel, ResourceUsage, cluster_views};
pub use engine::SchedulingEngine;
pub use error::{SchedulingError, SchedulingResult};
pub use extractor::{REPLICA_FIELDS, extract_field, extract_replicas};
pub use overview::{
    ClusterDistribution, NamespaceDistribution, OverviewTotals, SchedulingOverview, summarize,
};
pub use phase::{SchedulingPhase, SchedulingStatus, classify};
pub use resolver::{PolicyInfo, PolicyResolver, ResolvedPolicies};
pub use tree::{SchedulingTree, TreeEdge, TreeEdgeKind, TreeNode, TreeNodeKind, TreeScope};
pub use view::{WorkloadInfo, WorkloadSchedulingView};
