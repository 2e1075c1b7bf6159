//! fleetlens-placement — predicates and replica allocation.
//!
//! This crate answers two questions without touching live state:
//! which workloads and clusters a placement rule selects, and how a
//! replica count would be spread over the selected clusters. The
//! scheduling engine calls it for resolution; the simulation endpoints
//! call it with fully-specified input.
//!
//! # Components
//!
//! - **`selector`**: Resource selector and cluster placement predicates
//! - **`allocator`**: Duplicated / weighted / uniform replica allocation
//! - **`simulate`**: Placement-form and visual simulation with warnings

pub mod allocator;
pub mod selector;
pub mod simulate;

pub use allocator::{Allocation, AllocationMode, SchedulingType, allocate};
pub use selector::{candidate_cluster_names, cluster_matches, policy_matches, selector_matches};
pub use simulate::{
    SchedulingResult, SimulateRequest, SimulateResponse, SimulationLimits, VisualSimulateRequest,
    VisualSimulateResponse, WorkloadSpec, simulate, simulate_allocation,
};
