//! fleetlens-core — shared identity types and configuration.
//!
//! Every other fleetlens crate keys its lookups on [`WorkloadIdentity`]
//! and reads its tunables from [`LensConfig`].

pub mod config;
pub mod identity;

pub use config::{
    ClusterEndpoint, ConfigError, LensConfig, ProbeConfig, ServerConfig, SimulationConfig,
    StateConfig, parse_duration,
};
pub use identity::{WorkloadIdentity, canonical_kind, intermediate_owner_kind};
