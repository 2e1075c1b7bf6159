//! fleetlens-state — snapshot store for published control-plane state.
//!
//! Backed by [redb](https://docs.rs/redb). Holds the records the scheduling
//! engine reads: scheduling records (bindings), propagation and override
//! policies (namespaced and cluster-scoped), and member clusters.
//!
//! # Architecture
//!
//! All domain types are JSON-serialized into redb's `&[u8]` value columns.
//! Namespaced records use `{namespace}/{name}` keys; cluster-scoped
//! policies use `/{name}` so a prefix scan separates the two.
//!
//! The engine never talks to `StateStore` directly. It goes through the
//! [`PolicyStore`], [`BindingStore`] and [`ClusterStore`] traits so tests
//! can substitute failing or canned stores.

pub mod error;
pub mod store;
pub mod stores;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::{ImportSummary, StateStore};
pub use stores::{BindingStore, ClusterStore, PolicyStore};
pub use types::*;
