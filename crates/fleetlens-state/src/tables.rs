//! redb table definitions for the fleetlens state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized records).

use redb::TableDefinition;

/// Every table shares this shape.
pub type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Scheduling records keyed by `{namespace}/{name}`.
pub const BINDINGS: JsonTable = TableDefinition::new("bindings");

/// Propagation policies keyed by `{namespace}/{name}`, or `/{name}` when cluster-scoped.
pub const PROPAGATION_POLICIES: JsonTable = TableDefinition::new("propagation_policies");

/// Override policies, same key layout as propagation policies.
pub const OVERRIDE_POLICIES: JsonTable = TableDefinition::new("override_policies");

/// Member clusters keyed by `{name}`.
pub const CLUSTERS: JsonTable = TableDefinition::new("clusters");
