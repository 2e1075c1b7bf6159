//! Replica counts from opaque member-cluster status payloads.
//!
//! Payloads are whatever the member cluster reported. Anything missing,
//! malformed, negative or fractional reads as zero.

use serde_json::Value;

/// Fields consulted for the actual replica count, in priority order.
pub const REPLICA_FIELDS: [&str; 2] = ["readyReplicas", "availableReplicas"];

/// Actual replicas: the first present field of [`REPLICA_FIELDS`], or 0.
pub fn extract_replicas(status: Option<&Value>) -> u32 {
    REPLICA_FIELDS
        .iter()
        .find_map(|field| read_count(status, field))
        .unwrap_or(0)
}

/// A single numeric field, or 0.
pub fn extract_field(status: Option<&Value>, field: &str) -> u32 {
    read_count(status, field).unwrap_or(0)
}

/// Read `field` as a non-negative integer. Floats with no fractional part
/// are accepted; any other value is treated as absent.
fn read_count(status: Option<&Value>, field: &str) -> Option<u32> {
    let value = status?.as_object()?.get(field)?;
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    (f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX)).then_some(f as u32)
}
