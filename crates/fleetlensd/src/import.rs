//! `import` mode: load a published-state snapshot into the store.

use std::path::Path;

use anyhow::Context;
use fleetlens_core::LensConfig;
use fleetlens_state::{Snapshot, StateStore};
use tracing::info;

pub fn run(config: &LensConfig, file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read(file).with_context(|| format!("read snapshot {}", file.display()))?;
    let snapshot: Snapshot =
        serde_json::from_slice(&raw).with_context(|| format!("parse snapshot {}", file.display()))?;

    if let Some(dir) = config.state.path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let store = StateStore::open(&config.state.path)?;
    let summary = store.import(&snapshot)?;

    info!(
        path = %config.state.path.display(),
        clusters = summary.clusters,
        bindings = summary.bindings,
        propagation_policies = summary.propagation_policies,
        override_policies = summary.override_policies,
        "snapshot imported"
    );
    Ok(())
}
