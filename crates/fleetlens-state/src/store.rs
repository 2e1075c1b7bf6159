//! StateStore: redb-backed snapshot of published control-plane state.
//!
//! Provides typed put/list operations over bindings, policies and
//! clusters. All values are JSON-serialized into redb's `&[u8]` value
//! columns. The store supports both on-disk and in-memory backends (the
//! latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Counts of records written by [`StateStore::import`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub clusters: usize,
    pub bindings: usize,
    pub propagation_policies: usize,
    pub override_policies: usize,
}

/// Thread-safe snapshot store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(BINDINGS).map_err(map_err!(Table))?;
        txn.open_table(PROPAGATION_POLICIES).map_err(map_err!(Table))?;
        txn.open_table(OVERRIDE_POLICIES).map_err(map_err!(Table))?;
        txn.open_table(CLUSTERS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Bindings ───────────────────────────────────────────────────

    /// Insert or update a scheduling record.
    pub fn put_binding(&self, record: &SchedulingRecord) -> StateResult<()> {
        let key = record.table_key();
        self.put_json(BINDINGS, &key, record)?;
        debug!(%key, "binding stored");
        Ok(())
    }

    /// List scheduling records in `namespace`; empty means every namespace.
    ///
    /// Records come back in key order, which is the iteration order
    /// first-match lookups observe.
    pub fn list_bindings(&self, namespace: &str) -> StateResult<Vec<SchedulingRecord>> {
        if namespace.is_empty() {
            self.scan_json(BINDINGS, |_| true)
        } else {
            let prefix = format!("{namespace}/");
            self.scan_json(BINDINGS, |key| key.starts_with(&prefix))
        }
    }

    /// Delete a scheduling record by `{namespace}/{name}`. Returns true if it existed.
    pub fn delete_binding(&self, key: &str) -> StateResult<bool> {
        self.delete_key(BINDINGS, key)
    }

    // ── Policies ───────────────────────────────────────────────────

    /// Insert or update a policy of the given kind.
    pub fn put_policy(&self, kind: PolicyKind, policy: &PolicyRecord) -> StateResult<()> {
        let policy = policy.normalized();
        let key = policy.table_key();
        self.put_json(policy_table(kind), &key, &policy)?;
        debug!(%key, ?kind, "policy stored");
        Ok(())
    }

    /// List namespaced policies in `namespace`; empty means every namespace.
    /// Cluster-scoped policies are never included.
    pub fn list_policies(&self, kind: PolicyKind, namespace: &str) -> StateResult<Vec<PolicyRecord>> {
        let table = policy_table(kind);
        if namespace.is_empty() {
            self.scan_json(table, |key| !key.starts_with('/'))
        } else {
            let prefix = format!("{namespace}/");
            self.scan_json(table, |key| key.starts_with(&prefix))
        }
    }

    /// List cluster-scoped policies.
    pub fn list_cluster_policies(&self, kind: PolicyKind) -> StateResult<Vec<PolicyRecord>> {
        self.scan_json(policy_table(kind), |key| key.starts_with('/'))
    }

    /// Delete a policy by key. Returns true if it existed.
    pub fn delete_policy(&self, kind: PolicyKind, key: &str) -> StateResult<bool> {
        self.delete_key(policy_table(kind), key)
    }

    // ── Clusters ───────────────────────────────────────────────────

    /// Insert or update a member cluster.
    pub fn put_cluster(&self, cluster: &ClusterRecord) -> StateResult<()> {
        self.put_json(CLUSTERS, &cluster.name, cluster)?;
        debug!(cluster = %cluster.name, "cluster stored");
        Ok(())
    }

    /// Get a member cluster by name.
    pub fn get_cluster(&self, name: &str) -> StateResult<Option<ClusterRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(CLUSTERS).map_err(map_err!(Table))?;
        match table.get(name).map_err(map_err!(Read))? {
            Some(guard) => {
                let cluster: ClusterRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(cluster))
            }
            None => Ok(None),
        }
    }

    /// List all member clusters, ordered by name.
    pub fn list_clusters(&self) -> StateResult<Vec<ClusterRecord>> {
        self.scan_json(CLUSTERS, |_| true)
    }

    /// Delete a member cluster. Returns true if it existed.
    pub fn delete_cluster(&self, name: &str) -> StateResult<bool> {
        self.delete_key(CLUSTERS, name)
    }

    // ── Snapshot import ────────────────────────────────────────────

    /// Write every record of a snapshot in a single transaction.
    pub fn import(&self, snapshot: &Snapshot) -> StateResult<ImportSummary> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut clusters = txn.open_table(CLUSTERS).map_err(map_err!(Table))?;
            for cluster in &snapshot.clusters {
                let value = serde_json::to_vec(cluster).map_err(map_err!(Serialize))?;
                clusters
                    .insert(cluster.name.as_str(), value.as_slice())
                    .map_err(map_err!(Write))?;
            }

            let mut bindings = txn.open_table(BINDINGS).map_err(map_err!(Table))?;
            for record in &snapshot.bindings {
                let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
                bindings
                    .insert(record.table_key().as_str(), value.as_slice())
                    .map_err(map_err!(Write))?;
            }

            for (kind, policies) in [
                (PolicyKind::Propagation, &snapshot.propagation_policies),
                (PolicyKind::Override, &snapshot.override_policies),
            ] {
                let mut table = txn.open_table(policy_table(kind)).map_err(map_err!(Table))?;
                for policy in policies.iter().map(PolicyRecord::normalized) {
                    let value = serde_json::to_vec(&policy).map_err(map_err!(Serialize))?;
                    table
                        .insert(policy.table_key().as_str(), value.as_slice())
                        .map_err(map_err!(Write))?;
                }
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;

        let summary = ImportSummary {
            clusters: snapshot.clusters.len(),
            bindings: snapshot.bindings.len(),
            propagation_policies: snapshot.propagation_policies.len(),
            override_policies: snapshot.override_policies.len(),
        };
        info!(?summary, "snapshot imported");
        Ok(summary)
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn put_json<T: Serialize>(&self, table: JsonTable, key: &str, value: &T) -> StateResult<()> {
        let value = serde_json::to_vec(value).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(table).map_err(map_err!(Table))?;
            table
                .insert(key, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn scan_json<T, F>(&self, table: JsonTable, keep: F) -> StateResult<Vec<T>>
    where
        T: DeserializeOwned,
        F: Fn(&str) -> bool,
    {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if keep(key.value()) {
                let record: T =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                results.push(record);
            }
        }
        Ok(results)
    }

    fn delete_key(&self, table: JsonTable, key: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(table).map_err(map_err!(Table))?;
            existed = table.remove(key).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, existed, "record deleted");
        Ok(existed)
    }
}

fn policy_table(kind: PolicyKind) -> JsonTable {
    match kind {
        PolicyKind::Propagation => PROPAGATION_POLICIES,
        PolicyKind::Override => OVERRIDE_POLICIES,
    }
}
