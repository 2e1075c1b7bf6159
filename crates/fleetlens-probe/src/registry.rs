//! Cluster-name-keyed client registry.

use std::collections::HashMap;
use std::sync::Arc;

use fleetlens_core::ClusterEndpoint;
use tokio::sync::RwLock;
use tracing::info;

use crate::client::{HttpClusterClient, MemberClusterClient};

/// Shared lookup of member-cluster clients, safe to use from concurrent
/// probe tasks.
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<String, Arc<dyn MemberClusterClient>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry with one HTTP client per configured endpoint.
    pub fn from_endpoints(endpoints: &[ClusterEndpoint]) -> Self {
        let clients = endpoints
            .iter()
            .map(|e| {
                let client: Arc<dyn MemberClusterClient> = Arc::new(HttpClusterClient::new(e));
                (e.name.clone(), client)
            })
            .collect();
        info!(clusters = endpoints.len(), "member cluster clients configured");
        Self {
            clients: RwLock::new(clients),
        }
    }

    /// Register (or replace) the client for a cluster.
    pub async fn register(&self, cluster: impl Into<String>, client: Arc<dyn MemberClusterClient>) {
        self.clients.write().await.insert(cluster.into(), client);
    }

    pub async fn get(&self, cluster: &str) -> Option<Arc<dyn MemberClusterClient>> {
        self.clients.read().await.get(cluster).cloned()
    }
}
