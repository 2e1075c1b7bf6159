//! `serve` mode: open the state store, wire the engine, run the API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use fleetlens_core::LensConfig;
use fleetlens_placement::SimulationLimits;
use fleetlens_probe::{ClientRegistry, ClusterProbe, ProbeOptions};
use fleetlens_scheduling::SchedulingEngine;
use fleetlens_state::StateStore;
use tracing::{info, warn};

pub async fn run(config: LensConfig) -> anyhow::Result<()> {
    info!("fleetlens daemon starting");

    // ── State store ────────────────────────────────────────────
    if let Some(dir) = config.state.path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create state directory {}", dir.display()))?;
    }
    let store = Arc::new(StateStore::open(&config.state.path)?);
    info!(path = %config.state.path.display(), "state store opened");

    // ── Member clusters ────────────────────────────────────────
    let registry = Arc::new(ClientRegistry::from_endpoints(&config.clusters));
    let options = ProbeOptions::from_config(&config.probe)?;
    info!(
        clusters = config.clusters.len(),
        timeout = ?options.timeout,
        cluster_concurrency = options.cluster_concurrency,
        node_concurrency = options.node_concurrency,
        "cluster probe configured"
    );

    let limits = SimulationLimits {
        max_replicas_per_cluster: config.simulation.max_replicas_per_cluster,
    };
    let engine = SchedulingEngine::with_state(store, ClusterProbe::new(registry, options), limits);

    // ── API server ─────────────────────────────────────────────
    let addr: SocketAddr = config
        .server
        .listen
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server.listen))?;
    let router = fleetlens_api::build_router(engine);

    info!(%addr, "API server starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("fleetlens daemon stopped");
    Ok(())
}
