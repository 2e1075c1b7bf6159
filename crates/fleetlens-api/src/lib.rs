//! fleetlens-api — REST API for the scheduling engine.
//!
//! Thin axum handlers: decode the request, call [`SchedulingEngine`], wrap
//! the result in the `{success, data?, error?}` envelope.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/scheduling/workloads/{namespace}/{kind}/{name}` | Scheduling view of one workload |
//! | POST | `/api/v1/scheduling/simulate` | Simulate a placement rule |
//! | POST | `/api/v1/scheduling/visual/simulate` | Simulate an explicit cluster list |
//! | GET | `/api/v1/scheduling/tree` | Resource or overview scheduling tree |
//! | GET | `/api/v1/scheduling/overview` | Distribution summary |
//! | GET | `/api/v1/scheduling/clusters/resources` | Per-cluster resource view |
//! | GET | `/healthz` | Liveness |

pub mod handlers;

use axum::Router;
use axum::routing::{get, post};
use fleetlens_scheduling::SchedulingEngine;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub engine: SchedulingEngine,
}

/// Build the complete API router.
pub fn build_router(engine: SchedulingEngine) -> Router {
    let state = ApiState { engine };

    let scheduling_routes = Router::new()
        .route(
            "/workloads/{namespace}/{kind}/{name}",
            get(handlers::get_workload_scheduling),
        )
        .route("/simulate", post(handlers::simulate))
        .route("/visual/simulate", post(handlers::visual_simulate))
        .route("/tree", get(handlers::get_tree))
        .route("/overview", get(handlers::get_overview))
        .route("/clusters/resources", get(handlers::get_cluster_resources))
        .with_state(state);

    Router::new()
        .nest("/api/v1/scheduling", scheduling_routes)
        .route("/healthz", get(handlers::healthz))
}
