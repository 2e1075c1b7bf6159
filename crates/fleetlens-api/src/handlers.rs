//! REST API handlers.
//!
//! Each handler calls the `SchedulingEngine` and returns JSON responses.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use fleetlens_core::WorkloadIdentity;
use fleetlens_placement::{SimulateRequest, VisualSimulateRequest};
use fleetlens_scheduling::{SchedulingError, TreeScope};
use serde::Deserialize;
use tracing::warn;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn engine_error(err: SchedulingError) -> axum::response::Response {
    let status = match &err {
        SchedulingError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };
    warn!(error = %err, %status, "scheduling query failed");
    error_response(&err.to_string(), status).into_response()
}

// ── Workloads ──────────────────────────────────────────────────

/// GET /api/v1/scheduling/workloads/{namespace}/{kind}/{name}
pub async fn get_workload_scheduling(
    State(state): State<ApiState>,
    Path((namespace, kind, name)): Path<(String, String, String)>,
) -> impl IntoResponse {
    let workload = WorkloadIdentity::new(namespace, name, kind);
    match state.engine.resolve_scheduling(&workload).await {
        Ok(view) => ApiResponse::ok(view).into_response(),
        Err(e) => engine_error(e),
    }
}

// ── Simulation ─────────────────────────────────────────────────

/// POST /api/v1/scheduling/simulate
pub async fn simulate(
    State(state): State<ApiState>,
    Json(req): Json<SimulateRequest>,
) -> impl IntoResponse {
    match state.engine.simulate(&req) {
        Ok(result) => ApiResponse::ok(result).into_response(),
        Err(e) => engine_error(e),
    }
}

/// POST /api/v1/scheduling/visual/simulate
pub async fn visual_simulate(
    State(state): State<ApiState>,
    Json(req): Json<VisualSimulateRequest>,
) -> impl IntoResponse {
    ApiResponse::ok(state.engine.simulate_allocation(&req)).into_response()
}

// ── Presentation ───────────────────────────────────────────────

/// Query string of the tree endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TreeQuery {
    pub resource_type: String,
    pub namespace: String,
    pub resource_name: String,
}

/// GET /api/v1/scheduling/tree
pub async fn get_tree(
    State(state): State<ApiState>,
    Query(query): Query<TreeQuery>,
) -> impl IntoResponse {
    let scope = TreeScope::from_query(&query.resource_type, &query.namespace, &query.resource_name);
    match state.engine.build_tree(&scope) {
        Ok(tree) => ApiResponse::ok(tree).into_response(),
        Err(e) => engine_error(e),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NamespaceQuery {
    pub namespace: String,
}

/// GET /api/v1/scheduling/overview
pub async fn get_overview(
    State(state): State<ApiState>,
    Query(query): Query<NamespaceQuery>,
) -> impl IntoResponse {
    match state.engine.overview(&query.namespace) {
        Ok(overview) => ApiResponse::ok(overview).into_response(),
        Err(e) => engine_error(e),
    }
}

/// GET /api/v1/scheduling/clusters/resources
pub async fn get_cluster_resources(State(state): State<ApiState>) -> impl IntoResponse {
    match state.engine.cluster_resources() {
        Ok(clusters) => ApiResponse::ok(clusters).into_response(),
        Err(e) => engine_error(e),
    }
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    ApiResponse::ok("ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetlens_placement::{SimulationLimits, WorkloadSpec};
    use fleetlens_probe::{ClientRegistry, ClusterProbe, ProbeOptions};
    use fleetlens_scheduling::SchedulingEngine;
    use fleetlens_state::{
        BindingStore, ClusterRecord, ClusterResources, NodeSummary, SchedulingRecord, StateError,
        StateResult, StateStore,
    };
    use http_body_util::BodyExt;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn probe() -> ClusterProbe {
        ClusterProbe::new(Arc::new(ClientRegistry::new()), ProbeOptions::default())
    }

    fn test_state() -> ApiState {
        let store = Arc::new(StateStore::open_in_memory().unwrap());
        store
            .put_cluster(&ClusterRecord {
                name: "member1".into(),
                labels: HashMap::new(),
                ready: true,
                kubernetes_version: "v1.30.0".into(),
                taints: vec![],
                resources: ClusterResources::default(),
                node_summary: NodeSummary::default(),
            })
            .unwrap();
        ApiState {
            engine: SchedulingEngine::with_state(store, probe(), SimulationLimits::default()),
        }
    }

    struct Offline;

    impl BindingStore for Offline {
        fn list_bindings(&self, _: &str) -> StateResult<Vec<SchedulingRecord>> {
            Err(StateError::Unavailable("offline".into()))
        }
    }

    fn offline_state() -> ApiState {
        let store = Arc::new(StateStore::open_in_memory().unwrap());
        ApiState {
            engine: SchedulingEngine::new(
                store.clone(),
                Arc::new(Offline),
                store,
                probe(),
                SimulationLimits::default(),
            ),
        }
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unscheduled_workload_is_pending() {
        let resp = get_workload_scheduling(
            State(test_state()),
            Path(("default".into(), "deployment".into(), "nginx".into())),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["schedulingStatus"]["phase"], "Pending");
        assert_eq!(body["data"]["workloadInfo"]["kind"], "Deployment");
    }

    #[tokio::test]
    async fn upstream_failure_is_503() {
        let resp = get_workload_scheduling(
            State(offline_state()),
            Path(("default".into(), "Deployment".into(), "nginx".into())),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("binding"));

        let resp = get_overview(State(offline_state()), Query(NamespaceQuery::default()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn simulate_uses_registered_clusters() {
        let req = SimulateRequest {
            workload: WorkloadSpec {
                kind: "Deployment".into(),
                replicas: 3,
            },
            ..SimulateRequest::default()
        };
        let resp = simulate(State(test_state()), Json(req)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["feasible"], true);
        assert_eq!(body["data"]["schedulingResult"][0]["clusterName"], "member1");
        assert_eq!(body["data"]["schedulingResult"][0]["replicas"], 3);
    }

    #[tokio::test]
    async fn unknown_visual_strategy_is_infeasible_not_an_error() {
        let req = VisualSimulateRequest {
            workload: WorkloadSpec {
                kind: "Deployment".into(),
                replicas: 3,
            },
            clusters: vec!["member1".into()],
            strategy: "Spread".into(),
            weights: HashMap::new(),
        };
        let resp = visual_simulate(State(test_state()), Json(req)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["feasible"], false);
    }

    #[tokio::test]
    async fn tree_name_without_namespace_is_overview() {
        let query = TreeQuery {
            resource_name: "nginx".into(),
            ..TreeQuery::default()
        };
        let resp = get_tree(State(test_state()), Query(query)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        let nodes = body["data"]["nodes"].as_array().unwrap();
        assert_eq!(nodes.last().unwrap()["id"], "resources-summary");
    }

    #[tokio::test]
    async fn overview_tree_has_summary_node() {
        let resp = get_tree(State(test_state()), Query(TreeQuery::default()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        let nodes = body["data"]["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1]["id"], "resources-summary");
    }

    #[tokio::test]
    async fn cluster_resources_list_registered_clusters() {
        let resp = get_cluster_resources(State(test_state())).await.into_response();
        let body = body_json(resp).await;
        assert_eq!(body["data"][0]["name"], "member1");
        assert_eq!(body["data"][0]["loadLevel"], "low");
    }
}
