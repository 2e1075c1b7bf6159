//! API regression tests.
//!
//! Loads a published-state snapshot into a store, wires the engine the way
//! `fleetlensd serve` does, and drives the router end to end.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use fleetlens_api::build_router;
use fleetlens_placement::SimulationLimits;
use fleetlens_probe::{ClientRegistry, ClusterProbe, ProbeOptions};
use fleetlens_scheduling::SchedulingEngine;
use fleetlens_state::{Snapshot, StateStore};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const SNAPSHOT: &str = include_str!("fixtures/snapshot.json");

fn snapshot() -> Snapshot {
    serde_json::from_str(SNAPSHOT).unwrap()
}

fn router_over(store: StateStore) -> Router {
    let probe = ClusterProbe::new(Arc::new(ClientRegistry::new()), ProbeOptions::default());
    let engine = SchedulingEngine::with_state(Arc::new(store), probe, SimulationLimits::default());
    build_router(engine)
}

fn test_router() -> Router {
    let store = StateStore::open_in_memory().unwrap();
    store.import(&snapshot()).unwrap();
    router_over(store)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn healthz() {
    let (status, body) = get(&test_router(), "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], "ok");
}

#[tokio::test]
async fn workload_view_combines_policy_binding_and_probe() {
    let router = test_router();
    let (status, body) = get(&router, "/api/v1/scheduling/workloads/default/deployment/nginx").await;
    assert_eq!(status, StatusCode::OK);
    let view = &body["data"];

    assert_eq!(view["workloadInfo"]["replicas"], 5);
    assert_eq!(view["workloadInfo"]["readyReplicas"], 3);
    assert_eq!(view["propagationPolicy"]["name"], "nginx-propagation");
    assert_eq!(view["overridePolicy"]["name"], "nginx-image-override");

    assert_eq!(
        view["clusterPlacements"],
        json!([
            {
                "clusterName": "member1",
                "plannedReplicas": 3,
                "actualReplicas": 3,
                "weight": 3,
                "reason": "3 replicas assigned by the scheduling policy"
            },
            {
                "clusterName": "member2",
                "plannedReplicas": 2,
                "actualReplicas": 1,
                "weight": 2,
                "reason": "2 replicas assigned by the scheduling policy"
            }
        ])
    );
    assert_eq!(view["schedulingStatus"]["phase"], "Scheduled");
    assert_eq!(view["schedulingStatus"]["message"], "5 replicas scheduled to 2 clusters");

    // No member-cluster clients are configured: each cluster fails alone.
    let probes = view["nodePlacements"].as_array().unwrap();
    assert_eq!(probes.len(), 2);
    assert_eq!(probes[0]["clusterName"], "member1");
    assert!(probes.iter().all(|p| p["error"].is_string()));
}

#[tokio::test]
async fn unknown_workload_is_pending() {
    let (status, body) = get(&test_router(), "/api/v1/scheduling/workloads/default/statefulset/nginx").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["schedulingStatus"]["message"], "no binding found");
    assert_eq!(body["data"]["clusterPlacements"], json!([]));
}

#[tokio::test]
async fn overview_totals_and_distributions() {
    let router = test_router();
    let (status, body) = get(&router, "/api/v1/scheduling/overview").await;
    assert_eq!(status, StatusCode::OK);
    let overview = &body["data"];
    assert_eq!(
        overview["totals"],
        json!({
            "workloads": 2,
            "plannedReplicas": 5,
            "readyReplicas": 4,
            "scheduled": 1,
            "pending": 0,
            "failed": 1
        })
    );
    assert_eq!(overview["perNamespace"][0]["namespace"], "batch");
    assert_eq!(overview["perNamespace"][1]["namespace"], "default");
    assert_eq!(overview["perCluster"].as_array().unwrap().len(), 2);

    let (_, body) = get(&router, "/api/v1/scheduling/overview?namespace=batch").await;
    assert_eq!(body["data"]["totals"]["workloads"], 1);
}

#[tokio::test]
async fn trees_in_both_modes() {
    let router = test_router();

    let (status, body) = get(&router, "/api/v1/scheduling/tree").await;
    assert_eq!(status, StatusCode::OK);
    let nodes = body["data"]["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 6);
    assert_eq!(nodes.last().unwrap()["properties"]["totalPolicies"], 2);
    assert_eq!(body["data"]["edges"].as_array().unwrap().len(), 5);

    let (status, body) = get(
        &router,
        "/api/v1/scheduling/tree?resourceType=deployment&namespace=default&resourceName=nginx",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["data"]["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec![
            "resource-default-nginx",
            "cluster-member1",
            "cluster-member2",
            "policy-default-nginx-propagation"
        ]
    );

    // A name without a namespace falls back to the overview tree.
    let (status, body) = get(&router, "/api/v1/scheduling/tree?resourceName=nginx").await;
    assert_eq!(status, StatusCode::OK);
    let nodes = body["data"]["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 6);
    assert_eq!(nodes.last().unwrap()["id"], "resources-summary");
}

#[tokio::test]
async fn cluster_resources_view() {
    let (status, body) = get(&test_router(), "/api/v1/scheduling/clusters/resources").await;
    assert_eq!(status, StatusCode::OK);
    let clusters = body["data"].as_array().unwrap();
    assert_eq!(clusters.len(), 3);

    assert_eq!(clusters[0]["region"], "eu-west");
    assert_eq!(clusters[0]["loadLevel"], "medium");
    assert_eq!(clusters[0]["capabilities"], json!(["gpu"]));
    assert_eq!(clusters[1]["region"], "us-east");
    assert_eq!(clusters[1]["taints"][0]["key"], "dedicated");
    assert_eq!(clusters[2]["region"], "unknown");
    assert_eq!(clusters[2]["capabilities"], json!(["basic-compute"]));
}

#[tokio::test]
async fn weighted_simulation_keeps_total() {
    let (status, body) = post(
        &test_router(),
        "/api/v1/scheduling/simulate",
        json!({
            "workload": {"kind": "Deployment", "replicas": 10},
            "placement": {
                "clusterAffinity": {"clusterNames": ["member1", "member2", "member3"]},
                "replicaScheduling": {
                    "replicaSchedulingType": "Divided",
                    "weightPreference": {"staticWeightList": [
                        {"targetCluster": {"clusterNames": ["member1"]}, "weight": 3},
                        {"targetCluster": {"clusterNames": ["member2"]}, "weight": 2}
                    ]}
                }
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let replicas: Vec<u64> = body["data"]["schedulingResult"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["replicas"].as_u64().unwrap())
        .collect();
    assert_eq!(replicas, vec![5, 3, 2]);
    assert_eq!(body["data"]["feasible"], true);
}

#[tokio::test]
async fn visual_simulation_uniform_and_unsupported() {
    let router = test_router();
    let (_, body) = post(
        &router,
        "/api/v1/scheduling/visual/simulate",
        json!({
            "workload": {"kind": "Deployment", "replicas": 10},
            "clusters": ["a", "b", "c"],
            "strategy": "Divided"
        }),
    )
    .await;
    let replicas: Vec<u64> = body["data"]["allocation"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["replicas"].as_u64().unwrap())
        .collect();
    assert_eq!(replicas, vec![4, 3, 3]);

    let (status, body) = post(
        &router,
        "/api/v1/scheduling/visual/simulate",
        json!({
            "workload": {"replicas": 3},
            "clusters": ["a"],
            "strategy": "Aggregated"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["feasible"], false);
    assert_eq!(body["data"]["warnings"][0], "unsupported scheduling strategy: Aggregated");
}

#[tokio::test]
async fn file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleetlens.redb");
    {
        let store = StateStore::open(&path).unwrap();
        store.import(&snapshot()).unwrap();
    }

    let router = router_over(StateStore::open(&path).unwrap());
    let (status, body) = get(&router, "/api/v1/scheduling/overview?namespace=default").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totals"]["plannedReplicas"], 5);
}
