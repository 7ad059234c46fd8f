mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{get, memory_app, post_json, send, unconfigured_app};
use serde_json::json;

#[tokio::test]
async fn root_reports_liveness() {
    let app = unconfigured_app();

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "inquiry-service");
}

#[tokio::test]
async fn health_without_store_reports_unavailable() {
    let app = unconfigured_app();

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "Running");
    assert_eq!(body["available"], false);
    assert_eq!(body["connected"], false);
    assert_eq!(body["state"], "unconfigured");
    assert_eq!(body["databaseUrlSet"], false);
    assert_eq!(body["reachableCollections"], json!([]));
}

#[tokio::test]
async fn health_lists_reachable_collections() {
    let (app, _) = memory_app().await;
    post_json(
        &app,
        "/inquiries",
        &json!({ "name": "Jane", "contact": "jane@example.com" }),
    )
    .await;

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], true);
    assert_eq!(body["connected"], true);
    assert_eq!(body["state"], "connected");
    assert_eq!(body["databaseName"], "inquiry_test");
    assert_eq!(body["reachableCollections"], json!(["inquiry"]));
}

#[tokio::test]
async fn health_survives_unreachable_store() {
    let (app, store) = memory_app().await;
    store.set_unreachable(true);

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], true);
    assert_eq!(body["connected"], false);
    assert_eq!(body["state"], "degraded");
    assert!(body["database"]
        .as_str()
        .unwrap()
        .starts_with("Connected but Error"));
}

#[tokio::test]
async fn legacy_test_route_serves_health() {
    let app = unconfigured_app();

    let (status, body) = get(&app, "/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);
}

#[tokio::test]
async fn readiness_tracks_store_state() {
    let (status, _) = get(&unconfigured_app(), "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (app, store) = memory_app().await;
    let (status, _) = get(&app, "/ready").await;
    assert_eq!(status, StatusCode::OK);

    store.set_unreachable(true);
    let (status, _) = get(&app, "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    store.set_unreachable(false);
    let (status, _) = get(&app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    let (_, health) = get(&app, "/health").await;
    assert_eq!(health["state"], "connected");
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = unconfigured_app();

    let response = {
        use tower::util::ServiceExt;
        app.clone()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    };
    assert_eq!(response.headers()["x-request-id"], "req-42");

    let (status, _) = send(
        &app,
        Request::builder().uri("/").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
