//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, put_json, seed_experiment, EXPERIMENT};

#[tokio::test]
async fn health_check_reports_no_active_experiment() {
    let root = tempfile::tempdir().unwrap();
    let (app, _) = build_test_app(root.path());

    let response = get(app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert!(json["active_experiment"].is_null());
    assert!(json["database"].is_null());
}

#[tokio::test]
async fn health_check_reports_active_experiment() {
    let root = tempfile::tempdir().unwrap();
    seed_experiment(root.path(), EXPERIMENT, true).await;
    let (app, _) = build_test_app(root.path());

    let response = put_json(
        app.clone(),
        "/api/v1/experiments/active",
        serde_json::json!({ "experiment": EXPERIMENT }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get(app, "/health").await).await;
    assert_eq!(json["active_experiment"], EXPERIMENT);
    assert_eq!(json["database"], "ok");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let root = tempfile::tempdir().unwrap();
    let (app, _) = build_test_app(root.path());
    let response = get(app, "/this-route-does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let root = tempfile::tempdir().unwrap();
    let (app, _) = build_test_app(root.path());
    let response = get(app, "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}
