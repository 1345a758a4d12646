mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::ScriptedBackend;
use serde_json::{json, Value};
use strata_sdk::{common_routes_with_ready, data_routes, AppState};
use tower::ServiceExt;

fn app(backend: &ScriptedBackend, debug: bool) -> Router {
    let state = AppState::new(backend.client()).with_debug(debug);
    common_routes_with_ready(state.clone()).merge(data_routes(state))
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn find_many_uses_the_data_envelope() {
    let backend = ScriptedBackend::postgres();
    backend.on_rows("FROM \"users\"", json!([{ "users_id": 1, "users_name": "ann" }]));
    let (status, body) = post(app(&backend, false), "/user/find-many", json!({ "where": { "id": 1 } })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": [{ "id": 1, "name": "ann" }], "meta": { "count": 1 } }));
}

#[tokio::test]
async fn create_answers_created() {
    let backend = ScriptedBackend::postgres();
    backend.on_rows("INSERT INTO \"users\"", json!([{ "users_id": 2, "users_name": "bo" }]));
    backend.on_rows("WHERE \"users\".\"id\" = 2", json!([{ "users_id": 2, "users_name": "bo" }]));
    let (status, body) = post(app(&backend, false), "/user/create", json!({ "data": { "name": "bo" } })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"], json!({ "id": 2, "name": "bo" }));
}

#[tokio::test]
async fn find_first_returns_null_data() {
    let backend = ScriptedBackend::postgres();
    let (status, body) = post(app(&backend, false), "/user/find-first", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": null }));
}

#[tokio::test]
async fn unknown_model_is_not_found() {
    let backend = ScriptedBackend::postgres();
    let (status, body) = post(app(&backend, false), "/ghost/find-many", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn malformed_arguments_are_bad_requests() {
    let backend = ScriptedBackend::postgres();
    let (status, body) = post(app(&backend, false), "/user/find-many", json!({ "limit": "ten" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, _) = post(app(&backend, false), "/user/update", json!([1, 2])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn forced_debug_returns_the_envelope() {
    let backend = ScriptedBackend::postgres();
    backend.fail_on("FROM \"users\"");
    let (status, body) = post(app(&backend, true), "/user/find-many", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], Value::Null);
    assert!(body["sql"].as_str().unwrap().starts_with("SELECT"));
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn ready_reports_dialect() {
    let backend = ScriptedBackend::oracle();
    let req = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let resp = app(&backend, false).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "status": "ok", "dialect": "oracle", "database": "ok" }));
}

#[tokio::test]
async fn update_counts_rows_and_debug_create_is_ok() {
    let backend = ScriptedBackend::postgres();
    backend.on_rows("FROM \"users\" WHERE \"users\".\"id\" = 4", json!([{ "users_id": 4, "users_name": "d" }]));
    backend.on_rows("FROM \"users\" WHERE \"users\".\"id\" = 4", json!([{ "users_id": 4, "users_name": "e" }]));
    let (status, body) = post(
        app(&backend, false),
        "/user/update",
        json!({ "data": { "name": "e" }, "where": { "id": 4 } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": [{ "id": 4, "name": "e" }], "meta": { "count": 1 } }));

    let backend = ScriptedBackend::postgres();
    backend.fail_on("INSERT INTO \"users\"");
    let (status, body) = post(app(&backend, true), "/user/create", json!({ "data": { "name": "x" } })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], Value::Null);
    assert!(body["sql"].as_str().unwrap().ends_with("ROLLBACK"));
}
