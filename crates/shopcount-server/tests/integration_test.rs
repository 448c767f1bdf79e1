//! Integration tests for shopcount-server crate.
//!
//! Requests go through the full router against an in-memory SQLite store.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use shopcount_common::test_utils::init_test_logging;
use shopcount_config::{ConfigCache, CONFIG_PATH_VAR};
use shopcount_server::{create_router, AppState, SqliteCountStore};
use std::sync::Arc;
use tower::ServiceExt;

async fn app_with(config: Arc<ConfigCache>) -> Router {
    init_test_logging();
    let store = SqliteCountStore::connect("sqlite::memory:", 1).await.unwrap();
    create_router(AppState::new(store, config))
}

async fn app() -> Router {
    app_with(Arc::new(ConfigCache::default())).await
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn get(app: &Router, uri: &str) -> Response {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn send_json(app: &Router, method: &str, uri: &str, body: &Value) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// Registers BKK-001 and ingests the three-record hourly example.
async fn seeded_app() -> Router {
    let app = app().await;
    let response = send_json(&app, "PUT", "/api/v1/branches/BKK-001", &json!({ "name": "Siam Square" })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let batch = json!({
        "data": [
            { "camera_id": "cam-1", "branch_id": "BKK-001", "timestamp": "2024-01-01T09:15:00",
              "entry_count": 3, "exit_count": 1, "current_count": 10 },
            { "camera_id": "cam-1", "branch_id": "BKK-001", "timestamp": "2024-01-01 09:45:00",
              "entry_count": 2, "exit_count": 0, "current_count": 12 },
            { "camera_id": "cam-2", "branch_id": "BKK-001", "timestamp": "2024-01-01T03:05:00Z",
              "entry_count": 1, "exit_count": 1, "current_count": 12 }
        ]
    });
    let response = send_json(&app, "POST", "/api/v1/counts/batch", &batch).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["count"], 3);
    app
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_daily_report_json() {
    let app = seeded_app().await;
    let response = get(&app, "/api/v1/reports/daily/BKK-001?date=2024-01-01").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

    let body = body_json(response).await;
    assert_eq!(
        body["hourly"],
        json!([
            { "bucket_key": "2024-01-01 09:00:00", "entries": 5, "exits": 1, "max_count": 12 },
            { "bucket_key": "2024-01-01 10:00:00", "entries": 1, "exits": 1, "max_count": 12 }
        ])
    );
    assert_eq!(body["branch"]["name"], "Siam Square");
    assert_eq!(body["summary"]["busiest_sub_period"], "2024-01-01 09:00:00");
}

#[tokio::test]
async fn test_daily_report_csv_download() {
    let app = seeded_app().await;
    let response = get(&app, "/api/v1/reports/daily/BKK-001?date=2024-01-01&format=csv").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"daily_report_BKK-001_2024-01-01.csv\""
    );

    let body = body_text(response).await;
    assert!(body.starts_with("Daily Report,2024-01-01\n"));
    assert!(body.contains("\n2024-01-01 10:00:00,1,1,12\n"));
}

#[tokio::test]
async fn test_current_counts() {
    let app = seeded_app().await;
    let response = get(&app, "/api/v1/counts/current/BKK-001").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["current_count"], 24);
    assert_eq!(body["data"]["cameras"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_history_and_summary() {
    let app = seeded_app().await;

    let response = get(
        &app,
        "/api/v1/counts/history/BKK-001?start_date=2024-01-01&end_date=2024-01-31&interval=week",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["buckets"][0]["bucket_key"], "2024-W01");
    assert_eq!(body["buckets"][0]["entries"], 6);

    let response = get(
        &app,
        "/api/v1/counts/summary/BKK-001?start_date=2024-01-01&end_date=2024-01-07",
    )
    .await;
    let body = body_json(response).await;
    assert_eq!(body["summary"]["total_entries"], 6);
    assert_eq!(body["busy_periods"][0]["bucket_key"], "2024-01-01 09:00:00");
}

#[tokio::test]
async fn test_comparison_report() {
    let app = seeded_app().await;
    let response = get(
        &app,
        "/api/v1/reports/comparison/BKK-001?period1_start=2023-12-25&period1_end=2023-12-31&period2_start=2024-01-01&period2_end=2024-01-07",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["period1"]["entries"], 0);
    assert_eq!(body["period2"]["entries"], 6);
    assert_eq!(body["changes"]["entries_change"], 600.0);
}

#[tokio::test]
async fn test_unknown_branch_is_404() {
    let app = seeded_app().await;
    let response = get(&app, "/api/v1/reports/weekly/CNX-404?date=2024-01-01").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_malformed_input_is_400() {
    let app = seeded_app().await;

    let response = get(&app, "/api/v1/reports/daily/BKK-001?date=01-01-2024").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "validation_error");

    let response = get(
        &app,
        "/api/v1/counts/history/BKK-001?start_date=2024-02-01&end_date=2024-01-01",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "invalid_range");

    let response = get(&app, "/api/v1/reports/monthly/BKK-001?month=2024-13").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(&app, "/api/v1/reports/daily/BKK-001?date=2024-01-01&format=xml").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_rejects_bad_items() {
    let app = seeded_app().await;

    let negative = json!({ "data": [
        { "camera_id": "cam-1", "branch_id": "BKK-001", "timestamp": "2024-01-02T09:00:00",
          "entry_count": -1, "exit_count": 0, "current_count": 0 }
    ]});
    let response = send_json(&app, "POST", "/api/v1/counts/batch", &negative).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "bad_request");

    let bad_time = json!({ "data": [
        { "camera_id": "cam-1", "branch_id": "BKK-001", "timestamp": "noon",
          "entry_count": 1, "exit_count": 0, "current_count": 0 }
    ]});
    let response = send_json(&app, "POST", "/api/v1/counts/batch", &bad_time).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing from the rejected batches was stored
    let response = get(&app, "/api/v1/counts/summary/BKK-001?start_date=2024-01-02&end_date=2024-01-02").await;
    assert_eq!(body_json(response).await["summary"]["total_entries"], 0);
}

#[tokio::test]
async fn test_empty_batch() {
    let app = app().await;
    let response = send_json(&app, "POST", "/api/v1/counts/batch", &json!({ "data": [] })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["count"], 0);
}

#[tokio::test]
async fn test_reloaded_config_changes_default_format() {
    let config = Arc::new(ConfigCache::default());
    let app = app_with(Arc::clone(&config)).await;
    let response = send_json(&app, "PUT", "/api/v1/branches/BKK-001", &json!({ "name": "Siam Square" })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, "/api/v1/reports/daily/BKK-001?date=2024-01-01").await;
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "reports:\n  default_format: csv\n").unwrap();
    config
        .reload_with(|var| (var == CONFIG_PATH_VAR).then(|| path.display().to_string()))
        .unwrap();

    let response = get(&app, "/api/v1/reports/daily/BKK-001?date=2024-01-01").await;
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    assert!(body_text(response).await.starts_with("Daily Report,2024-01-01\n"));
}
