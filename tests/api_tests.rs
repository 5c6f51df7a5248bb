//! API integration tests

use std::sync::Arc;

use autolens::api::router;
use autolens::api::server::AppState;
use autolens::config::DashboardConfig;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

const LISTINGS: &str = "price,model_year,model,type,date_posted,days_listed,odometer
9400,2011,bmw x5,SUV,2018-06-23,19,145000
25500,,ford f-150,pickup,2018-10-19,50,88705
5500,2013,hyundai sonata,sedan,2019-02-07,79,
1500,2003,ford f-150,pickup,2019-03-22,9,
";

fn app() -> Router {
    router(Arc::new(AppState::new(DashboardConfig::default())))
}

async fn send(app: &Router, method: Method, uri: &str, body: Body) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Body::from(body.to_string())).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, Body::empty()).await
}

async fn upload(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/api/v1/sessions", Body::from(LISTINGS)).await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

// ═══════════════════════════════════════════════════════════════════════════
// INFO ENDPOINTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_health() {
    let (status, body) = get(&app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["request_id"].as_str().unwrap().len(), 36);
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let (_, body) = get(&app(), "/").await;
    let endpoints = body["data"]["endpoints"].as_array().unwrap();
    assert!(endpoints.iter().any(|e| e["path"] == "/api/v1/sessions"));
}

#[tokio::test]
async fn test_version() {
    let (_, body) = get(&app(), "/version").await;
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}

// ═══════════════════════════════════════════════════════════════════════════
// SESSIONS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_upload_and_view() {
    let app = app();
    let id = upload(&app).await;

    let (status, body) = get(&app, &format!("/api/v1/sessions/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rows"], 4);
    assert_eq!(body["data"]["columns"][0]["name"], "price");
    assert_eq!(body["data"]["columns"][0]["column_type"], "integer");
    assert_eq!(body["data"]["preview"][1][1], Value::Null);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let (status, body) = get(
        &app(),
        "/api/v1/sessions/00000000-0000-0000-0000-000000000000",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_kind"], "session_not_found");
}

#[tokio::test]
async fn test_ragged_csv_is_rejected() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/api/v1/sessions",
        Body::from("a,b\n1,2\n3\n"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_kind"], "invalid_csv");
}

#[tokio::test]
async fn test_missing_and_date_columns() {
    let app = app();
    let id = upload(&app).await;

    let (_, body) = get(&app, &format!("/api/v1/sessions/{}/missing", id)).await;
    let missing: Vec<(String, u64)> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| (m["name"].as_str().unwrap().to_string(), m["missing"].as_u64().unwrap()))
        .collect();
    assert!(missing.contains(&("odometer".to_string(), 2)));
    assert!(missing.contains(&("model_year".to_string(), 1)));

    let (_, body) = get(&app, &format!("/api/v1/sessions/{}/date-columns", id)).await;
    assert_eq!(body["data"]["columns"], json!(["date_posted"]));
}

#[tokio::test]
async fn test_convert_dates() {
    let app = app();
    let id = upload(&app).await;

    let (status, body) = post_json(
        &app,
        &format!("/api/v1/sessions/{}/convert-dates", id),
        json!({ "columns": ["date_posted"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["columns"][4]["column_type"], "date");

    let (status, _) = post_json(
        &app,
        &format!("/api/v1/sessions/{}/convert-dates", id),
        json!({ "columns": ["model"] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_clean_drop_and_fill() {
    let app = app();
    let id = upload(&app).await;

    let (status, body) = post_json(
        &app,
        &format!("/api/v1/sessions/{}/clean", id),
        json!({ "drop": ["odometer"], "fill": ["model_year"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let columns = body["data"]["columns"].as_array().unwrap();
    assert!(columns.iter().all(|c| c["name"] != "odometer"));
    assert!(columns.iter().all(|c| c["missing"] == 0));
}

#[tokio::test]
async fn test_delete_session() {
    let app = app();
    let id = upload(&app).await;
    let uri = format!("/api/v1/sessions/{}", id);

    let (status, body) = send(&app, Method::DELETE, &uri, Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], true);

    let (status, _) = send(&app, Method::DELETE, &uri, Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ═══════════════════════════════════════════════════════════════════════════
// FORMULA COLUMNS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_add_date_column() {
    let app = app();
    let id = upload(&app).await;

    let (status, body) = post_json(
        &app,
        &format!("/api/v1/sessions/{}/columns", id),
        json!({ "name": "date_removed", "formula": "date_posted + days_listed" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["column_type"], "date");
    assert_eq!(body["data"]["rows"], 4);

    let (_, body) = get(&app, &format!("/api/v1/sessions/{}", id)).await;
    assert_eq!(body["data"]["preview"][0][7], "2018-07-12");
}

#[tokio::test]
async fn test_add_column_errors_leave_session_unchanged() {
    let app = app();
    let id = upload(&app).await;
    let uri = format!("/api/v1/sessions/{}/columns", id);

    let (status, body) = post_json(&app, &uri, json!({ "name": "x", "formula": "mileage + 1" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_kind"], "unresolved_reference");

    let (_, body) = post_json(&app, &uri, json!({ "name": "x", "formula": "" })).await;
    assert_eq!(body["error_kind"], "missing_input");

    let (_, body) = post_json(&app, &uri, json!({ "name": "x", "formula": "model + type" })).await;
    assert_eq!(body["error_kind"], "incompatible_operands");

    let (_, body) = get(&app, &format!("/api/v1/sessions/{}", id)).await;
    assert_eq!(body["data"]["columns"].as_array().unwrap().len(), 7);
}

// ═══════════════════════════════════════════════════════════════════════════
// CHARTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_box_chart() {
    let app = app();
    let id = upload(&app).await;

    let (status, body) = post_json(
        &app,
        &format!("/api/v1/sessions/{}/charts", id),
        json!({ "kind": "box", "y": "price", "by": "type" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["kind"], "box");
    assert_eq!(body["data"]["groups"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_histogram_uses_configured_bins() {
    let app = app();
    let id = upload(&app).await;

    let (_, body) = post_json(
        &app,
        &format!("/api/v1/sessions/{}/charts", id),
        json!({ "kind": "histogram", "x": "price" }),
    )
    .await;
    assert_eq!(body["data"]["heights"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn test_oversized_bin_count_is_rejected() {
    let app = app();
    let id = upload(&app).await;
    let uri = format!("/api/v1/sessions/{}/charts", id);

    for bins in [0, 100_000_000, usize::MAX] {
        let (status, body) =
            post_json(&app, &uri, json!({ "kind": "histogram", "x": "price", "bins": bins })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_kind"], "validation_error");
    }

    let (status, _) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_chart_on_text_column_is_rejected() {
    let app = app();
    let id = upload(&app).await;

    let (status, body) = post_json(
        &app,
        &format!("/api/v1/sessions/{}/charts", id),
        json!({ "kind": "scatter", "x": "model", "y": "price" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
