mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use http_body_util::BodyExt;
use tower::ServiceExt;

use common::account;
use flight_oracle_server::app_state::AppState;
use flight_oracle_server::models::{IndexSet, OracleIdentity};
use flight_oracle_server::routes;
use flight_oracle_server::services::{DispatchStats, OracleRegistry};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn app(stats: Arc<DispatchStats>) -> axum::Router {
    let registry = OracleRegistry::from_identities(vec![
        OracleIdentity {
            address: account(29),
            indexes: IndexSet::new([1, 4, 7]),
        },
        OracleIdentity {
            address: account(30),
            indexes: IndexSet::new([4, 8, 9]),
        },
    ]);
    routes::router(AppState::new(Arc::new(registry), stats))
}

/// Send a GET request via `oneshot` and return (status, raw body).
async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, body) = get(app, uri).await;
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = get(app(Arc::default()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn api_info_is_static_json() {
    let (status, json) = get_json(app(Arc::default()), "/api").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Flight status oracle API");
}

#[tokio::test]
async fn oracles_endpoint_lists_the_registry() {
    let (status, json) = get_json(app(Arc::default()), "/api/oracles").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let oracles = json["data"].as_array().unwrap();
    assert_eq!(oracles.len(), 2);
    assert_eq!(oracles[0]["address"], account(29).to_string());
    assert_eq!(oracles[0]["indexes"], serde_json::json!([1, 4, 7]));
    assert_eq!(oracles[1]["indexes"], serde_json::json!([4, 8, 9]));
}

#[tokio::test]
async fn dispatch_stats_reflect_recorded_requests() {
    let stats = Arc::new(DispatchStats::default());
    stats.record_request(2);
    stats.record_request(0);

    let (status, json) = get_json(app(stats), "/api/dispatch/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["requests_seen"], 2);
    assert_eq!(json["data"]["requests_unmatched"], 1);
    assert_eq!(json["data"]["submissions_failed"], 0);
    assert!(json["data"]["last_completed_at"].is_null());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, _) = get(app(Arc::default()), "/api/flights").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
