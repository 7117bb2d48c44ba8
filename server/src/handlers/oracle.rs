use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::models::{ApiResponse, OracleIdentity};
use crate::services::{DispatchStats, DispatchStatsSnapshot, OracleRegistry};

pub async fn root() -> &'static str {
    "Flight Oracle Server"
}

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn api_info() -> Json<Value> {
    Json(json!({
        "message": "Flight status oracle API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn list_oracles(
    State(registry): State<Arc<OracleRegistry>>,
) -> Json<ApiResponse<Vec<OracleIdentity>>> {
    Json(ApiResponse::ok(registry.identities().to_vec()))
}

pub async fn dispatch_stats(
    State(stats): State<Arc<DispatchStats>>,
) -> Json<ApiResponse<DispatchStatsSnapshot>> {
    Json(ApiResponse::ok(stats.snapshot()))
}
