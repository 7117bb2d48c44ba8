//! Route definitions for the oracle server API

use axum::{routing::get, Router};

use crate::app_state::AppState;
use crate::handlers::*;

// Liveness and info routes
pub fn info_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api", get(api_info))
}

// Read-only oracle routes
pub fn oracle_routes() -> Router<AppState> {
    Router::new()
        .route("/api/oracles", get(list_oracles))
        .route("/api/dispatch/stats", get(dispatch_stats))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(info_routes())
        .merge(oracle_routes())
        .with_state(state)
}
