//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::services::{DispatchStats, OracleRegistry};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<OracleRegistry>,
    pub stats: Arc<DispatchStats>,
}

impl AppState {
    pub fn new(registry: Arc<OracleRegistry>, stats: Arc<DispatchStats>) -> Self {
        Self { registry, stats }
    }
}

impl FromRef<AppState> for Arc<OracleRegistry> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

impl FromRef<AppState> for Arc<DispatchStats> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.stats.clone()
    }
}
