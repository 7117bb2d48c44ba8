//! Flight Oracle Server
//!
//! Registers a pool of oracles with the flight-surety ledger, answers the
//! ledger's oracle requests for the lifetime of the process, and serves a
//! small read-only HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use tokio::sync::mpsc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use flight_oracle_server::app_state::AppState;
use flight_oracle_server::config::{HttpConfig, OracleConfig};
use flight_oracle_server::error::StartupError;
use flight_oracle_server::routes;
use flight_oracle_server::services::{
    bootstrap_registry, spawn_outcome_collector, supervise, DispatchStats, LedgerGateway,
    RandomIndexAssigner, RandomStatusPolicy, RequestListener, ResponseDispatcher, RestartBackoff,
    RpcLedgerGateway,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = OracleConfig::from_env().map_err(StartupError::from)?;
    let gateway: Arc<dyn LedgerGateway> = Arc::new(RpcLedgerGateway::new(&config.ledger));

    // Register the oracle pool before anything subscribes.
    let mut assigner = RandomIndexAssigner::new(config.shard_space);
    let registry =
        Arc::new(bootstrap_registry(gateway.as_ref(), &config, &mut assigner).await?);

    let stats = Arc::new(DispatchStats::default());
    let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
    spawn_outcome_collector(Arc::clone(&stats), outcome_rx);

    let dispatcher = ResponseDispatcher::new(
        Arc::clone(&gateway),
        Arc::new(RandomStatusPolicy),
        config.submission_timeout,
    )
    .with_outcomes(outcome_tx);

    let listener = Arc::new(RequestListener::new(
        Arc::clone(&registry),
        Arc::clone(&gateway),
        dispatcher,
        Arc::clone(&stats),
        config.request_origin,
    ));

    // A closed subscription is reopened from the configured origin.
    tokio::spawn(supervise(
        move || {
            let listener = Arc::clone(&listener);
            async move { listener.run().await }
        },
        RestartBackoff::default(),
    ));

    let app = routes::router(AppState::new(registry, stats))
        .layer(build_cors_layer(&config.http))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([127, 0, 0, 1], config.http.port));
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_cors_layer(http: &HttpConfig) -> CorsLayer {
    let allowed_origins = http
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(false)
}
