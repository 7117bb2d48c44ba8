//! Subscription loop over ledger oracle requests

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::{OracleIdentity, RequestOrigin, StatusRequest};
use crate::services::dispatch_stats::DispatchStats;
use crate::services::ledger_gateway::LedgerGateway;
use crate::services::oracle_registry::OracleRegistry;
use crate::services::response_dispatcher::{DispatchOutcome, ResponseDispatcher};

pub struct RequestListener {
    registry: Arc<OracleRegistry>,
    gateway: Arc<dyn LedgerGateway>,
    dispatcher: ResponseDispatcher,
    stats: Arc<DispatchStats>,
    origin: RequestOrigin,
}

impl RequestListener {
    pub fn new(
        registry: Arc<OracleRegistry>,
        gateway: Arc<dyn LedgerGateway>,
        dispatcher: ResponseDispatcher,
        stats: Arc<DispatchStats>,
        origin: RequestOrigin,
    ) -> Self {
        Self {
            registry,
            gateway,
            dispatcher,
            stats,
            origin,
        }
    }

    /// Consumes the request subscription until the ledger closes it.
    ///
    /// Bad items are logged and skipped. Submissions are not awaited.
    pub async fn run(&self) {
        let mut requests = self.gateway.subscribe_status_requests(self.origin);
        info!(
            origin = ?self.origin,
            oracles = self.registry.len(),
            "listening for oracle requests"
        );

        while let Some(item) = requests.next().await {
            match item {
                Ok(request) => {
                    self.handle_request(&request);
                }
                Err(err) => warn!(error = %err, "skipping undeliverable oracle request"),
            }
        }

        warn!("oracle request subscription ended");
    }

    /// Dispatches `request` to every oracle holding its index.
    pub fn handle_request(&self, request: &StatusRequest) -> Vec<JoinHandle<DispatchOutcome>> {
        let matches: Vec<&OracleIdentity> = self.registry.matching(request.index).collect();
        self.stats.record_request(matches.len());

        if matches.is_empty() {
            debug!(
                index = request.index,
                flight = %request.subject,
                "no oracle holds request index"
            );
            return Vec::new();
        }

        info!(
            index = request.index,
            flight = %request.subject,
            requested_at = request.requested_at,
            matched = matches.len(),
            "dispatching oracle request"
        );
        self.dispatcher.dispatch(request, matches)
    }
}
