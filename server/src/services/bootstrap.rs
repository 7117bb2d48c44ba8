//! Startup phase: authorize the app contract and build the oracle registry

use tracing::{info, warn};

use crate::config::OracleConfig;
use crate::error::StartupError;
use crate::services::index_assigner::IndexAssigner;
use crate::services::ledger_gateway::LedgerGateway;
use crate::services::oracle_registry::OracleRegistry;

/// Runs everything that must happen before the request listener subscribes.
///
/// The first ledger account authorizes the app contract; a failure there is
/// logged and startup continues, since the ledger may already be
/// authorized. Candidates are the accounts from `account_offset` on.
pub async fn bootstrap_registry<G>(
    gateway: &G,
    config: &OracleConfig,
    assigner: &mut dyn IndexAssigner,
) -> Result<OracleRegistry, StartupError>
where
    G: LedgerGateway + ?Sized,
{
    let accounts = gateway.candidate_accounts().await?;

    match accounts.first() {
        Some(admin) => match gateway.authorize_caller(admin).await {
            Ok(()) => info!(admin = %admin, "app contract authorized on data contract"),
            Err(err) => warn!(admin = %admin, error = %err, "caller authorization failed"),
        },
        None => warn!("ledger exposes no accounts; skipping caller authorization"),
    }

    let candidates = accounts.get(config.account_offset..).unwrap_or_default();
    OracleRegistry::register(gateway, candidates, config.oracle_count, assigner).await
}
