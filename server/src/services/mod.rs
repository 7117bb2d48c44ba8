//! Oracle registration and request dispatch services

pub mod bootstrap;
pub mod dispatch_stats;
pub mod index_assigner;
pub mod ledger_gateway;
pub mod listener_supervisor;
pub mod oracle_registry;
pub mod request_listener;
pub mod response_dispatcher;
pub mod rpc_ledger_gateway;
pub mod status_policy;

pub use bootstrap::bootstrap_registry;
pub use dispatch_stats::{spawn_outcome_collector, DispatchStats, DispatchStatsSnapshot};
pub use index_assigner::{IndexAssigner, RandomIndexAssigner};
pub use ledger_gateway::{LedgerGateway, RequestStream};
pub use listener_supervisor::{supervise, RestartBackoff};
pub use oracle_registry::OracleRegistry;
pub use request_listener::RequestListener;
pub use response_dispatcher::{DispatchOutcome, ResponseDispatcher};
pub use rpc_ledger_gateway::RpcLedgerGateway;
pub use status_policy::{FixedStatusPolicy, RandomStatusPolicy, StatusPolicy};
