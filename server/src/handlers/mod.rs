//! API handlers for the oracle server

pub mod oracle;

pub use oracle::{api_info, dispatch_stats, health_check, list_oracles, root};
