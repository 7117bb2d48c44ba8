//! Environment configuration for the oracle server

pub mod oracle;

pub use oracle::{HttpConfig, LedgerConfig, OracleConfig};
