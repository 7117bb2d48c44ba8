//! Flight Oracle Server Library
//!
//! Registers a pool of flight-status oracles with the surety ledger and
//! answers every `OracleRequest` whose shard index an oracle holds.

pub mod app_state;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
