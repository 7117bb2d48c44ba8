//! Error types for the oracle server
//!
//! Only [`StartupError`] and [`ConfigError`] are fatal. Everything else is
//! recovered by the unit of work that produced it and surfaced through logs.

use thiserror::Error;

/// Invalid or unparseable environment configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a number, got {value:?}")]
    NotANumber { var: &'static str, value: String },

    #[error("{var} out of range: {reason}")]
    OutOfRange { var: &'static str, reason: String },

    #[error("REQUEST_ORIGIN must be `earliest`, `latest` or a ledger sequence, got {0:?}")]
    InvalidOrigin(String),
}

/// Failures that abort the process before the listener subscribes.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("insufficient oracle candidates: {available} available, {required} required")]
    InsufficientCapacity { available: usize, required: usize },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("ledger unavailable during bootstrap: {0}")]
    Ledger(#[from] TransportError),
}

/// Registration of a single candidate failed. The candidate is excluded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("registration fee rejected: {0}")]
    FeeRejected(String),

    #[error("oracle already registered")]
    AlreadyRegistered,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failure to reach the ledger or to decode what it returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("ledger request failed: {0}")]
    Request(String),

    #[error("ledger RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed ledger payload: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}

/// Failure of one response submission. Never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("response rejected: {0}")]
    Rejected(String),

    #[error("submission timed out after {0}s")]
    Timeout(u64),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
