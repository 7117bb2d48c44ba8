use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::RequestOrigin;

const DEFAULT_ORACLE_COUNT: usize = 20;
const DEFAULT_ACCOUNT_OFFSET: usize = 29;
const DEFAULT_SHARD_SPACE: u16 = 10;
const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 5;
const DEFAULT_SUBMISSION_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CORS_ALLOWED_ORIGINS: &str = "http://localhost:8000";

/// Where and how to talk to the ledger bridge.
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    pub rpc_url: String,
    pub app_contract_id: String,
    pub data_contract_id: String,
    pub poll_interval: Duration,
}

/// Read-only HTTP surface.
#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

/// Oracle pool settings, read once at startup.
#[derive(Clone, Debug)]
pub struct OracleConfig {
    pub ledger: LedgerConfig,
    pub http: HttpConfig,
    pub oracle_count: usize,
    pub account_offset: usize,
    /// Exclusive upper bound of shard indexes.
    pub shard_space: u8,
    pub request_origin: RequestOrigin,
    pub submission_timeout: Duration,
}

impl OracleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let oracle_count = parse_or(&lookup, "ORACLE_COUNT", DEFAULT_ORACLE_COUNT)?;
        if oracle_count == 0 {
            return Err(ConfigError::OutOfRange {
                var: "ORACLE_COUNT",
                reason: "at least one oracle is required".to_string(),
            });
        }

        let shard_space = parse_or(&lookup, "SHARD_SPACE", DEFAULT_SHARD_SPACE)?;
        let shard_space = u8::try_from(shard_space)
            .ok()
            .filter(|space| *space > 0)
            .ok_or_else(|| ConfigError::OutOfRange {
                var: "SHARD_SPACE",
                reason: format!("{shard_space} is not within 1..=255"),
            })?;

        let request_origin = match lookup("REQUEST_ORIGIN") {
            Some(raw) => raw.parse().map_err(ConfigError::InvalidOrigin)?,
            None => RequestOrigin::default(),
        };

        let poll_seconds = parse_or(
            &lookup,
            "POLL_INTERVAL_SECONDS",
            DEFAULT_POLL_INTERVAL_SECONDS,
        )?;
        let timeout_seconds = parse_or(
            &lookup,
            "SUBMISSION_TIMEOUT_SECONDS",
            DEFAULT_SUBMISSION_TIMEOUT_SECONDS,
        )?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(ToString::to_string)
            .collect();

        Ok(Self {
            ledger: LedgerConfig {
                rpc_url: lookup("LEDGER_RPC_URL")
                    .unwrap_or_else(|| "http://127.0.0.1:8545".to_string()),
                app_contract_id: lookup("FLIGHT_SURETY_APP_ID").unwrap_or_default(),
                data_contract_id: lookup("FLIGHT_SURETY_DATA_ID").unwrap_or_default(),
                poll_interval: Duration::from_secs(poll_seconds.max(1)),
            },
            http: HttpConfig {
                port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
                cors_allowed_origins,
            },
            oracle_count,
            account_offset: parse_or(&lookup, "ORACLE_ACCOUNT_OFFSET", DEFAULT_ACCOUNT_OFFSET)?,
            shard_space,
            request_origin,
            submission_timeout: Duration::from_secs(timeout_seconds.max(1)),
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(value) => {
            let parsed = value.trim().parse();
            parsed.map_err(|_| ConfigError::NotANumber { var, value })
        }
        None => Ok(default),
    }
}
