use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of shard indexes held by every oracle.
pub const INDEXES_PER_ORACLE: usize = 3;

/// A ledger account, `0x` followed by 20 hex-encoded bytes.
///
/// Stored lowercased so that equality does not depend on checksum casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountAddress(String);

impl AccountAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountAddress {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| format!("address {trimmed:?} is missing the 0x prefix"))?;

        let bytes = hex::decode(body).map_err(|e| format!("invalid address hex {trimmed:?}: {e}"))?;
        if bytes.len() != 20 {
            return Err(format!(
                "address {trimmed:?} must be 20 bytes, got {}",
                bytes.len()
            ));
        }

        Ok(Self(format!("0x{}", hex::encode(bytes))))
    }
}

impl TryFrom<String> for AccountAddress {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountAddress> for String {
    fn from(address: AccountAddress) -> Self {
        address.0
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The shard indexes an oracle answers for.
///
/// Entries may repeat; membership is what matters for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSet([u8; INDEXES_PER_ORACLE]);

impl IndexSet {
    pub fn new(indexes: [u8; INDEXES_PER_ORACLE]) -> Self {
        Self(indexes)
    }

    pub fn contains(&self, index: u8) -> bool {
        self.0.contains(&index)
    }

    pub fn as_array(&self) -> [u8; INDEXES_PER_ORACLE] {
        self.0
    }
}

/// A registered oracle worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleIdentity {
    pub address: AccountAddress,
    pub indexes: IndexSet,
}

impl OracleIdentity {
    pub fn responds_to(&self, index: u8) -> bool {
        self.indexes.contains(index)
    }
}

/// Identifies the flight a status request is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlightKey {
    pub airline: AccountAddress,
    pub flight: String,
    pub timestamp: u64,
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.flight, self.timestamp, self.airline)
    }
}

/// An `OracleRequest` emitted by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequest {
    pub index: u8,
    pub subject: FlightKey,
    /// Arrival order on the subscription that delivered this request.
    pub requested_at: u64,
}

/// Flight status codes understood by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum FlightStatus {
    Unknown = 0,
    OnTime = 10,
    LateAirline = 20,
    LateWeather = 30,
    LateTechnical = 40,
    LateOther = 50,
}

impl FlightStatus {
    pub const ALL: [FlightStatus; 6] = [
        FlightStatus::Unknown,
        FlightStatus::OnTime,
        FlightStatus::LateAirline,
        FlightStatus::LateWeather,
        FlightStatus::LateTechnical,
        FlightStatus::LateOther,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for FlightStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == code)
            .ok_or_else(|| format!("unknown flight status code {code}"))
    }
}

impl From<FlightStatus> for u8 {
    fn from(status: FlightStatus) -> Self {
        status.code()
    }
}

/// One oracle's answer to one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    pub index: u8,
    pub subject: FlightKey,
    pub status_code: FlightStatus,
    pub responder: AccountAddress,
}

/// Where a request subscription starts reading ledger history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestOrigin {
    /// Replay every request since the first ledger.
    #[default]
    Earliest,
    /// Only requests emitted after subscribing.
    Latest,
    /// Start at a specific ledger sequence.
    Ledger(u64),
}

impl FromStr for RequestOrigin {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "earliest" | "genesis" => Ok(Self::Earliest),
            "latest" | "now" => Ok(Self::Latest),
            other => other
                .parse::<u64>()
                .map(Self::Ledger)
                .map_err(|_| raw.to_string()),
        }
    }
}
