//! JSON-RPC ledger gateway
//!
//! Talks to the flight-surety ledger bridge over HTTP. Requests are read by
//! polling `getEvents` and following the ledger's paging cursor, so the
//! subscription is at-least-once: a restart replays from the origin.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures_util::stream;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::error::{RegistrationError, SubmissionError, TransportError};
use crate::models::{
    AccountAddress, FlightKey, IndexSet, RequestOrigin, StatusRequest, StatusResponse,
    INDEXES_PER_ORACLE,
};
use crate::services::ledger_gateway::{LedgerGateway, RequestStream};

const ALREADY_REGISTERED_CODE: i64 = -32010;
const FEE_REJECTED_CODE: i64 = -32011;
const RESPONSE_REJECTED_CODE: i64 = -32020;

const ORACLE_REQUEST_EVENT: &str = "OracleRequest";
const EVENT_PAGE_LIMIT: u64 = 200;

#[derive(Clone)]
pub struct RpcLedgerGateway {
    rpc_url: String,
    app_contract_id: String,
    data_contract_id: String,
    poll_interval: Duration,
    http: Client,
}

/// Read position of one subscription.
#[derive(Debug)]
struct PollCursor {
    origin: RequestOrigin,
    start_ledger: Option<u64>,
    paging_token: Option<String>,
    arrivals: u64,
    pending: VecDeque<Result<StatusRequest, TransportError>>,
}

impl PollCursor {
    fn new(origin: RequestOrigin) -> Self {
        Self {
            origin,
            start_ledger: None,
            paging_token: None,
            arrivals: 0,
            pending: VecDeque::new(),
        }
    }

    /// Queues the requests in one fetched page and moves the read position
    /// past it.
    fn absorb(&mut self, events: &[Value], next_token: Option<String>) {
        for raw in events {
            match parse_request_event(raw, self.arrivals) {
                Some(Ok(request)) => {
                    self.arrivals += 1;
                    self.pending.push_back(Ok(request));
                }
                Some(Err(err)) => self.pending.push_back(Err(err)),
                None => {}
            }
        }

        if next_token.is_some() {
            self.paging_token = next_token;
            return;
        }
        if events.is_empty() {
            return;
        }

        let start_ledger = self.start_ledger.unwrap_or_default();
        let next_ledger = match events
            .iter()
            .filter_map(|raw| raw.pointer("/ledger").and_then(Value::as_u64))
            .max()
        {
            Some(max_ledger) => max_ledger.saturating_add(1),
            None => {
                warn!(
                    start_ledger,
                    fetched = events.len(),
                    "event page carries no cursor or ledger; skipping past start ledger"
                );
                start_ledger.saturating_add(1)
            }
        };
        self.start_ledger = Some(next_ledger.max(start_ledger.saturating_add(1)));
        self.paging_token = None;
    }
}

impl RpcLedgerGateway {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            rpc_url: config.rpc_url.clone(),
            app_contract_id: config.app_contract_id.clone(),
            data_contract_id: config.data_contract_id.clone(),
            poll_interval: config.poll_interval,
            http: Client::new(),
        }
    }

    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let response = self
            .http
            .post(&self.rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": "flight-oracle-server",
                "method": method,
                "params": params,
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        if let Some(err) = response.get("error") {
            return Err(TransportError::Rpc {
                code: err.pointer("/code").and_then(Value::as_i64).unwrap_or_default(),
                message: err
                    .pointer("/message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown RPC error")
                    .to_string(),
            });
        }

        response
            .get("result")
            .cloned()
            .ok_or_else(|| TransportError::Malformed(format!("{method}: missing result")))
    }

    async fn fetch_latest_ledger(&self) -> Result<u64, TransportError> {
        self.rpc_call("getLatestLedger", json!({}))
            .await?
            .pointer("/sequence")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                TransportError::Malformed("missing latest ledger sequence in RPC response".into())
            })
    }

    async fn fetch_events(
        &self,
        start_ledger: u64,
        paging_token: Option<&str>,
    ) -> Result<(Vec<Value>, Option<String>), TransportError> {
        let filters = json!([{
            "type": "contract",
            "contractIds": [self.app_contract_id],
            "topics": [[ORACLE_REQUEST_EVENT]],
        }]);

        let params = match paging_token {
            Some(token) => json!({
                "filters": filters,
                "pagination": { "cursor": token, "limit": EVENT_PAGE_LIMIT },
            }),
            None => json!({
                "startLedger": start_ledger,
                "filters": filters,
                "pagination": { "limit": EVENT_PAGE_LIMIT },
            }),
        };

        let result = self.rpc_call("getEvents", params).await?;
        let events = result
            .pointer("/events")
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default();

        let next_token = result
            .pointer("/cursor")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .or_else(|| events.last().and_then(paging_token_of));

        Ok((events, next_token))
    }

    /// Fetches one page of events into `cursor.pending`.
    async fn poll_requests(&self, cursor: &mut PollCursor) -> Result<(), TransportError> {
        let start_ledger = match cursor.start_ledger {
            Some(ledger) => ledger,
            None => {
                let ledger = match cursor.origin {
                    RequestOrigin::Earliest => 0,
                    RequestOrigin::Ledger(sequence) => sequence,
                    RequestOrigin::Latest => self.fetch_latest_ledger().await?.saturating_add(1),
                };
                info!(start_ledger = ledger, "subscribed to oracle requests");
                cursor.start_ledger = Some(ledger);
                ledger
            }
        };

        let (events, next_token) = self
            .fetch_events(start_ledger, cursor.paging_token.as_deref())
            .await?;
        cursor.absorb(&events, next_token);

        debug!(fetched = events.len(), "polled oracle request events");
        Ok(())
    }
}

#[async_trait]
impl LedgerGateway for RpcLedgerGateway {
    async fn candidate_accounts(&self) -> Result<Vec<AccountAddress>, TransportError> {
        let result = self.rpc_call("getAccounts", json!({})).await?;
        let accounts = result
            .as_array()
            .ok_or_else(|| TransportError::Malformed("getAccounts: expected an array".into()))?;

        accounts
            .iter()
            .map(|account| -> Result<AccountAddress, TransportError> {
                account
                    .as_str()
                    .ok_or_else(|| {
                        TransportError::Malformed("getAccounts: non-string account".into())
                    })?
                    .parse::<AccountAddress>()
                    .map_err(TransportError::Malformed)
            })
            .collect()
    }

    async fn authorize_caller(&self, admin: &AccountAddress) -> Result<(), TransportError> {
        self.rpc_call(
            "authorizeCaller",
            json!({
                "from": admin,
                "contractId": self.data_contract_id,
                "caller": self.app_contract_id,
            }),
        )
        .await
        .map(|_| ())
    }

    async fn registration_fee(&self) -> Result<u128, TransportError> {
        let result = self.rpc_call("registrationFee", json!({})).await?;
        json_u128(&result)
            .ok_or_else(|| TransportError::Malformed(format!("registrationFee: {result}")))
    }

    async fn register_identity(
        &self,
        candidate: &AccountAddress,
        fee: u128,
    ) -> Result<(), RegistrationError> {
        self.rpc_call(
            "registerOracle",
            json!({ "from": candidate, "value": fee.to_string() }),
        )
        .await
        .map(|_| ())
        .map_err(registration_error)
    }

    async fn oracle_indexes(
        &self,
        oracle: &AccountAddress,
    ) -> Result<Option<IndexSet>, TransportError> {
        let result = self
            .rpc_call("getMyIndexes", json!({ "from": oracle }))
            .await?;
        decode_indexes(&result).map(Some)
    }

    fn subscribe_status_requests(&self, origin: RequestOrigin) -> RequestStream {
        let gateway = self.clone();

        Box::pin(stream::unfold(
            (gateway, PollCursor::new(origin)),
            |(gateway, mut cursor)| async move {
                loop {
                    if let Some(item) = cursor.pending.pop_front() {
                        return Some((item, (gateway, cursor)));
                    }

                    match gateway.poll_requests(&mut cursor).await {
                        Ok(()) if cursor.pending.is_empty() => sleep(gateway.poll_interval).await,
                        Ok(()) => {}
                        Err(err) => {
                            sleep(gateway.poll_interval).await;
                            return Some((Err(err), (gateway, cursor)));
                        }
                    }
                }
            },
        ))
    }

    async fn submit_status_response(
        &self,
        response: &StatusResponse,
    ) -> Result<(), SubmissionError> {
        self.rpc_call(
            "submitOracleResponse",
            json!({
                "from": response.responder,
                "index": response.index,
                "airline": response.subject.airline,
                "flight": response.subject.flight,
                "timestamp": response.subject.timestamp,
                "statusCode": response.status_code,
            }),
        )
        .await
        .map(|_| ())
        .map_err(submission_error)
    }
}

fn registration_error(err: TransportError) -> RegistrationError {
    match err {
        TransportError::Rpc {
            code: ALREADY_REGISTERED_CODE,
            ..
        } => RegistrationError::AlreadyRegistered,
        TransportError::Rpc {
            code: FEE_REJECTED_CODE,
            message,
        } => RegistrationError::FeeRejected(message),
        other => RegistrationError::Transport(other),
    }
}

fn submission_error(err: TransportError) -> SubmissionError {
    match err {
        TransportError::Rpc {
            code: RESPONSE_REJECTED_CODE,
            message,
        } => SubmissionError::Rejected(message),
        other => SubmissionError::Transport(other),
    }
}

/// `getMyIndexes` answers with exactly three small integers.
fn decode_indexes(result: &Value) -> Result<IndexSet, TransportError> {
    let malformed = || TransportError::Malformed(format!("getMyIndexes: {result}"));

    let raw = result.as_array().ok_or_else(malformed)?;
    if raw.len() != INDEXES_PER_ORACLE {
        return Err(malformed());
    }

    let mut indexes = [0u8; INDEXES_PER_ORACLE];
    for (slot, value) in indexes.iter_mut().zip(raw) {
        *slot = json_u128(value)
            .and_then(|index| u8::try_from(index).ok())
            .ok_or_else(malformed)?;
    }
    Ok(IndexSet::new(indexes))
}

/// Parses a raw `getEvents` entry.
///
/// Returns `None` for events that are not oracle requests.
fn parse_request_event(raw: &Value, arrival: u64) -> Option<Result<StatusRequest, TransportError>> {
    let event_name = raw
        .pointer("/type")
        .or_else(|| raw.pointer("/eventType"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .or_else(|| extract_topic_symbol(raw.pointer("/topic").or_else(|| raw.pointer("/topics"))));

    if event_name.as_deref() != Some(ORACLE_REQUEST_EVENT) {
        return None;
    }

    let payload = raw
        .pointer("/value")
        .or_else(|| raw.pointer("/data"))
        .unwrap_or(&Value::Null);

    Some(decode_request(payload, arrival))
}

fn decode_request(payload: &Value, arrival: u64) -> Result<StatusRequest, TransportError> {
    let field = |name: &str| {
        payload
            .get(name)
            .ok_or_else(|| TransportError::Malformed(format!("OracleRequest without {name}")))
    };

    let index = json_u128(field("index")?)
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| TransportError::Malformed(format!("bad OracleRequest index: {payload}")))?;

    let airline = field("airline")?
        .as_str()
        .ok_or_else(|| TransportError::Malformed("OracleRequest airline is not a string".into()))?
        .parse::<AccountAddress>()
        .map_err(TransportError::Malformed)?;

    let flight = field("flight")?
        .as_str()
        .ok_or_else(|| TransportError::Malformed("OracleRequest flight is not a string".into()))?
        .to_string();

    let timestamp = json_u128(field("timestamp")?)
        .and_then(|ts| u64::try_from(ts).ok())
        .ok_or_else(|| {
            TransportError::Malformed(format!("bad OracleRequest timestamp: {payload}"))
        })?;

    Ok(StatusRequest {
        index,
        subject: FlightKey {
            airline,
            flight,
            timestamp,
        },
        requested_at: arrival,
    })
}

/// Ledger integers arrive either as JSON numbers or decimal strings.
fn json_u128(value: &Value) -> Option<u128> {
    match value {
        Value::Number(n) => n.as_u64().map(u128::from),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn extract_topic_symbol(value: Option<&Value>) -> Option<String> {
    let topics = value?.as_array()?;
    topics
        .first()
        .and_then(|topic| {
            topic
                .as_str()
                .or_else(|| topic.pointer("/symbol").and_then(Value::as_str))
                .or_else(|| topic.pointer("/value").and_then(Value::as_str))
        })
        .map(ToString::to_string)
}

fn paging_token_of(event: &Value) -> Option<String> {
    event
        .pointer("/pagingToken")
        .or_else(|| event.pointer("/paging_token"))
        .or_else(|| event.pointer("/id"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
}
