//! Fan-out of oracle responses to the ledger
//!
//! Every matching oracle gets its own spawned task. A task never retries and
//! never reports back to its siblings; its result is logged and, when an
//! outcome channel is attached, sent there as a [`DispatchOutcome`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tracing::{info, warn};

use crate::error::SubmissionError;
use crate::models::{
    AccountAddress, FlightKey, FlightStatus, OracleIdentity, StatusRequest, StatusResponse,
};
use crate::services::ledger_gateway::LedgerGateway;
use crate::services::status_policy::StatusPolicy;

/// Result of one submission.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub oracle: AccountAddress,
    pub index: u8,
    pub subject: FlightKey,
    pub requested_at: u64,
    pub status_code: FlightStatus,
    pub result: Result<(), SubmissionError>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ResponseDispatcher {
    gateway: Arc<dyn LedgerGateway>,
    policy: Arc<dyn StatusPolicy>,
    submission_timeout: Duration,
    outcomes: Option<UnboundedSender<DispatchOutcome>>,
}

impl ResponseDispatcher {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        policy: Arc<dyn StatusPolicy>,
        submission_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            policy,
            submission_timeout,
            outcomes: None,
        }
    }

    /// Reports every finished submission on `outcomes`.
    pub fn with_outcomes(mut self, outcomes: UnboundedSender<DispatchOutcome>) -> Self {
        self.outcomes = Some(outcomes);
        self
    }

    /// Spawns one submission task per oracle in `matches`.
    ///
    /// The handles are returned for callers that want to observe completion;
    /// dropping them leaves the tasks running.
    pub fn dispatch<'a, I>(
        &self,
        request: &StatusRequest,
        matches: I,
    ) -> Vec<JoinHandle<DispatchOutcome>>
    where
        I: IntoIterator<Item = &'a OracleIdentity>,
    {
        matches
            .into_iter()
            .map(|oracle| {
                let response = StatusResponse {
                    index: request.index,
                    subject: request.subject.clone(),
                    status_code: self.policy.choose(request),
                    responder: oracle.address.clone(),
                };

                tokio::spawn(submit_response(
                    Arc::clone(&self.gateway),
                    response,
                    request.requested_at,
                    self.submission_timeout,
                    self.outcomes.clone(),
                ))
            })
            .collect()
    }
}

async fn submit_response(
    gateway: Arc<dyn LedgerGateway>,
    response: StatusResponse,
    requested_at: u64,
    deadline: Duration,
    outcomes: Option<UnboundedSender<DispatchOutcome>>,
) -> DispatchOutcome {
    let result = match timeout(deadline, gateway.submit_status_response(&response)).await {
        Ok(result) => result,
        Err(_) => Err(SubmissionError::Timeout(deadline.as_secs())),
    };

    match &result {
        Ok(()) => info!(
            oracle = %response.responder,
            index = response.index,
            flight = %response.subject,
            status_code = response.status_code.code(),
            "oracle response submitted"
        ),
        Err(err) => warn!(
            oracle = %response.responder,
            index = response.index,
            flight = %response.subject,
            requested_at,
            error = %err,
            "oracle response was not accepted"
        ),
    }

    let outcome = DispatchOutcome {
        oracle: response.responder,
        index: response.index,
        subject: response.subject,
        requested_at,
        status_code: response.status_code,
        result,
        completed_at: Utc::now(),
    };

    if let Some(outcomes) = outcomes {
        // The collector may already be gone during shutdown.
        let _ = outcomes.send(outcome.clone());
    }

    outcome
}
