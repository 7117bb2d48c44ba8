#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};

use flight_oracle_server::error::{RegistrationError, SubmissionError, TransportError};
use flight_oracle_server::models::{
    AccountAddress, FlightKey, IndexSet, RequestOrigin, StatusRequest, StatusResponse,
};
use flight_oracle_server::services::{IndexAssigner, LedgerGateway, RequestStream};

pub const REGISTRATION_FEE: u128 = 1_000_000_000_000_000_000;

pub fn account(n: u32) -> AccountAddress {
    format!("0x{n:040x}").parse().unwrap()
}

pub fn accounts(count: u32) -> Vec<AccountAddress> {
    (0..count).map(account).collect()
}

pub fn status_request(index: u8, requested_at: u64) -> StatusRequest {
    StatusRequest {
        index,
        subject: FlightKey {
            airline: account(9_000),
            flight: "ND1309".to_string(),
            timestamp: 1_700_000_000,
        },
        requested_at,
    }
}

/// In-memory ledger that records every call it receives.
#[derive(Default)]
pub struct MockLedger {
    accounts: Vec<AccountAddress>,
    registration_failures: HashMap<AccountAddress, RegistrationError>,
    submission_failures: HashMap<AccountAddress, SubmissionError>,
    stalled_submitters: HashSet<AccountAddress>,
    ledger_indexes: HashMap<AccountAddress, [u8; 3]>,
    index_lookup_failures: HashSet<AccountAddress>,
    authorization_failure: Option<TransportError>,
    authorizations: Mutex<Vec<AccountAddress>>,
    request_script: Vec<Result<StatusRequest, TransportError>>,
    registrations: Mutex<Vec<(AccountAddress, u128)>>,
    submissions: Mutex<Vec<StatusResponse>>,
    subscriptions: Mutex<Vec<RequestOrigin>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(mut self, accounts: Vec<AccountAddress>) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn failing_registration(mut self, oracle: AccountAddress, err: RegistrationError) -> Self {
        self.registration_failures.insert(oracle, err);
        self
    }

    pub fn failing_submission(mut self, oracle: AccountAddress, err: SubmissionError) -> Self {
        self.submission_failures.insert(oracle, err);
        self
    }

    /// Submissions from `oracle` never complete.
    pub fn stalled_submission(mut self, oracle: AccountAddress) -> Self {
        self.stalled_submitters.insert(oracle);
        self
    }

    /// The ledger reports `indexes` for `oracle` after it registers.
    pub fn with_ledger_indexes(mut self, oracle: AccountAddress, indexes: [u8; 3]) -> Self {
        self.ledger_indexes.insert(oracle, indexes);
        self
    }

    pub fn failing_index_lookup(mut self, oracle: AccountAddress) -> Self {
        self.index_lookup_failures.insert(oracle);
        self
    }

    pub fn failing_authorization(mut self, err: TransportError) -> Self {
        self.authorization_failure = Some(err);
        self
    }

    pub fn with_requests(mut self, script: Vec<Result<StatusRequest, TransportError>>) -> Self {
        self.request_script = script;
        self
    }

    pub fn registrations(&self) -> Vec<(AccountAddress, u128)> {
        self.registrations.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<StatusResponse> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn submitters(&self) -> Vec<AccountAddress> {
        let mut submitters: Vec<_> = self
            .submissions()
            .into_iter()
            .map(|response| response.responder)
            .collect();
        submitters.sort();
        submitters
    }

    pub fn authorizations(&self) -> Vec<AccountAddress> {
        self.authorizations.lock().unwrap().clone()
    }

    pub fn subscriptions(&self) -> Vec<RequestOrigin> {
        self.subscriptions.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerGateway for MockLedger {
    async fn candidate_accounts(&self) -> Result<Vec<AccountAddress>, TransportError> {
        Ok(self.accounts.clone())
    }

    async fn authorize_caller(&self, admin: &AccountAddress) -> Result<(), TransportError> {
        self.authorizations.lock().unwrap().push(admin.clone());
        match &self.authorization_failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn registration_fee(&self) -> Result<u128, TransportError> {
        Ok(REGISTRATION_FEE)
    }

    async fn register_identity(
        &self,
        candidate: &AccountAddress,
        fee: u128,
    ) -> Result<(), RegistrationError> {
        self.registrations
            .lock()
            .unwrap()
            .push((candidate.clone(), fee));
        match self.registration_failures.get(candidate) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn oracle_indexes(
        &self,
        oracle: &AccountAddress,
    ) -> Result<Option<IndexSet>, TransportError> {
        if self.index_lookup_failures.contains(oracle) {
            return Err(TransportError::Request("getMyIndexes timed out".into()));
        }
        Ok(self.ledger_indexes.get(oracle).copied().map(IndexSet::new))
    }

    fn subscribe_status_requests(&self, origin: RequestOrigin) -> RequestStream {
        self.subscriptions.lock().unwrap().push(origin);
        stream::iter(self.request_script.clone()).boxed()
    }

    async fn submit_status_response(
        &self,
        response: &StatusResponse,
    ) -> Result<(), SubmissionError> {
        if self.stalled_submitters.contains(&response.responder) {
            std::future::pending::<()>().await;
        }
        if let Some(err) = self.submission_failures.get(&response.responder) {
            return Err(err.clone());
        }
        self.submissions.lock().unwrap().push(response.clone());
        Ok(())
    }
}

/// Hands out preset index sets in registration order.
pub struct ScriptedAssigner {
    pub script: Vec<[u8; 3]>,
    pub assigned: Vec<AccountAddress>,
}

impl ScriptedAssigner {
    pub fn new(script: Vec<[u8; 3]>) -> Self {
        Self {
            script,
            assigned: Vec::new(),
        }
    }
}

impl IndexAssigner for ScriptedAssigner {
    fn assign(&mut self, oracle: &AccountAddress) -> IndexSet {
        let indexes = self.script[self.assigned.len() % self.script.len()];
        self.assigned.push(oracle.clone());
        IndexSet::new(indexes)
    }
}
