//! Boundary to the external flight-surety ledger

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::{RegistrationError, SubmissionError, TransportError};
use crate::models::{AccountAddress, IndexSet, RequestOrigin, StatusRequest, StatusResponse};

/// Lazy, unbounded sequence of status requests.
///
/// A transport error affects only the item it is reported on; the stream
/// keeps producing afterwards.
pub type RequestStream = BoxStream<'static, Result<StatusRequest, TransportError>>;

/// Everything the oracle server needs from the ledger.
///
/// Implementations must be safe to call concurrently from many tasks.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Accounts the ledger makes available to this process.
    async fn candidate_accounts(&self) -> Result<Vec<AccountAddress>, TransportError>;

    /// Authorizes the app contract to call into the data contract, sent
    /// from `admin`.
    async fn authorize_caller(&self, admin: &AccountAddress) -> Result<(), TransportError>;

    /// Fee required to register one oracle.
    async fn registration_fee(&self) -> Result<u128, TransportError>;

    /// Registers `candidate` as an oracle, paying `fee`.
    async fn register_identity(
        &self,
        candidate: &AccountAddress,
        fee: u128,
    ) -> Result<(), RegistrationError>;

    /// Indexes the ledger assigned to a registered `oracle`.
    ///
    /// `None` means the ledger leaves index assignment to the caller.
    async fn oracle_indexes(
        &self,
        oracle: &AccountAddress,
    ) -> Result<Option<IndexSet>, TransportError>;

    /// Subscribes to `OracleRequest` events starting at `origin`.
    ///
    /// Delivery is at-least-once. Subscribing again restarts from `origin`.
    fn subscribe_status_requests(&self, origin: RequestOrigin) -> RequestStream;

    /// Submits one oracle's response.
    async fn submit_status_response(&self, response: &StatusResponse)
        -> Result<(), SubmissionError>;
}
