//! Registry of oracle identities, built once at startup

use futures_util::future::join_all;
use tracing::{info, warn};

use crate::error::{RegistrationError, StartupError};
use crate::models::{AccountAddress, IndexSet, OracleIdentity};
use crate::services::index_assigner::IndexAssigner;
use crate::services::ledger_gateway::LedgerGateway;

/// Immutable set of registered oracles.
///
/// Shared behind an `Arc` by every dispatch task; nothing mutates it after
/// [`OracleRegistry::register`] returns.
#[derive(Debug, Clone, Default)]
pub struct OracleRegistry {
    oracles: Vec<OracleIdentity>,
}

impl OracleRegistry {
    pub fn from_identities(oracles: Vec<OracleIdentity>) -> Self {
        Self { oracles }
    }

    /// Registers the first `count` candidates with the ledger.
    ///
    /// Fails without touching the ledger when fewer than `count` candidates
    /// are available. Candidates the ledger refuses are logged and left out,
    /// so the registry may end up smaller than `count`.
    ///
    /// Indexes come from the ledger when it assigns them; `assigner` only
    /// covers oracles the ledger has no indexes for.
    pub async fn register<G>(
        gateway: &G,
        candidates: &[AccountAddress],
        count: usize,
        assigner: &mut dyn IndexAssigner,
    ) -> Result<Self, StartupError>
    where
        G: LedgerGateway + ?Sized,
    {
        if candidates.len() < count {
            return Err(StartupError::InsufficientCapacity {
                available: candidates.len(),
                required: count,
            });
        }

        let fee = gateway.registration_fee().await?;
        let selected = &candidates[..count];
        info!(count, fee = %fee, "registering oracles");

        let results = join_all(
            selected
                .iter()
                .map(|candidate| enroll(gateway, candidate, fee)),
        )
        .await;

        let mut oracles = Vec::with_capacity(count);
        for (candidate, result) in selected.iter().zip(results) {
            match result {
                Ok(ledger_indexes) => {
                    let indexes = match ledger_indexes {
                        Some(indexes) => indexes,
                        None => assigner.assign(candidate),
                    };
                    info!(
                        oracle = %candidate,
                        indexes = ?indexes.as_array(),
                        ledger_assigned = ledger_indexes.is_some(),
                        "oracle registered"
                    );
                    oracles.push(OracleIdentity {
                        address: candidate.clone(),
                        indexes,
                    });
                }
                Err(err) => {
                    warn!(
                        oracle = %candidate,
                        error = %err,
                        "oracle registration failed; candidate excluded"
                    );
                }
            }
        }

        if oracles.len() < count {
            warn!(
                registered = oracles.len(),
                requested = count,
                "continuing with a reduced oracle registry"
            );
        } else {
            info!(registered = oracles.len(), "oracle registration complete");
        }

        Ok(Self { oracles })
    }

    pub fn len(&self) -> usize {
        self.oracles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oracles.is_empty()
    }

    pub fn identities(&self) -> &[OracleIdentity] {
        &self.oracles
    }

    /// Oracles holding `index`, each listed once, in registration order.
    pub fn matching(&self, index: u8) -> impl Iterator<Item = &OracleIdentity> + '_ {
        self.oracles.iter().filter(move |oracle| oracle.responds_to(index))
    }
}

/// Registers one candidate and reads back the indexes the ledger gave it.
async fn enroll<G>(
    gateway: &G,
    candidate: &AccountAddress,
    fee: u128,
) -> Result<Option<IndexSet>, RegistrationError>
where
    G: LedgerGateway + ?Sized,
{
    gateway.register_identity(candidate, fee).await?;
    Ok(gateway.oracle_indexes(candidate).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(byte: u8, indexes: [u8; 3]) -> OracleIdentity {
        OracleIdentity {
            address: format!("0x{}", hex::encode([byte; 20])).parse().unwrap(),
            indexes: IndexSet::new(indexes),
        }
    }

    #[test]
    fn matching_returns_exactly_the_holders_of_an_index() {
        let registry = OracleRegistry::from_identities(vec![
            identity(1, [1, 4, 7]),
            identity(2, [0, 2, 3]),
            identity(3, [4, 8, 9]),
        ]);

        let matched: Vec<_> = registry.matching(4).map(|o| o.address.clone()).collect();
        assert_eq!(matched, vec![identity(1, [0; 3]).address, identity(3, [0; 3]).address]);
        assert_eq!(registry.matching(5).count(), 0);
    }

    #[test]
    fn duplicate_indexes_match_an_oracle_once() {
        let registry = OracleRegistry::from_identities(vec![identity(9, [6, 6, 6])]);
        assert_eq!(registry.matching(6).count(), 1);
    }
}
