//! Shard index assignment for newly registered oracles

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{AccountAddress, IndexSet, INDEXES_PER_ORACLE};

/// Chooses the shard indexes an oracle will answer for.
pub trait IndexAssigner: Send {
    fn assign(&mut self, oracle: &AccountAddress) -> IndexSet;
}

/// Draws each index independently and uniformly from `0..shard_space`.
///
/// Indexes of one oracle are allowed to repeat.
pub struct RandomIndexAssigner {
    shard_space: u8,
    rng: StdRng,
}

impl RandomIndexAssigner {
    pub fn new(shard_space: u8) -> Self {
        Self::with_rng(shard_space, StdRng::from_entropy())
    }

    pub fn seeded(shard_space: u8, seed: u64) -> Self {
        Self::with_rng(shard_space, StdRng::seed_from_u64(seed))
    }

    fn with_rng(shard_space: u8, rng: StdRng) -> Self {
        Self {
            shard_space: shard_space.max(1),
            rng,
        }
    }

    pub fn shard_space(&self) -> u8 {
        self.shard_space
    }
}

impl IndexAssigner for RandomIndexAssigner {
    fn assign(&mut self, _oracle: &AccountAddress) -> IndexSet {
        let mut indexes = [0u8; INDEXES_PER_ORACLE];
        for slot in indexes.iter_mut() {
            *slot = self.rng.gen_range(0..self.shard_space);
        }
        IndexSet::new(indexes)
    }
}
