//! Actor supply for simulation runs.
//!
//! The orchestrator never constructs actors itself; it asks an
//! [`ActorProvider`] for them by index. Production embeddings back this with
//! real wallet infrastructure; [`StaticActors`] derives a stable synthetic
//! population from a seed.

use crate::SimulatorError;
use async_trait::async_trait;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use stampede_types::{Actor, ActorId, NetworkId};

/// Source of simulated actor identities.
#[async_trait]
pub trait ActorProvider: Send + Sync {
    /// The actor at `index`, bound to `network`. Indices run `0..count()`.
    async fn actor(&self, index: u32, network: NetworkId) -> Result<Actor, SimulatorError>;

    /// How many actors this provider can supply.
    fn count(&self) -> u32;
}

/// A fixed-size population with addresses derived deterministically from a
/// seed.
///
/// The same `(seed, index)` always yields the same address, across processes,
/// so sequence state and on-target balances line up between repeated runs.
pub struct StaticActors {
    seed: u64,
    count: u32,
}

impl StaticActors {
    pub fn new(count: u32, seed: u64) -> Self {
        Self { seed, count }
    }

    fn derive_address(&self, index: u32) -> String {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(u64::from(index)));
        let mut bytes = [0u8; 20];
        rng.fill_bytes(&mut bytes);
        format!("0x{}", hex::encode(bytes))
    }
}

#[async_trait]
impl ActorProvider for StaticActors {
    async fn actor(&self, index: u32, network: NetworkId) -> Result<Actor, SimulatorError> {
        if index >= self.count {
            return Err(SimulatorError::ActorIndex {
                index,
                count: self.count,
            });
        }
        Ok(Actor::new(
            ActorId(index),
            network,
            self.derive_address(index),
        ))
    }

    fn count(&self) -> u32 {
        self.count
    }
}
