//! Simulated actor identity.

use crate::{ActorId, NetworkId, SequenceKey};
use serde::{Deserialize, Serialize};

/// A simulated actor bound to a target network.
///
/// Produced by an actor provider. Carries what the execution layer needs to
/// submit on the actor's behalf; key material stays behind the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    /// Network this actor's connection is bound to.
    pub network: NetworkId,
    /// On-chain address, used for submission and sequence resync.
    pub address: String,
}

impl Actor {
    pub fn new(id: ActorId, network: NetworkId, address: impl Into<String>) -> Self {
        Self {
            id,
            network,
            address: address.into(),
        }
    }

    /// Sequencing key for calls this actor makes against `network`.
    pub fn sequence_key(&self, network: NetworkId) -> SequenceKey {
        SequenceKey::new(self.id, network)
    }
}
