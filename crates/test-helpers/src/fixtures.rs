//! Deterministic fixture values shared across crate tests.

use serde_json::json;
use stampede_types::{Actor, ActorId, CallParams, NetworkId};

/// Actor with a stable, human-readable address derived from `index`.
pub fn actor(index: u32, network: NetworkId) -> Actor {
    Actor::new(ActorId(index), network, format!("wallet-{index:04}"))
}

/// A block of actors, indices `0..count`.
pub fn actors(count: u32, network: NetworkId) -> Vec<Actor> {
    (0..count).map(|i| actor(i, network)).collect()
}

/// Minimal transfer call against `network`.
pub fn transfer_params(network: NetworkId) -> CallParams {
    CallParams::new(network, "transfer").with_args(json!({
        "to": "wallet-9999",
        "amount": "1",
    }))
}
