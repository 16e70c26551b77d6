//! Identifier newtypes.
//!
//! Simulated actors are addressed by index within their provider; target
//! networks by a small numeric id assigned in run configuration. Both are
//! cheap `Copy` types so they can travel through log fields and map keys
//! without allocation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a simulated actor within its provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.0)
    }
}

/// Target network a call is bound to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct NetworkId(pub u32);

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "net-{}", self.0)
    }
}

/// Name of a contract entry point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionId(pub String);

impl FunctionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FunctionId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for FunctionId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Composite key for per-actor, per-network sequence state.
///
/// A typed pair rather than a delimited string, so identifiers can never
/// collide through a separator character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceKey {
    pub actor: ActorId,
    pub network: NetworkId,
}

impl SequenceKey {
    pub fn new(actor: ActorId, network: NetworkId) -> Self {
        Self { actor, network }
    }
}

impl fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.actor, self.network)
    }
}
