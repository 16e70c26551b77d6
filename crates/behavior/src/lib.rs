//! Behavioral shaping: timing profiles and actor archetypes.
//!
//! Everything here is driven by a [`DeterministicRng`](stampede_rng::DeterministicRng),
//! so identical seeds reproduce identical skip decisions, burst patterns,
//! delays, and transaction sizes.
//!
//! - [`timing`]: named delay profiles and the generator that samples them
//!   (triangular spread around the profile midpoint, optional jitter).
//! - [`archetype`]: named behavioral profiles answering "skip this step?",
//!   "burst now?", "how large a transaction?", "is this function in character?".

pub mod archetype;
pub mod timing;

pub use archetype::{
    builtin_archetypes, ArchetypeProfile, ArchetypeRegistry, BurstConfig, SizeDistribution,
    SizeRange,
};
pub use timing::{DelayOptions, TimingGenerator, TimingLogEntry, TimingProfile, TimingStep};

use thiserror::Error;

/// Errors from profile registration and behavioral queries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BehaviorError {
    #[error("unknown timing profile: {0}")]
    UnknownProfile(String),
    #[error("unknown archetype: {0}")]
    UnknownArchetype(String),
    #[error("invalid timing profile {name}: {reason}")]
    InvalidProfile { name: String, reason: String },
    #[error("invalid archetype {name}: {reason}")]
    InvalidArchetype { name: String, reason: String },
    #[error(transparent)]
    Rng(#[from] stampede_rng::RngError),
}
