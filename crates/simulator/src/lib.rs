//! Archetype-driven load and behavior simulation.
//!
//! This crate sits on top of the execution engine and turns archetype
//! profiles into traffic:
//!
//! ```text
//!   SimulatorConfig (seed) ─▶ per-actor registry + timing generator
//!                                        │
//!       RunReport ◀─ collector ◀─ actor step loop ─▶ engine.execute
//! ```
//!
//! Each actor loop is an independent future. A step either skips, bursts
//! several calls back-to-back, or waits out a profile delay and makes one
//! call. All randomness forks off the configured seed by actor id, so a run
//! with the same seed, population, and target behavior reproduces the same
//! decisions. Lifecycle events stream to broadcast subscribers while
//! aggregate metrics accumulate in the collector; a [`RunReport`] snapshots
//! both at the end of a run.

mod collector;
mod config;
mod events;
mod orchestrator;
mod provider;
mod run;

pub use collector::{ArchetypeSnapshot, MetricsCollector, MetricsSnapshot};
pub use config::SimulatorConfig;
pub use events::{EventBus, RunEvent};
pub use orchestrator::{BehaviorOrchestrator, SimulateOptions};
pub use provider::{ActorProvider, StaticActors};
pub use run::{RunReport, RunStatus, SimulationRun, TimingStats};

use stampede_behavior::BehaviorError;

/// Errors surfaced by simulation runs.
///
/// Execution failures are not here: the engine encodes those into
/// [`ExecutionResult`](stampede_types::ExecutionResult) records so a failing
/// call never aborts a run. These errors are the ones that make the run
/// itself meaningless to continue.
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    /// Archetype or timing-profile lookup or validation failed.
    #[error(transparent)]
    Behavior(#[from] BehaviorError),

    /// An actor index outside the provider's population was requested.
    #[error("actor index {index} out of range; provider holds {count}")]
    ActorIndex { index: u32, count: u32 },
}
