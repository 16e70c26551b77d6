//! Execution pipeline for one logical contract call.
//!
//! The orchestrator combines the sequence coordinator, circuit breaker, and
//! budget enforcer around a single call to the target client:
//!
//! ```text
//!   breaker gate ─▶ dry run ─▶ estimate ×margin ─▶ acquire slot
//!                                                      │
//!   release slot ◀─ settle ◀─ submit ◀─ budget check ◀─┘
//! ```
//!
//! The slot is released on every exit path: settled success, predicted
//! failure, budget rejection, submission error. A held slot stalls every
//! later call on the same `(actor, network)` key, so release is a hard
//! requirement, not cleanup.
//!
//! Retryable failures (sequence mismatch, transient network) re-run the whole
//! pipeline with a fresh slot and a fresh budget check, up to the configured
//! attempt cap. Everything else surfaces as a failed [`ExecutionResult`]
//! without aborting the caller's loop.
//!
//! [`ExecutionResult`]: stampede_types::ExecutionResult

mod client;
mod orchestrator;

pub use client::{
    ClientError, DryRunOutcome, PredictedFailure, Settlement, SubmitHandle, SubmitRequest,
    TargetClient,
};
pub use orchestrator::{EngineConfig, EngineError, ExecutionOrchestrator};
