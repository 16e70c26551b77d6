//! Core types for the Stampede load simulator.
//!
//! This crate provides the foundational types used throughout the simulator:
//!
//! - **Identifiers**: ActorId, NetworkId, FunctionId, SequenceKey
//! - **Actors**: the Actor identity produced by a provider
//! - **Call types**: CallParams, ExecutionResult
//! - **Failure taxonomy**: ErrorKind and its retry/rejection classification
//!
//! # Design Philosophy
//!
//! This crate is self-contained with minimal dependencies. It does not depend
//! on any other workspace crates, making it the foundation layer.

mod actor;
mod call;
mod error;
mod identifiers;

pub use actor::Actor;
pub use call::{epoch_ms, CallParams, ExecutionResult};
pub use error::ErrorKind;
pub use identifiers::{ActorId, FunctionId, NetworkId, SequenceKey};
