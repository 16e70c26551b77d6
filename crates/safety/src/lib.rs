//! Safety bounds for a simulation run.
//!
//! Three independent guards keep a runaway simulation from doing damage:
//!
//! - [`breaker`]: stops hammering a failing downstream after repeated
//!   consecutive failures, probing recovery after a cooldown.
//! - [`budget`]: hard per-call and cumulative spend caps, checked before any
//!   call is allowed to proceed.
//! - [`retry`]: decides which failures are worth a fresh attempt and how long
//!   to back off between attempts.
//!
//! All three are shared, cross-cutting state visited by every call; their
//! interiors are mutex-guarded and never held across an await.

pub mod breaker;
pub mod budget;
pub mod retry;

pub use breaker::{
    BreakerConfig, BreakerError, BreakerState, BreakerStats, CircuitBreaker, StateChange,
};
pub use budget::{
    AlertSeverity, BudgetAlert, BudgetEnforcer, BudgetError, BudgetLimits, BudgetStatus,
    FitPreview, RecordedCall, UtilizationSummary, UtilizationTier,
};
pub use retry::{RetryConfig, RetryPolicy};
