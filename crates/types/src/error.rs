//! Failure taxonomy shared by every layer.
//!
//! Each failed (or rejected) call is tagged with exactly one [`ErrorKind`].
//! The kinds drive three separate decisions:
//!
//! - retry: only transient kinds are re-attempted,
//! - breaker accounting: rejections were never attempted, so they count as
//!   `rejected` rather than `failed`,
//! - report breakdowns: final reports bucket failures by kind.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a failed or rejected call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed configuration or parameters, rejected synchronously.
    Validation,
    /// The actor lacks funds or resources to perform the call.
    InsufficientResources,
    /// Stale or colliding sequence value; coordinator resyncs and retries.
    Sequence,
    /// Cost estimation itself failed.
    CostEstimation,
    /// Dry-run predicted the call would fail; no cost was incurred.
    PredictedRejection,
    /// Transport-level failure that may succeed on re-submission.
    TransientNetwork,
    /// Circuit breaker is open; the call was never attempted.
    BreakerOpen,
    /// Budget cap would be breached; the call was never attempted.
    BudgetExceeded,
    /// Anything that could not be classified.
    Unknown,
}

impl ErrorKind {
    /// All kinds, in report order.
    pub const ALL: [ErrorKind; 9] = [
        ErrorKind::Validation,
        ErrorKind::InsufficientResources,
        ErrorKind::Sequence,
        ErrorKind::CostEstimation,
        ErrorKind::PredictedRejection,
        ErrorKind::TransientNetwork,
        ErrorKind::BreakerOpen,
        ErrorKind::BudgetExceeded,
        ErrorKind::Unknown,
    ];

    /// Whether a fresh attempt (new sequence slot, re-checked budget) may
    /// succeed. Everything else is fatal for the current call.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Sequence | ErrorKind::TransientNetwork)
    }

    /// Whether the call was refused before submission (breaker/budget gates).
    /// Rejections never reach the target and never consume a sequence slot's
    /// settlement.
    pub fn is_rejection(self) -> bool {
        matches!(self, ErrorKind::BreakerOpen | ErrorKind::BudgetExceeded)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::InsufficientResources => "insufficient_resources",
            ErrorKind::Sequence => "sequence",
            ErrorKind::CostEstimation => "cost_estimation",
            ErrorKind::PredictedRejection => "predicted_rejection",
            ErrorKind::TransientNetwork => "transient_network",
            ErrorKind::BreakerOpen => "breaker_open",
            ErrorKind::BudgetExceeded => "budget_exceeded",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
