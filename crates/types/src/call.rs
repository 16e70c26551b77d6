//! Call parameters and per-call results.

use crate::{ErrorKind, FunctionId, NetworkId};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the unix epoch, for result timestamps.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Parameters for one contract call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallParams {
    /// Network the call targets.
    pub network: NetworkId,
    /// Contract entry point to invoke.
    pub function: FunctionId,
    /// Opaque call arguments, forwarded to the target client untouched.
    #[serde(default)]
    pub args: serde_json::Value,
    /// Archetype-generated transaction size, when the behavior layer shaped
    /// this call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_size: Option<f64>,
}

impl CallParams {
    pub fn new(network: NetworkId, function: impl Into<FunctionId>) -> Self {
        Self {
            network,
            function: function.into(),
            args: serde_json::Value::Null,
            transaction_size: None,
        }
    }

    pub fn with_args(mut self, args: serde_json::Value) -> Self {
        self.args = args;
        self
    }

    pub fn with_transaction_size(mut self, size: f64) -> Self {
        self.transaction_size = Some(size);
        self
    }
}

/// Outcome of one logical call, immutable once produced.
///
/// Appended to a run's result set and never revised; the metrics collector
/// derives every aggregate from these records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the call settled successfully.
    pub success: bool,
    /// Settlement identifier returned by the target, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement_id: Option<String>,
    /// Block the settlement landed in, when the target reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reference: Option<u64>,
    /// Human-readable failure detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Taxonomy bucket for the failure, absent on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// True when produced by dry-run-only mode; nothing was submitted.
    #[serde(default)]
    pub simulated: bool,
    /// Sequence slot used for submission. Absent when the call
    /// short-circuited before acquiring one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    /// Margin-adjusted cost estimate checked against the budget.
    pub cost_estimate: f64,
    /// Cost actually charged at settlement (0 when nothing was submitted).
    pub cost_used: f64,
    /// Wall-clock duration of the whole attempt chain.
    pub duration_ms: u64,
    /// Unix-epoch milliseconds when the result was finalized.
    pub timestamp_ms: u64,
}

impl ExecutionResult {
    /// A settled, successful call.
    pub fn settled(
        settlement_id: String,
        block_reference: Option<u64>,
        sequence: u64,
        cost_estimate: f64,
        cost_used: f64,
        duration_ms: u64,
    ) -> Self {
        Self {
            success: true,
            settlement_id: Some(settlement_id),
            block_reference,
            error: None,
            error_kind: None,
            simulated: false,
            sequence: Some(sequence),
            cost_estimate,
            cost_used,
            duration_ms,
            timestamp_ms: epoch_ms(),
        }
    }

    /// A failed or rejected call.
    pub fn failed(
        kind: ErrorKind,
        detail: impl Into<String>,
        sequence: Option<u64>,
        cost_estimate: f64,
        duration_ms: u64,
    ) -> Self {
        Self {
            success: false,
            settlement_id: None,
            block_reference: None,
            error: Some(detail.into()),
            error_kind: Some(kind),
            simulated: false,
            sequence,
            cost_estimate,
            cost_used: 0.0,
            duration_ms,
            timestamp_ms: epoch_ms(),
        }
    }

    /// A dry-run-only preview; nothing was submitted.
    pub fn preview(success: bool, detail: Option<String>, cost_estimate: f64) -> Self {
        Self {
            success,
            settlement_id: None,
            block_reference: None,
            error_kind: if success {
                None
            } else {
                Some(ErrorKind::PredictedRejection)
            },
            error: detail,
            simulated: true,
            sequence: None,
            cost_estimate,
            cost_used: 0.0,
            duration_ms: 0,
            timestamp_ms: epoch_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settled_result_has_no_error_fields() {
        let result =
            ExecutionResult::settled("settle-1".to_string(), Some(99), 4, 0.011, 0.009, 350);
        assert!(result.success);
        assert_eq!(result.sequence, Some(4));
        assert!(result.error.is_none());
        assert!(result.error_kind.is_none());
        assert!(!result.simulated);
    }

    #[test]
    fn failed_result_keeps_the_kind() {
        let result =
            ExecutionResult::failed(ErrorKind::TransientNetwork, "connection reset", None, 0.0, 12);
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::TransientNetwork));
        assert_eq!(result.cost_used, 0.0);
    }

    #[test]
    fn preview_marks_simulated() {
        let result = ExecutionResult::preview(false, Some("would revert".to_string()), 0.02);
        assert!(result.simulated);
        assert_eq!(result.error_kind, Some(ErrorKind::PredictedRejection));
    }
}
