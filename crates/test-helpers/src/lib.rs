//! Test helpers for Stampede - scripted collaborator doubles.
//!
//! This crate provides a [`ScriptedTarget`] standing in for the contract
//! under test and a [`ScriptedChain`](chain::ScriptedChain) standing in for
//! the chain reader, so tests can drive the execution pipeline through exact
//! failure sequences without any network.
//!
//! # Example
//!
//! ```rust
//! use stampede_test_helpers::{ScriptedTarget, TargetScript};
//! use stampede_types::ErrorKind;
//!
//! // First call settles, second fails validation, later calls settle with
//! // the default cost.
//! let target = ScriptedTarget::new().with_script([
//!     TargetScript::Settle { cost_used: 0.004 },
//!     TargetScript::FailSettlement {
//!         kind: ErrorKind::Validation,
//!         detail: "bad args".to_string(),
//!     },
//! ]);
//!
//! assert_eq!(target.remaining_scripts(), 2);
//! assert!(target.requests().is_empty());
//! ```

pub mod chain;
pub mod fixtures;

use async_trait::async_trait;
use parking_lot::Mutex;
use stampede_engine::{
    ClientError, DryRunOutcome, PredictedFailure, Settlement, SubmitHandle, SubmitRequest,
    TargetClient,
};
use stampede_types::{Actor, CallParams, ErrorKind};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

/// One scripted outcome, consumed per submitted (or predicted-failing) call.
#[derive(Debug, Clone)]
pub enum TargetScript {
    /// Settle successfully, charging `cost_used` execution units.
    Settle { cost_used: f64 },
    /// Settle, but report execution failure classified as `kind`.
    FailSettlement { kind: ErrorKind, detail: String },
    /// Fail at submission with a transient transport error.
    FailSubmit { detail: String },
    /// Reject the submitted sequence value as stale.
    RejectSequence { detail: String },
    /// Predict failure at dry run; the call never reaches submission.
    PredictFailure {
        reason: PredictedFailure,
        detail: String,
    },
}

/// Scripted double for the contract under test.
///
/// Outcomes are consumed front-to-back, one per call; when the script runs
/// out every further call settles with the default cost. All submitted
/// requests are recorded for assertion.
pub struct ScriptedTarget {
    scripts: Mutex<VecDeque<TargetScript>>,
    pending: Mutex<HashMap<String, Settlement>>,
    requests: Mutex<Vec<SubmitRequest>>,
    handle_counter: AtomicU64,
    dry_runs: AtomicU64,
    estimate: f64,
    default_cost: f64,
}

impl Default for ScriptedTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTarget {
    /// A target that settles every call: estimate 0.01 units, cost 0.008.
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            pending: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            handle_counter: AtomicU64::new(0),
            dry_runs: AtomicU64::new(0),
            estimate: 0.01,
            default_cost: 0.008,
        }
    }

    /// Prepend a fixed outcome sequence.
    pub fn with_script(self, scripts: impl IntoIterator<Item = TargetScript>) -> Self {
        self.scripts.lock().extend(scripts);
        self
    }

    /// Override the raw cost estimate returned for every call.
    pub fn with_estimate(mut self, estimate: f64) -> Self {
        self.estimate = estimate;
        self
    }

    /// Override the cost charged once the script is exhausted.
    pub fn with_default_cost(mut self, cost: f64) -> Self {
        self.default_cost = cost;
        self
    }

    /// Append an outcome at runtime.
    pub fn push(&self, script: TargetScript) {
        self.scripts.lock().push_back(script);
    }

    /// Scripted outcomes not yet consumed.
    pub fn remaining_scripts(&self) -> usize {
        self.scripts.lock().len()
    }

    /// Every request that reached `submit`, in submission order.
    pub fn requests(&self) -> Vec<SubmitRequest> {
        self.requests.lock().clone()
    }

    /// Sequence values of every submitted request, in submission order.
    pub fn submitted_sequences(&self) -> Vec<u64> {
        self.requests.lock().iter().map(|r| r.sequence).collect()
    }

    /// Number of dry runs served.
    pub fn dry_runs(&self) -> u64 {
        self.dry_runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TargetClient for ScriptedTarget {
    async fn dry_run(
        &self,
        _actor: &Actor,
        _params: &CallParams,
    ) -> Result<DryRunOutcome, ClientError> {
        self.dry_runs.fetch_add(1, Ordering::SeqCst);
        let mut scripts = self.scripts.lock();
        if let Some(TargetScript::PredictFailure { reason, detail }) = scripts.front() {
            let outcome = DryRunOutcome::WouldFail {
                reason: *reason,
                detail: detail.clone(),
            };
            scripts.pop_front();
            return Ok(outcome);
        }
        Ok(DryRunOutcome::Ok)
    }

    async fn estimate_cost(&self, _params: &CallParams) -> Result<f64, ClientError> {
        Ok(self.estimate)
    }

    async fn submit(&self, request: SubmitRequest) -> Result<SubmitHandle, ClientError> {
        self.requests.lock().push(request);
        let script = self
            .scripts
            .lock()
            .pop_front()
            .unwrap_or(TargetScript::Settle {
                cost_used: self.default_cost,
            });
        let id = self.handle_counter.fetch_add(1, Ordering::SeqCst);
        let handle = format!("handle-{id}");
        let settlement = match script {
            TargetScript::Settle { cost_used } => Settlement {
                success: true,
                settlement_id: format!("settle-{id}"),
                block_reference: Some(id),
                error: None,
                error_kind: None,
                cost_used,
            },
            TargetScript::FailSettlement { kind, detail } => Settlement {
                success: false,
                settlement_id: format!("settle-{id}"),
                block_reference: None,
                error: Some(detail),
                error_kind: Some(kind),
                cost_used: 0.0,
            },
            TargetScript::FailSubmit { detail } => return Err(ClientError::Transient(detail)),
            TargetScript::RejectSequence { detail } => {
                return Err(ClientError::SequenceMismatch(detail))
            }
            TargetScript::PredictFailure { .. } => {
                return Err(ClientError::Other(
                    "predict-failure script reached submit".to_string(),
                ))
            }
        };
        self.pending.lock().insert(handle.clone(), settlement);
        Ok(SubmitHandle(handle))
    }

    async fn await_settlement(&self, handle: SubmitHandle) -> Result<Settlement, ClientError> {
        self.pending
            .lock()
            .remove(&handle.0)
            .ok_or_else(|| ClientError::Other(format!("unknown handle {}", handle.0)))
    }
}
