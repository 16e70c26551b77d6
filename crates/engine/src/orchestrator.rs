//! The execution orchestrator.

use crate::client::{DryRunOutcome, PredictedFailure, Settlement, SubmitRequest, TargetClient};
use crate::ClientError;
use futures::future::join_all;
use stampede_safety::{BreakerError, BudgetEnforcer, BudgetError, CircuitBreaker, RetryPolicy};
use stampede_sequencer::{ChainReader, SequenceCoordinator, SequenceError};
use stampede_types::{Actor, CallParams, ErrorKind, ExecutionResult, SequenceKey};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Orchestrator tuning.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Multiplier applied to raw cost estimates before the budget check.
    pub safety_margin: f64,
    /// Native-unit price of one execution cost unit.
    pub unit_price: f64,
    /// Run the read-only pre-flight before submitting.
    pub dry_run_before_submit: bool,
    /// Preview mode: classify and estimate, never acquire a slot or submit.
    pub dry_run_only: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            safety_margin: 1.1,
            unit_price: 1.0,
            dry_run_before_submit: true,
            dry_run_only: false,
        }
    }
}

/// A failed stage of the execution pipeline.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The dry run predicted failure; nothing was submitted.
    #[error("predicted failure ({reason}): {detail}")]
    Predicted {
        reason: PredictedFailure,
        detail: String,
    },

    /// The call settled on the target but failed there.
    #[error("call failed at settlement: {detail}")]
    Settlement { kind: ErrorKind, detail: String },

    /// The budget enforcer refused the call.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Transport or target failure reported by the client.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A sequence error was detected but the resync read itself failed.
    #[error(transparent)]
    Resync(#[from] SequenceError),
}

impl EngineError {
    /// Taxonomy bucket driving retry classification and result records.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Predicted { reason, .. } => reason.error_kind(),
            EngineError::Settlement { kind, .. } => *kind,
            EngineError::Budget(error) => match error {
                BudgetError::PerCallExceeded { .. } | BudgetError::TotalExceeded { .. } => {
                    ErrorKind::BudgetExceeded
                }
                BudgetError::InvalidLimits(_) | BudgetError::InvalidCost(_) => {
                    ErrorKind::Validation
                }
            },
            EngineError::Client(error) => error.kind(),
            EngineError::Resync(_) => ErrorKind::Sequence,
        }
    }
}

/// Per-attempt context surfaced into the final result even when the attempt
/// errors out partway through the pipeline.
#[derive(Default)]
struct AttemptContext {
    sequence: Option<u64>,
    cost_estimate: f64,
    cost_used: f64,
}

/// Runs one logical call through dry-run, estimation, sequencing, budget,
/// submission, and settlement, under the breaker and the retry policy.
///
/// Shared via `Arc` across every actor task in a run; all methods take
/// `&self`.
pub struct ExecutionOrchestrator<C, R> {
    client: C,
    sequences: Arc<SequenceCoordinator<R>>,
    breaker: Arc<CircuitBreaker>,
    budget: Arc<BudgetEnforcer>,
    retry: RetryPolicy,
    config: EngineConfig,
}

impl<C: TargetClient, R: ChainReader> ExecutionOrchestrator<C, R> {
    pub fn new(
        client: C,
        sequences: Arc<SequenceCoordinator<R>>,
        breaker: Arc<CircuitBreaker>,
        budget: Arc<BudgetEnforcer>,
        retry: RetryPolicy,
        config: EngineConfig,
    ) -> Self {
        Self {
            client,
            sequences,
            breaker,
            budget,
            retry,
            config,
        }
    }

    /// Execute one logical call to completion.
    ///
    /// Never returns an `Err`: every failure mode is encoded in the returned
    /// [`ExecutionResult`] so callers' loops and batches keep running.
    pub async fn execute(&self, actor: &Actor, params: &CallParams) -> ExecutionResult {
        if self.config.dry_run_only {
            return self.dry_run(actor, params).await;
        }

        let started = Instant::now();
        let mut attempt = 1u32;
        loop {
            let mut ctx = AttemptContext::default();
            let outcome = self
                .breaker
                .execute(self.attempt(actor, params, &mut ctx))
                .await;

            let (kind, detail) = match outcome {
                Ok(settlement) => {
                    let duration_ms = started.elapsed().as_millis() as u64;
                    stampede_metrics::record_call_settled(true, duration_ms);
                    debug!(
                        actor = %actor.id,
                        function = %params.function,
                        settlement = %settlement.settlement_id,
                        duration_ms,
                        "Call settled"
                    );
                    return ExecutionResult::settled(
                        settlement.settlement_id,
                        settlement.block_reference,
                        ctx.sequence.unwrap_or_default(),
                        ctx.cost_estimate,
                        settlement.cost_used,
                        duration_ms,
                    );
                }
                Err(BreakerError::Rejected { name }) => {
                    stampede_metrics::record_breaker_rejection(&name);
                    (
                        ErrorKind::BreakerOpen,
                        format!("circuit breaker '{name}' rejected the call"),
                    )
                }
                Err(BreakerError::Inner(error)) => {
                    let kind = error.kind();
                    if let EngineError::Budget(budget_error) = &error {
                        stampede_metrics::record_budget_rejection(matches!(
                            budget_error,
                            BudgetError::PerCallExceeded { .. }
                        ));
                    }
                    (kind, error.to_string())
                }
            };

            if self.retry.should_retry(kind, attempt) {
                let backoff = self.retry.backoff(attempt);
                stampede_metrics::record_retry(kind.as_str(), attempt);
                info!(
                    actor = %actor.id,
                    function = %params.function,
                    %kind,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "Retrying after retryable failure"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
                continue;
            }

            let duration_ms = started.elapsed().as_millis() as u64;
            stampede_metrics::record_call_settled(false, duration_ms);
            warn!(
                actor = %actor.id,
                function = %params.function,
                %kind,
                attempt,
                "Call failed"
            );
            let mut result =
                ExecutionResult::failed(kind, detail, ctx.sequence, ctx.cost_estimate, duration_ms);
            result.cost_used = ctx.cost_used;
            return result;
        }
    }

    /// Cost/feasibility preview. Never acquires a slot, never submits, and
    /// marks the result `simulated`.
    pub async fn dry_run(&self, actor: &Actor, params: &CallParams) -> ExecutionResult {
        match self.client.dry_run(actor, params).await {
            Ok(DryRunOutcome::Ok) => {
                stampede_metrics::record_dry_run(false);
                match self.client.estimate_cost(params).await {
                    Ok(raw) => {
                        let estimate = raw * self.config.safety_margin;
                        stampede_metrics::record_cost_estimated(estimate);
                        ExecutionResult::preview(true, None, estimate)
                    }
                    Err(error) => {
                        ExecutionResult::failed(error.kind(), error.to_string(), None, 0.0, 0)
                    }
                }
            }
            Ok(DryRunOutcome::WouldFail { reason, detail }) => {
                stampede_metrics::record_dry_run(true);
                let mut result = ExecutionResult::preview(false, Some(detail), 0.0);
                result.error_kind = Some(reason.error_kind());
                result
            }
            Err(error) => ExecutionResult::failed(error.kind(), error.to_string(), None, 0.0, 0),
        }
    }

    /// Run a list of independent calls concurrently.
    ///
    /// Failures stay per-item; one call's failure never stops the rest.
    pub async fn execute_batch(&self, calls: &[(Actor, CallParams)]) -> Vec<ExecutionResult> {
        let futures: Vec<_> = calls
            .iter()
            .map(|(actor, params)| self.execute(actor, params))
            .collect();
        join_all(futures).await
    }

    /// One pass through the pipeline. The sequence slot acquired here is
    /// released before returning, on success and on error alike.
    async fn attempt(
        &self,
        actor: &Actor,
        params: &CallParams,
        ctx: &mut AttemptContext,
    ) -> Result<Settlement, EngineError> {
        // Pre-flight short-circuits before any slot or budget is consumed.
        if self.config.dry_run_before_submit {
            match self.client.dry_run(actor, params).await? {
                DryRunOutcome::Ok => stampede_metrics::record_dry_run(false),
                DryRunOutcome::WouldFail { reason, detail } => {
                    stampede_metrics::record_dry_run(true);
                    return Err(EngineError::Predicted { reason, detail });
                }
            }
        }

        let raw = self.client.estimate_cost(params).await?;
        let estimate = raw * self.config.safety_margin;
        ctx.cost_estimate = estimate;
        stampede_metrics::record_cost_estimated(estimate);

        let key = SequenceKey::new(actor.id, params.network);
        let sequence = self.sequences.acquire(key).await;
        ctx.sequence = Some(sequence);

        let outcome = self
            .submit_and_settle(actor, params, estimate, sequence, ctx)
            .await;

        // Resync before release so the counter the next holder reads is
        // already authoritative.
        let outcome = match outcome {
            Ok(settlement) => Ok(settlement),
            Err(error) => match self
                .sequences
                .handle_error(key, &actor.address, error.kind())
                .await
            {
                Ok(handled) => {
                    if handled {
                        stampede_metrics::record_sequence_resync();
                    }
                    Err(error)
                }
                Err(resync_error) => {
                    warn!(key = %key, error = %resync_error, "Sequence resync failed");
                    Err(EngineError::Resync(resync_error))
                }
            },
        };
        self.sequences.release(key);
        outcome
    }

    async fn submit_and_settle(
        &self,
        actor: &Actor,
        params: &CallParams,
        estimate: f64,
        sequence: u64,
        ctx: &mut AttemptContext,
    ) -> Result<Settlement, EngineError> {
        self.budget.check_call(estimate, self.config.unit_price)?;

        let request = SubmitRequest {
            actor: actor.id,
            address: actor.address.clone(),
            params: params.clone(),
            sequence,
        };
        let handle = self.client.submit(request).await?;
        stampede_metrics::record_call_submitted();
        debug!(actor = %actor.id, function = %params.function, sequence, "Submitted call");

        let settlement = self.client.await_settlement(handle).await?;
        if settlement.cost_used > 0.0 {
            ctx.cost_used = settlement.cost_used;
            self.budget.record_call(
                settlement.cost_used,
                self.config.unit_price,
                params.function.to_string(),
            );
            stampede_metrics::record_budget_spend(settlement.cost_used * self.config.unit_price);
        }

        if settlement.success {
            Ok(settlement)
        } else {
            let kind = settlement.error_kind.unwrap_or(ErrorKind::Unknown);
            let detail = settlement
                .error
                .unwrap_or_else(|| "settlement reported failure".to_string());
            Err(EngineError::Settlement { kind, detail })
        }
    }

    /// The client this orchestrator submits through.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The breaker guarding this orchestrator's target.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// The shared budget ledger.
    pub fn budget(&self) -> &BudgetEnforcer {
        &self.budget
    }

    /// The sequence coordinator, for introspection and inter-run resets.
    pub fn sequences(&self) -> &SequenceCoordinator<R> {
        &self.sequences
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SubmitHandle;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use stampede_safety::{BreakerConfig, BudgetLimits, RetryConfig};
    use stampede_types::{ActorId, NetworkId};
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Clone)]
    enum CallScript {
        Settle { cost_used: f64 },
        FailSettlement { kind: ErrorKind, detail: &'static str },
        FailSubmit(ClientError),
        PredictFail { reason: PredictedFailure, detail: &'static str },
    }

    /// Scripted double for the target: consumes one script entry per attempt.
    struct MockTarget {
        scripts: Mutex<VecDeque<CallScript>>,
        pending: Mutex<HashMap<String, Settlement>>,
        requests: Mutex<Vec<SubmitRequest>>,
        handle_counter: AtomicU64,
        estimate: f64,
    }

    impl MockTarget {
        fn new(scripts: Vec<CallScript>, estimate: f64) -> Self {
            Self {
                scripts: Mutex::new(scripts.into()),
                pending: Mutex::new(HashMap::new()),
                requests: Mutex::new(Vec::new()),
                handle_counter: AtomicU64::new(0),
                estimate,
            }
        }

        fn requests(&self) -> Vec<SubmitRequest> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl TargetClient for MockTarget {
        async fn dry_run(
            &self,
            _actor: &Actor,
            _params: &CallParams,
        ) -> Result<DryRunOutcome, ClientError> {
            let mut scripts = self.scripts.lock();
            if let Some(CallScript::PredictFail { reason, detail }) = scripts.front() {
                let outcome = DryRunOutcome::WouldFail {
                    reason: *reason,
                    detail: (*detail).to_string(),
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
                .unwrap_or(CallScript::Settle { cost_used: 0.0 });
            let id = self.handle_counter.fetch_add(1, Ordering::SeqCst);
            let handle = format!("handle-{id}");
            let settlement = match script {
                CallScript::Settle { cost_used } => Settlement {
                    success: true,
                    settlement_id: format!("settle-{id}"),
                    block_reference: Some(id),
                    error: None,
                    error_kind: None,
                    cost_used,
                },
                CallScript::FailSettlement { kind, detail } => Settlement {
                    success: false,
                    settlement_id: format!("settle-{id}"),
                    block_reference: None,
                    error: Some(detail.to_string()),
                    error_kind: Some(kind),
                    cost_used: 0.0,
                },
                CallScript::FailSubmit(error) => return Err(error),
                CallScript::PredictFail { .. } => unreachable!("consumed by dry_run"),
            };
            self.pending.lock().insert(handle.clone(), settlement);
            Ok(SubmitHandle(handle))
        }

        async fn await_settlement(&self, handle: SubmitHandle) -> Result<Settlement, ClientError> {
            self.pending
                .lock()
                .remove(&handle.0)
                .ok_or_else(|| ClientError::Other("unknown handle".to_string()))
        }
    }

    struct FixedChain {
        value: u64,
        calls: Arc<AtomicU64>,
    }

    impl FixedChain {
        fn new(value: u64) -> Self {
            Self {
                value,
                calls: Arc::new(AtomicU64::new(0)),
            }
        }
    }

    #[async_trait]
    impl ChainReader for FixedChain {
        async fn authoritative_sequence(
            &self,
            _network: NetworkId,
            _address: &str,
        ) -> Result<u64, SequenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.value)
        }
    }

    fn actor() -> Actor {
        Actor::new(ActorId(0), NetworkId(0), "addr_0")
    }

    fn params() -> CallParams {
        CallParams::new(NetworkId(0), "transfer")
    }

    fn key() -> SequenceKey {
        SequenceKey::new(ActorId(0), NetworkId(0))
    }

    struct Builder {
        scripts: Vec<CallScript>,
        estimate: f64,
        chain_value: u64,
        limits: BudgetLimits,
        retry: RetryConfig,
        config: EngineConfig,
    }

    impl Builder {
        fn new(scripts: Vec<CallScript>) -> Self {
            Self {
                scripts,
                estimate: 0.01,
                chain_value: 0,
                limits: BudgetLimits::default(),
                retry: RetryConfig::default(),
                config: EngineConfig::default(),
            }
        }

        fn build(self) -> ExecutionOrchestrator<MockTarget, FixedChain> {
            ExecutionOrchestrator::new(
                MockTarget::new(self.scripts, self.estimate),
                Arc::new(SequenceCoordinator::new(FixedChain::new(self.chain_value))),
                Arc::new(CircuitBreaker::new("target", BreakerConfig::default())),
                Arc::new(BudgetEnforcer::new(self.limits).unwrap()),
                RetryPolicy::new(self.retry),
                self.config,
            )
        }
    }

    #[tokio::test]
    async fn settled_call_flows_through_the_whole_pipeline() {
        let orchestrator = Builder::new(vec![CallScript::Settle { cost_used: 0.008 }]).build();

        let result = orchestrator.execute(&actor(), &params()).await;
        assert!(result.success, "error: {:?}", result.error);
        assert_eq!(result.sequence, Some(0));
        assert!((result.cost_estimate - 0.011).abs() < 1e-12);
        assert!((result.cost_used - 0.008).abs() < 1e-12);
        assert!(!result.simulated);

        let requests = orchestrator.client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].sequence, 0);
        assert_eq!(requests[0].address, "addr_0");

        assert_eq!(orchestrator.budget().history().len(), 1);
        assert_eq!(orchestrator.breaker().stats().succeeded, 1);
    }

    #[tokio::test]
    async fn predicted_failure_short_circuits_before_any_slot() {
        let orchestrator = Builder::new(vec![CallScript::PredictFail {
            reason: PredictedFailure::InsufficientResources,
            detail: "balance 0",
        }])
        .build();

        let result = orchestrator.execute(&actor(), &params()).await;
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::InsufficientResources));
        assert_eq!(result.sequence, None);

        assert!(orchestrator.client.requests().is_empty());
        assert!(orchestrator.sequences().sequence_state(key()).is_none());
        assert_eq!(orchestrator.budget().history().len(), 0);
        // Deterministic pre-flight failures still count toward the breaker's
        // consecutive-failure run.
        assert_eq!(orchestrator.breaker().stats().failed, 1);
    }

    #[tokio::test]
    async fn slot_released_and_advanced_after_settlement_failure() {
        let orchestrator = Builder::new(vec![
            CallScript::FailSettlement {
                kind: ErrorKind::Validation,
                detail: "schema mismatch",
            },
            CallScript::Settle { cost_used: 0.005 },
        ])
        .build();

        let failed = orchestrator.execute(&actor(), &params()).await;
        assert!(!failed.success);
        assert_eq!(failed.error_kind, Some(ErrorKind::Validation));
        assert_eq!(failed.sequence, Some(0));

        let state = orchestrator.sequences().sequence_state(key()).unwrap();
        assert!(!state.locked, "slot leaked after failure");
        assert_eq!(state.current, 1);

        let settled = orchestrator.execute(&actor(), &params()).await;
        assert!(settled.success);
        assert_eq!(settled.sequence, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn sequence_mismatch_resyncs_and_retries_with_fresh_slot() {
        let chain = FixedChain::new(7);
        let reads = Arc::clone(&chain.calls);
        let orchestrator = ExecutionOrchestrator::new(
            MockTarget::new(
                vec![
                    CallScript::FailSubmit(ClientError::SequenceMismatch(
                        "expected 7".to_string(),
                    )),
                    CallScript::Settle { cost_used: 0.001 },
                ],
                0.01,
            ),
            Arc::new(SequenceCoordinator::new(chain)),
            Arc::new(CircuitBreaker::new("target", BreakerConfig::default())),
            Arc::new(BudgetEnforcer::new(BudgetLimits::default()).unwrap()),
            RetryPolicy::new(RetryConfig::default()),
            EngineConfig::default(),
        );

        let result = orchestrator.execute(&actor(), &params()).await;
        assert!(result.success, "error: {:?}", result.error);
        assert_eq!(result.sequence, Some(7));
        assert_eq!(reads.load(Ordering::SeqCst), 1);

        let sequences: Vec<u64> = orchestrator
            .client
            .requests()
            .iter()
            .map(|r| r.sequence)
            .collect();
        assert_eq!(sequences, vec![0, 7]);
    }

    #[tokio::test]
    async fn breaker_rejection_is_not_retried() {
        let orchestrator = Builder::new(vec![CallScript::Settle { cost_used: 0.0 }]).build();
        orchestrator.breaker().force_open("maintenance");

        let result = orchestrator.execute(&actor(), &params()).await;
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::BreakerOpen));
        assert_eq!(result.sequence, None);

        assert!(orchestrator.client.requests().is_empty());
        let stats = orchestrator.breaker().stats();
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn budget_rejection_consumes_and_releases_the_slot() {
        let mut builder = Builder::new(vec![CallScript::Settle { cost_used: 0.0 }]);
        builder.limits = BudgetLimits {
            max_per_call: 0.005,
            max_total: 10.0,
        };
        let orchestrator = builder.build();

        let result = orchestrator.execute(&actor(), &params()).await;
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::BudgetExceeded));
        assert_eq!(result.sequence, Some(0));
        assert!(orchestrator.client.requests().is_empty());

        let state = orchestrator.sequences().sequence_state(key()).unwrap();
        assert!(!state.locked);
        assert_eq!(state.current, 1);
        // Post-gate errors of any kind count as breaker failures.
        assert_eq!(orchestrator.breaker().stats().failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_retries_until_settled() {
        let orchestrator = Builder::new(vec![
            CallScript::FailSubmit(ClientError::Transient("connection reset".to_string())),
            CallScript::Settle { cost_used: 0.002 },
        ])
        .build();

        let result = orchestrator.execute(&actor(), &params()).await;
        assert!(result.success);
        assert_eq!(result.sequence, Some(1));

        let sequences: Vec<u64> = orchestrator
            .client
            .requests()
            .iter()
            .map(|r| r.sequence)
            .collect();
        assert_eq!(sequences, vec![0, 1], "each attempt gets a fresh slot");
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_cap_bounds_retries() {
        let mut builder = Builder::new(vec![
            CallScript::FailSubmit(ClientError::Transient("reset".to_string())),
            CallScript::FailSubmit(ClientError::Transient("reset".to_string())),
            CallScript::FailSubmit(ClientError::Transient("reset".to_string())),
        ]);
        builder.retry = RetryConfig {
            max_attempts: 2,
            ..RetryConfig::default()
        };
        let orchestrator = builder.build();

        let result = orchestrator.execute(&actor(), &params()).await;
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::TransientNetwork));
        assert_eq!(orchestrator.client.requests().len(), 2);
    }

    #[tokio::test]
    async fn batch_isolates_per_item_failures() {
        let orchestrator = Builder::new(vec![
            CallScript::Settle { cost_used: 0.001 },
            CallScript::FailSettlement {
                kind: ErrorKind::Validation,
                detail: "bad args",
            },
            CallScript::Settle { cost_used: 0.001 },
        ])
        .build();

        let calls = vec![
            (actor(), params()),
            (actor(), params()),
            (actor(), params()),
        ];
        let results = orchestrator.execute_batch(&calls).await;
        let successes: Vec<bool> = results.iter().map(|r| r.success).collect();
        assert_eq!(successes, vec![true, false, true]);
    }

    #[tokio::test]
    async fn dry_run_only_mode_never_submits() {
        let mut builder = Builder::new(vec![]);
        builder.config.dry_run_only = true;
        let orchestrator = builder.build();

        let result = orchestrator.execute(&actor(), &params()).await;
        assert!(result.success);
        assert!(result.simulated);
        assert!((result.cost_estimate - 0.011).abs() < 1e-12);

        assert!(orchestrator.client.requests().is_empty());
        assert_eq!(orchestrator.sequences().tracked_keys(), 0);
    }

    #[tokio::test]
    async fn preview_classifies_predicted_failures() {
        let mut builder = Builder::new(vec![CallScript::PredictFail {
            reason: PredictedFailure::ContractRejection,
            detail: "assertion failed",
        }]);
        builder.config.dry_run_only = true;
        let orchestrator = builder.build();

        let result = orchestrator.execute(&actor(), &params()).await;
        assert!(!result.success);
        assert!(result.simulated);
        assert_eq!(result.error_kind, Some(ErrorKind::PredictedRejection));
        assert_eq!(result.error.as_deref(), Some("assertion failed"));
    }
}
