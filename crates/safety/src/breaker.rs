//! Three-state circuit breaker.
//!
//! One instance guards one downstream dependency for the lifetime of that
//! binding. State machine:
//!
//! ```text
//!            threshold consecutive failures
//!   Closed ──────────────────────────────────▶ Open
//!     ▲                                         │
//!     │ first probe succeeds                    │ cooldown elapses
//!     │                                         ▼ (lazily evaluated)
//!     └───────────────────────────────────── HalfOpen
//!                 first probe fails ──▶ back to Open
//! ```
//!
//! The Open→HalfOpen edge is a deadline checked on access, not a background
//! timer, so the breaker works identically under a paused test clock.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use stampede_types::epoch_ms;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Breaker tuning.
#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    /// Consecutive failures that trip Closed into Open.
    pub threshold: u32,
    /// Time Open lasts before the breaker probes recovery.
    pub cooldown: Duration,
    /// How many probe calls HalfOpen admits before refusing the rest.
    pub half_open_trials: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            cooldown: Duration::from_secs(30),
            half_open_trials: 3,
        }
    }
}

/// Breaker state, exposed for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half-open",
        };
        f.write_str(name)
    }
}

/// One entry of the append-only state-change log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub from: BreakerState,
    pub to: BreakerState,
    pub reason: String,
    pub at_ms: u64,
}

/// Counter snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakerStats {
    pub state: BreakerState,
    pub consecutive_failures: u32,
    pub half_open_trials_used: u32,
    /// Every interaction: successes, failures, and rejections.
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Calls refused at the gate. Rejections are not failures; the
    /// downstream never saw them.
    pub rejected: u64,
}

/// Error from [`CircuitBreaker::execute`].
#[derive(Debug, thiserror::Error)]
pub enum BreakerError<E: std::error::Error> {
    #[error("circuit breaker '{name}' rejected the call")]
    Rejected { name: String },
    #[error(transparent)]
    Inner(E),
}

struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    half_open_trials_used: u32,
    opened_at: Option<Instant>,
    last_failure_at: Option<Instant>,
    total: u64,
    succeeded: u64,
    failed: u64,
    rejected: u64,
    log: Vec<StateChange>,
}

/// Failure-suppression guard around one downstream dependency.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                half_open_trials_used: 0,
                opened_at: None,
                last_failure_at: None,
                total: 0,
                succeeded: 0,
                failed: 0,
                rejected: 0,
                log: Vec::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gate check. In HalfOpen this consumes one probe trial, so callers
    /// must follow an allowed call with `record_success` or `record_failure`.
    /// Use [`state`](Self::state) or [`stats`](Self::stats) for side-effect-free
    /// introspection.
    pub fn should_allow(&self) -> bool {
        let mut inner = self.inner.lock();
        self.promote_if_cooled(&mut inner);
        match inner.state {
            BreakerState::Closed => true,
            BreakerState::Open => false,
            BreakerState::HalfOpen => {
                if inner.half_open_trials_used < self.config.half_open_trials {
                    inner.half_open_trials_used += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Run `call` under the breaker: reject when not allowed, otherwise
    /// record the outcome.
    pub async fn execute<T, E, F>(&self, call: F) -> Result<T, BreakerError<E>>
    where
        E: std::error::Error,
        F: Future<Output = Result<T, E>>,
    {
        if !self.should_allow() {
            self.record_rejection();
            return Err(BreakerError::Rejected {
                name: self.name.clone(),
            });
        }
        match call.await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(error) => {
                self.record_failure();
                Err(BreakerError::Inner(error))
            }
        }
    }

    /// Record a successful call. Closes the breaker from a HalfOpen probe.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.total += 1;
        inner.succeeded += 1;
        inner.consecutive_failures = 0;
        if inner.state == BreakerState::HalfOpen {
            self.transition(&mut inner, BreakerState::Closed, "probe succeeded");
        }
    }

    /// Record a failed call. Trips Closed at the threshold and reopens from
    /// a HalfOpen probe.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.total += 1;
        inner.failed += 1;
        inner.consecutive_failures += 1;
        inner.last_failure_at = Some(Instant::now());

        match inner.state {
            BreakerState::HalfOpen => {
                self.transition(&mut inner, BreakerState::Open, "probe failed");
            }
            BreakerState::Closed if inner.consecutive_failures >= self.config.threshold => {
                warn!(
                    breaker = %self.name,
                    failures = inner.consecutive_failures,
                    "Failure threshold reached, opening breaker"
                );
                self.transition(&mut inner, BreakerState::Open, "failure threshold reached");
            }
            _ => {}
        }
    }

    /// Count a gate rejection. Rejected calls never reach the downstream and
    /// never touch the consecutive-failure count.
    pub fn record_rejection(&self) {
        let mut inner = self.inner.lock();
        inner.total += 1;
        inner.rejected += 1;
        debug!(breaker = %self.name, "Call rejected while breaker not closed");
    }

    /// Manual override: force the breaker open.
    pub fn force_open(&self, reason: &str) {
        let mut inner = self.inner.lock();
        self.transition(&mut inner, BreakerState::Open, reason);
    }

    /// Manual override: force the breaker closed and clear the failure run.
    pub fn force_close(&self, reason: &str) {
        let mut inner = self.inner.lock();
        self.transition(&mut inner, BreakerState::Closed, reason);
    }

    /// Current state, with the cooldown deadline applied.
    pub fn state(&self) -> BreakerState {
        let mut inner = self.inner.lock();
        self.promote_if_cooled(&mut inner);
        inner.state
    }

    /// Counter snapshot, with the cooldown deadline applied.
    pub fn stats(&self) -> BreakerStats {
        let mut inner = self.inner.lock();
        self.promote_if_cooled(&mut inner);
        BreakerStats {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            half_open_trials_used: inner.half_open_trials_used,
            total: inner.total,
            succeeded: inner.succeeded,
            failed: inner.failed,
            rejected: inner.rejected,
        }
    }

    /// The append-only transition log.
    pub fn change_log(&self) -> Vec<StateChange> {
        self.inner.lock().log.clone()
    }

    fn promote_if_cooled(&self, inner: &mut Inner) {
        if inner.state != BreakerState::Open {
            return;
        }
        let cooled = inner
            .opened_at
            .is_some_and(|at| at.elapsed() >= self.config.cooldown);
        if cooled {
            self.transition(inner, BreakerState::HalfOpen, "cooldown elapsed");
        }
    }

    /// Apply a transition. Re-entering the current state is a no-op with no
    /// duplicate log entry.
    fn transition(&self, inner: &mut Inner, to: BreakerState, reason: &str) {
        if inner.state == to {
            return;
        }
        let from = inner.state;
        inner.state = to;
        match to {
            BreakerState::Open => {
                inner.opened_at = Some(Instant::now());
                inner.half_open_trials_used = 0;
            }
            BreakerState::HalfOpen => {
                inner.half_open_trials_used = 0;
            }
            BreakerState::Closed => {
                inner.consecutive_failures = 0;
                inner.opened_at = None;
            }
        }
        inner.log.push(StateChange {
            from,
            to,
            reason: reason.to_string(),
            at_ms: epoch_ms(),
        });
        info!(breaker = %self.name, %from, %to, reason, "Breaker state change");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(
            "target",
            BreakerConfig {
                threshold: 5,
                cooldown: Duration::from_secs(30),
                half_open_trials: 3,
            },
        )
    }

    #[tokio::test]
    async fn five_consecutive_failures_open_the_breaker() {
        let b = breaker();
        for i in 0..4 {
            b.record_failure();
            assert_eq!(b.state(), BreakerState::Closed, "opened early at {i}");
        }
        b.record_failure();
        assert_eq!(b.state(), BreakerState::Open);
        assert!(!b.should_allow());

        let stats = b.stats();
        assert_eq!(stats.consecutive_failures, 5);
        assert_eq!(stats.failed, 5);
    }

    #[tokio::test]
    async fn success_resets_the_failure_run() {
        let b = breaker();
        for _ in 0..4 {
            b.record_failure();
        }
        b.record_success();
        assert_eq!(b.stats().consecutive_failures, 0);
        for _ in 0..4 {
            b.record_failure();
        }
        assert_eq!(b.state(), BreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_promotes_open_to_half_open() {
        let b = breaker();
        for _ in 0..5 {
            b.record_failure();
        }
        assert_eq!(b.state(), BreakerState::Open);

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(b.state(), BreakerState::Open, "promoted before cooldown");

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(b.state(), BreakerState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_success_closes() {
        let b = breaker();
        for _ in 0..5 {
            b.record_failure();
        }
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(b.should_allow());
        b.record_success();

        let stats = b.stats();
        assert_eq!(stats.state, BreakerState::Closed);
        assert_eq!(stats.consecutive_failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_failure_reopens() {
        let b = breaker();
        for _ in 0..5 {
            b.record_failure();
        }
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(b.should_allow());
        b.record_failure();
        assert_eq!(b.state(), BreakerState::Open);
        assert!(!b.should_allow());
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_trial_budget_is_bounded() {
        let b = breaker();
        for _ in 0..5 {
            b.record_failure();
        }
        tokio::time::advance(Duration::from_secs(31)).await;

        assert!(b.should_allow());
        assert!(b.should_allow());
        assert!(b.should_allow());
        // Budget of 3 exhausted; further probes refused until an outcome
        // lands.
        assert!(!b.should_allow());
    }

    #[tokio::test]
    async fn execute_counts_rejections_separately() {
        let b = breaker();
        b.force_open("maintenance");

        let outcome: Result<(), BreakerError<Boom>> = b.execute(async { Ok(()) }).await;
        assert!(matches!(outcome, Err(BreakerError::Rejected { .. })));

        let stats = b.stats();
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.total, 1);
    }

    #[tokio::test]
    async fn execute_records_both_outcomes() {
        let b = breaker();
        let ok: Result<u32, BreakerError<Boom>> = b.execute(async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err: Result<u32, BreakerError<Boom>> = b.execute(async { Err(Boom) }).await;
        assert!(matches!(err, Err(BreakerError::Inner(Boom))));

        let stats = b.stats();
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total, 2);
    }

    #[tokio::test]
    async fn manual_transitions_do_not_duplicate_log_entries() {
        let b = breaker();
        b.force_open("maintenance window");
        b.force_open("maintenance window");
        b.force_open("still down");
        assert_eq!(b.change_log().len(), 1);

        b.force_close("back up");
        b.force_close("back up");
        let log = b.change_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].to, BreakerState::Open);
        assert_eq!(log[0].reason, "maintenance window");
        assert_eq!(log[1].to, BreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn log_records_the_full_trip() {
        let b = breaker();
        for _ in 0..5 {
            b.record_failure();
        }
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(b.should_allow());
        b.record_success();

        let transitions: Vec<(BreakerState, BreakerState)> =
            b.change_log().iter().map(|c| (c.from, c.to)).collect();
        assert_eq!(
            transitions,
            vec![
                (BreakerState::Closed, BreakerState::Open),
                (BreakerState::Open, BreakerState::HalfOpen),
                (BreakerState::HalfOpen, BreakerState::Closed),
            ]
        );
    }
}
