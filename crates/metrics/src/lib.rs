//! Metrics facade for Stampede.
//!
//! Provides a [`MetricsRecorder`] trait with domain-specific methods and default
//! no-op implementations. A global singleton recorder is accessed via [`recorder()`],
//! and convenience free functions delegate to it.
//!
//! # Usage
//!
//! Callers record metrics via free functions:
//! ```ignore
//! stampede_metrics::record_call_settled(true, duration_ms);
//! stampede_metrics::record_breaker_rejection("mainnet");
//! ```
//!
//! At startup, install a backend. If none is installed, every call is a no-op,
//! which is the right default for deterministic simulation runs.

use std::sync::OnceLock;

// ═══════════════════════════════════════════════════════════════════════
// Trait
// ═══════════════════════════════════════════════════════════════════════

/// Domain-specific metrics recording trait.
///
/// All methods have default no-op implementations so backends only need
/// to override the metrics they care about.
#[allow(unused_variables)]
pub trait MetricsRecorder: Send + Sync + 'static {
    // ── Calls ────────────────────────────────────────────────────────

    /// Record a call submitted for execution.
    fn record_call_submitted(&self) {}

    /// Record a call that reached settlement.
    fn record_call_settled(&self, success: bool, duration_ms: u64) {}

    /// Record a dry run performed against the target.
    fn record_dry_run(&self, predicted_failure: bool) {}

    /// Record a cost estimate in execution units.
    fn record_cost_estimated(&self, units: f64) {}

    // ── Safety ───────────────────────────────────────────────────────

    /// Record a call rejected by an open circuit breaker.
    fn record_breaker_rejection(&self, breaker: &str) {}

    /// Record a circuit breaker state transition.
    fn record_breaker_transition(&self, breaker: &str, from: &str, to: &str) {}

    /// Record a call rejected by the budget enforcer.
    fn record_budget_rejection(&self, per_call: bool) {}

    /// Record spend committed against the budget.
    fn record_budget_spend(&self, cost: f64) {}

    /// Set the budget utilization gauge (percent of total budget spent).
    fn set_budget_utilization(&self, pct: f64) {}

    /// Record an attempt retried after a retryable failure.
    fn record_retry(&self, error_kind: &str, attempt: u32) {}

    // ── Sequencing ───────────────────────────────────────────────────

    /// Record a resync of a sequence counter from the authoritative source.
    fn record_sequence_resync(&self) {}

    /// Set the count of callers waiting on sequence slots.
    fn set_sequence_waiters(&self, count: usize) {}

    // ── Behavior ─────────────────────────────────────────────────────

    /// Record an archetype skipping a scheduled call.
    fn record_skip(&self, archetype: &str) {}

    /// Record an archetype firing a burst of calls.
    fn record_burst(&self, archetype: &str, size: u32) {}
}

// ═══════════════════════════════════════════════════════════════════════
// Global singleton
// ═══════════════════════════════════════════════════════════════════════

struct NoopRecorder;
impl MetricsRecorder for NoopRecorder {}

static RECORDER: OnceLock<Box<dyn MetricsRecorder>> = OnceLock::new();

/// Install a global metrics recorder.
///
/// Can only be called once. Subsequent calls are silently ignored.
pub fn set_global_recorder(recorder: Box<dyn MetricsRecorder>) {
    let _ = RECORDER.set(recorder);
}

/// Get the global metrics recorder.
///
/// Returns a no-op recorder if none has been installed.
#[inline]
fn recorder() -> &'static dyn MetricsRecorder {
    RECORDER.get().map(|r| r.as_ref()).unwrap_or(&NoopRecorder)
}

// ═══════════════════════════════════════════════════════════════════════
// Convenience free functions
// ═══════════════════════════════════════════════════════════════════════

// ── Calls ────────────────────────────────────────────────────────────

/// Record a call submitted for execution.
#[inline]
pub fn record_call_submitted() {
    recorder().record_call_submitted();
}

/// Record a call that reached settlement.
#[inline]
pub fn record_call_settled(success: bool, duration_ms: u64) {
    recorder().record_call_settled(success, duration_ms);
}

/// Record a dry run performed against the target.
#[inline]
pub fn record_dry_run(predicted_failure: bool) {
    recorder().record_dry_run(predicted_failure);
}

/// Record a cost estimate in execution units.
#[inline]
pub fn record_cost_estimated(units: f64) {
    recorder().record_cost_estimated(units);
}

// ── Safety ───────────────────────────────────────────────────────────

/// Record a call rejected by an open circuit breaker.
#[inline]
pub fn record_breaker_rejection(breaker: &str) {
    recorder().record_breaker_rejection(breaker);
}

/// Record a circuit breaker state transition.
#[inline]
pub fn record_breaker_transition(breaker: &str, from: &str, to: &str) {
    recorder().record_breaker_transition(breaker, from, to);
}

/// Record a call rejected by the budget enforcer.
#[inline]
pub fn record_budget_rejection(per_call: bool) {
    recorder().record_budget_rejection(per_call);
}

/// Record spend committed against the budget.
#[inline]
pub fn record_budget_spend(cost: f64) {
    recorder().record_budget_spend(cost);
}

/// Set the budget utilization gauge (percent of total budget spent).
#[inline]
pub fn set_budget_utilization(pct: f64) {
    recorder().set_budget_utilization(pct);
}

/// Record an attempt retried after a retryable failure.
#[inline]
pub fn record_retry(error_kind: &str, attempt: u32) {
    recorder().record_retry(error_kind, attempt);
}

// ── Sequencing ───────────────────────────────────────────────────────

/// Record a resync of a sequence counter from the authoritative source.
#[inline]
pub fn record_sequence_resync() {
    recorder().record_sequence_resync();
}

/// Set the count of callers waiting on sequence slots.
#[inline]
pub fn set_sequence_waiters(count: usize) {
    recorder().set_sequence_waiters(count);
}

// ── Behavior ─────────────────────────────────────────────────────────

/// Record an archetype skipping a scheduled call.
#[inline]
pub fn record_skip(archetype: &str) {
    recorder().record_skip(archetype);
}

/// Record an archetype firing a burst of calls.
#[inline]
pub fn record_burst(archetype: &str, size: u32) {
    recorder().record_burst(archetype, size);
}
