//! Aggregation of per-call results into live and final metrics.
//!
//! The collector is purely additive: results are recorded once and never
//! revised. Counters are lock-free so recording from many concurrent actor
//! tasks stays off any shared lock; only the duration histogram takes a short
//! `parking_lot` critical section.

use dashmap::DashMap;
use hdrhistogram::Histogram;
use serde::Serialize;
use stampede_types::{ErrorKind, ExecutionResult};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Fixed-point scale for accumulating fractional costs in atomics.
const COST_SCALE: f64 = 1e6;

fn kind_index(kind: ErrorKind) -> usize {
    ErrorKind::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or(ErrorKind::ALL.len() - 1)
}

#[derive(Default)]
struct Counters {
    attempts: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    reverts: AtomicU64,
    skips: AtomicU64,
    cost_micro: AtomicU64,
    duration_ms_total: AtomicU64,
}

impl Counters {
    fn record_result(&self, result: &ExecutionResult) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        self.duration_ms_total
            .fetch_add(result.duration_ms, Ordering::Relaxed);
        if result.cost_used > 0.0 {
            self.cost_micro
                .fetch_add((result.cost_used * COST_SCALE).round() as u64, Ordering::Relaxed);
        }
        if result.success {
            self.successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
            if result.error_kind == Some(ErrorKind::PredictedRejection) {
                self.reverts.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Accumulates call results and skips, globally and per archetype.
pub struct MetricsCollector {
    global: Counters,
    by_kind: [AtomicU64; ErrorKind::ALL.len()],
    by_archetype: DashMap<String, Counters>,
    durations: parking_lot::Mutex<Histogram<u64>>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            global: Counters::default(),
            by_kind: Default::default(),
            by_archetype: DashMap::new(),
            durations: parking_lot::Mutex::new(
                Histogram::new(3).expect("three significant figures is a valid histogram"),
            ),
        }
    }

    /// Record a skipped step for `archetype`.
    pub fn record_skip(&self, archetype: &str) {
        self.global.skips.fetch_add(1, Ordering::Relaxed);
        self.archetype_counters(archetype)
            .skips
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record one finished call (or not-suitable record) for `archetype`.
    pub fn record_result(&self, archetype: &str, result: &ExecutionResult) {
        self.global.record_result(result);
        self.archetype_counters(archetype).record_result(result);
        if let Some(kind) = result.error_kind {
            if !result.success {
                self.by_kind[kind_index(kind)].fetch_add(1, Ordering::Relaxed);
            }
        }
        {
            let mut durations = self.durations.lock();
            let _ = durations.record(result.duration_ms);
        }
    }

    fn archetype_counters(&self, archetype: &str) -> dashmap::mapref::one::Ref<'_, String, Counters> {
        if let Some(entry) = self.by_archetype.get(archetype) {
            return entry;
        }
        self.by_archetype
            .entry(archetype.to_string())
            .or_default()
            .downgrade()
    }

    /// Point-in-time aggregate view. Safe to call mid-run.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let attempts = self.global.attempts.load(Ordering::Relaxed);
        let successes = self.global.successes.load(Ordering::Relaxed);
        let failures = self.global.failures.load(Ordering::Relaxed);

        let failures_by_kind = ErrorKind::ALL
            .iter()
            .zip(self.by_kind.iter())
            .filter_map(|(kind, count)| {
                let count = count.load(Ordering::Relaxed);
                (count > 0).then(|| (kind.as_str().to_string(), count))
            })
            .collect();

        let per_archetype = self
            .by_archetype
            .iter()
            .map(|entry| {
                let c = entry.value();
                let attempts = c.attempts.load(Ordering::Relaxed);
                let snapshot = ArchetypeSnapshot {
                    attempts,
                    successes: c.successes.load(Ordering::Relaxed),
                    failures: c.failures.load(Ordering::Relaxed),
                    reverts: c.reverts.load(Ordering::Relaxed),
                    skips: c.skips.load(Ordering::Relaxed),
                    total_cost: c.cost_micro.load(Ordering::Relaxed) as f64 / COST_SCALE,
                    mean_duration_ms: if attempts > 0 {
                        c.duration_ms_total.load(Ordering::Relaxed) as f64 / attempts as f64
                    } else {
                        0.0
                    },
                };
                (entry.key().clone(), snapshot)
            })
            .collect();

        let durations = self.durations.lock();
        MetricsSnapshot {
            attempts,
            successes,
            failures,
            reverts: self.global.reverts.load(Ordering::Relaxed),
            skips: self.global.skips.load(Ordering::Relaxed),
            total_cost: self.global.cost_micro.load(Ordering::Relaxed) as f64 / COST_SCALE,
            success_rate: rate(successes, attempts),
            error_rate: rate(failures, attempts),
            p50_ms: durations.value_at_quantile(0.50),
            p90_ms: durations.value_at_quantile(0.90),
            p99_ms: durations.value_at_quantile(0.99),
            max_ms: durations.max(),
            mean_ms: durations.mean(),
            failures_by_kind,
            per_archetype,
        }
    }
}

fn rate(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64
    } else {
        0.0
    }
}

/// Per-archetype aggregate slice of a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ArchetypeSnapshot {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub reverts: u64,
    pub skips: u64,
    pub total_cost: f64,
    pub mean_duration_ms: f64,
}

/// A point-in-time view of everything recorded so far.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    /// Failures the target (or its dry run) classified as contract
    /// rejections.
    pub reverts: u64,
    pub skips: u64,
    pub total_cost: f64,
    pub success_rate: f64,
    pub error_rate: f64,
    pub p50_ms: u64,
    pub p90_ms: u64,
    pub p99_ms: u64,
    pub max_ms: u64,
    pub mean_ms: f64,
    /// Non-zero failure buckets in taxonomy order.
    pub failures_by_kind: Vec<(String, u64)>,
    pub per_archetype: BTreeMap<String, ArchetypeSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled(duration_ms: u64, cost: f64) -> ExecutionResult {
        ExecutionResult::settled("settle-1".to_string(), Some(1), 0, cost * 1.1, cost, duration_ms)
    }

    fn failed(kind: ErrorKind) -> ExecutionResult {
        ExecutionResult::failed(kind, "boom", None, 0.0, 5)
    }

    #[test]
    fn global_and_archetype_counters_move_together() {
        let collector = MetricsCollector::new();
        collector.record_result("whale", &settled(100, 0.02));
        collector.record_result("whale", &failed(ErrorKind::TransientNetwork));
        collector.record_result("bot", &settled(10, 0.001));
        collector.record_skip("whale");

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.attempts, 3);
        assert_eq!(snapshot.successes, 2);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.skips, 1);
        assert!((snapshot.total_cost - 0.021).abs() < 1e-9);

        let whale = &snapshot.per_archetype["whale"];
        assert_eq!(whale.attempts, 2);
        assert_eq!(whale.successes, 1);
        assert_eq!(whale.skips, 1);
        let bot = &snapshot.per_archetype["bot"];
        assert_eq!(bot.attempts, 1);
        assert_eq!(bot.failures, 0);
    }

    #[test]
    fn failure_breakdown_keeps_taxonomy_order_and_drops_zero_buckets() {
        let collector = MetricsCollector::new();
        collector.record_result("a", &failed(ErrorKind::TransientNetwork));
        collector.record_result("a", &failed(ErrorKind::Validation));
        collector.record_result("a", &failed(ErrorKind::TransientNetwork));

        let snapshot = collector.snapshot();
        assert_eq!(
            snapshot.failures_by_kind,
            vec![
                ("validation".to_string(), 1),
                ("transient_network".to_string(), 2),
            ]
        );
    }

    #[test]
    fn predicted_rejections_count_as_reverts() {
        let collector = MetricsCollector::new();
        collector.record_result("a", &failed(ErrorKind::PredictedRejection));
        collector.record_result("a", &failed(ErrorKind::BudgetExceeded));

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.failures, 2);
        assert_eq!(snapshot.reverts, 1);
    }

    #[test]
    fn rates_derive_from_attempts_only() {
        let collector = MetricsCollector::new();
        for _ in 0..3 {
            collector.record_result("a", &settled(50, 0.01));
        }
        collector.record_result("a", &failed(ErrorKind::Unknown));
        for _ in 0..10 {
            collector.record_skip("a");
        }

        let snapshot = collector.snapshot();
        assert!((snapshot.success_rate - 0.75).abs() < 1e-12);
        assert!((snapshot.error_rate - 0.25).abs() < 1e-12);
    }

    #[test]
    fn empty_collector_reports_zero_rates() {
        let snapshot = MetricsCollector::new().snapshot();
        assert_eq!(snapshot.attempts, 0);
        assert_eq!(snapshot.success_rate, 0.0);
        assert_eq!(snapshot.p99_ms, 0);
    }

    #[test]
    fn percentiles_cover_recorded_durations() {
        let collector = MetricsCollector::new();
        for ms in [10u64, 20, 30, 40, 1000] {
            collector.record_result("a", &settled(ms, 0.0));
        }
        let snapshot = collector.snapshot();
        assert!(snapshot.p50_ms >= 10 && snapshot.p50_ms <= 40);
        assert!(snapshot.p99_ms >= 990, "p99 {} missed the tail", snapshot.p99_ms);
        assert!(snapshot.max_ms >= 990);
    }
}
