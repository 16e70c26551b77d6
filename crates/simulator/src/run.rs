//! Per-run records and the combined run report.

use crate::collector::{MetricsCollector, MetricsSnapshot};
use serde::{Deserialize, Serialize};
use stampede_types::{epoch_ms, ActorId, ExecutionResult};
use std::time::Duration;

/// Lifecycle state of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
}

/// Statistics over the waits a run actually performed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingStats {
    pub samples: u32,
    pub total_wait_ms: u64,
    pub min_wait_ms: u64,
    pub max_wait_ms: u64,
    pub mean_wait_ms: f64,
}

impl TimingStats {
    pub fn from_waits(waits: &[u64]) -> Self {
        if waits.is_empty() {
            return Self::default();
        }
        let total: u64 = waits.iter().sum();
        Self {
            samples: waits.len() as u32,
            total_wait_ms: total,
            min_wait_ms: waits.iter().copied().min().unwrap_or(0),
            max_wait_ms: waits.iter().copied().max().unwrap_or(0),
            mean_wait_ms: total as f64 / waits.len() as f64,
        }
    }
}

/// One actor's archetype-driven run, finalized when its loop ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRun {
    pub archetype: String,
    pub actor: ActorId,
    /// Requested step count; 0 for deadline-bound runs.
    pub total_iterations: u32,
    /// Steps the loop finished, including skipped ones.
    pub completed: u32,
    pub skipped: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub interactions: Vec<ExecutionResult>,
    pub timing: TimingStats,
    pub started_at_ms: u64,
    pub ended_at_ms: u64,
    pub status: RunStatus,
}

impl SimulationRun {
    pub(crate) fn begin(archetype: &str, actor: ActorId, total_iterations: u32) -> Self {
        Self {
            archetype: archetype.to_string(),
            actor,
            total_iterations,
            completed: 0,
            skipped: 0,
            succeeded: 0,
            failed: 0,
            interactions: Vec::new(),
            timing: TimingStats::default(),
            started_at_ms: epoch_ms(),
            ended_at_ms: 0,
            status: RunStatus::Running,
        }
    }

    pub(crate) fn finalize(&mut self, waits: &[u64], status: RunStatus) {
        self.timing = TimingStats::from_waits(waits);
        self.ended_at_ms = epoch_ms();
        self.status = status;
    }

    /// Calls executed (interactions recorded), excluding skips.
    pub fn calls(&self) -> usize {
        self.interactions.len()
    }

    pub fn success_rate(&self) -> f64 {
        let calls = self.calls() as f64;
        if calls > 0.0 {
            f64::from(self.succeeded) / calls
        } else {
            0.0
        }
    }
}

/// Combined outcome of a `run_continuous` or `run_mixed` invocation.
///
/// The metrics are derived from exactly the runs carried here, so sequential
/// reports from one orchestrator do not bleed into each other.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Wall-clock length of the whole invocation.
    pub duration: Duration,
    pub runs: Vec<SimulationRun>,
    pub metrics: MetricsSnapshot,
}

impl RunReport {
    pub(crate) fn from_runs(duration: Duration, runs: Vec<SimulationRun>) -> Self {
        let collector = MetricsCollector::new();
        for run in &runs {
            for _ in 0..run.skipped {
                collector.record_skip(&run.archetype);
            }
            for result in &run.interactions {
                collector.record_result(&run.archetype, result);
            }
        }
        Self {
            duration,
            metrics: collector.snapshot(),
            runs,
        }
    }

    /// Calls per second over the report window.
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.metrics.attempts as f64 / secs
        } else {
            0.0
        }
    }

    /// Print the report to stdout.
    pub fn print(&self) {
        println!("\n=== Simulation Report ===");
        println!("Duration:  {:?}", self.duration);
        println!("Runs:      {}", self.runs.len());
        println!("Calls:     {}", self.metrics.attempts);
        println!("Succeeded: {}", self.metrics.successes);
        println!("Failed:    {}", self.metrics.failures);
        println!("Reverts:   {}", self.metrics.reverts);
        println!("Skips:     {}", self.metrics.skips);
        println!("Cost:      {:.6}", self.metrics.total_cost);
        println!("Success rate: {:.1}%", self.metrics.success_rate * 100.0);
        println!("Throughput:   {:.2} calls/s", self.throughput());

        if self.metrics.attempts > 0 {
            println!("\nDurations:");
            println!("  P50:  {}ms", self.metrics.p50_ms);
            println!("  P90:  {}ms", self.metrics.p90_ms);
            println!("  P99:  {}ms", self.metrics.p99_ms);
            println!("  Max:  {}ms", self.metrics.max_ms);
            println!("  Mean: {:.1}ms", self.metrics.mean_ms);
        }

        if !self.metrics.per_archetype.is_empty() {
            println!("\n--- Per Archetype ---");
            for (name, stats) in &self.metrics.per_archetype {
                println!(
                    "{name}: calls {} | ok {} | failed {} | skipped {} | cost {:.6}",
                    stats.attempts, stats.successes, stats.failures, stats.skips, stats.total_cost
                );
            }
        }

        if !self.metrics.failures_by_kind.is_empty() {
            println!("\n--- Error Breakdown ---");
            for (kind, count) in &self.metrics.failures_by_kind {
                println!("{kind}: {count}");
            }
        }
    }
}
