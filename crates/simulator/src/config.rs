//! Run configuration.
//!
//! The config is the reproducibility unit: serialize it, store it anywhere,
//! deserialize it later, and the same scripted target produces the same run.
//! The seed is deliberately a required field with no default.

use serde::{Deserialize, Serialize};

fn default_delay_multiplier() -> f64 {
    1.0
}

fn default_burst_pause_ms() -> u64 {
    150
}

fn default_progress_every() -> u32 {
    1
}

fn default_event_capacity() -> usize {
    256
}

/// Tuning for a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Seed for every deterministic draw the run makes.
    pub seed: u64,
    /// Scale applied to each timing-profile draw. Below 1 compresses a run,
    /// 0 removes the waits entirely.
    #[serde(default = "default_delay_multiplier")]
    pub delay_multiplier: f64,
    /// Pause between back-to-back burst calls, milliseconds (jittered).
    #[serde(default = "default_burst_pause_ms")]
    pub burst_pause_ms: u64,
    /// Emit a progress event every this many completed iterations.
    #[serde(default = "default_progress_every")]
    pub progress_every: u32,
    /// Broadcast buffer per subscriber; slow subscribers lag, never block.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl SimulatorConfig {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            delay_multiplier: default_delay_multiplier(),
            burst_pause_ms: default_burst_pause_ms(),
            progress_every: default_progress_every(),
            event_capacity: default_event_capacity(),
        }
    }

    pub fn with_delay_multiplier(mut self, multiplier: f64) -> Self {
        self.delay_multiplier = multiplier;
        self
    }

    pub fn with_burst_pause_ms(mut self, pause_ms: u64) -> Self {
        self.burst_pause_ms = pause_ms;
        self
    }

    pub fn with_progress_every(mut self, iterations: u32) -> Self {
        self.progress_every = iterations.max(1);
        self
    }
}
