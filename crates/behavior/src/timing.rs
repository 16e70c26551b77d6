//! Human-like delay generation from named statistical profiles.
//!
//! A delay draw averages two independent uniforms, which gives a triangular
//! distribution clustered at the profile midpoint instead of a flat spread.
//! Real users pause around a typical think time; they rarely sit exactly at
//! either extreme.

use crate::BehaviorError;
use stampede_rng::DeterministicRng;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace};

/// Jitter applied to typing delays, as a fraction of the base duration.
const TYPING_JITTER: f64 = 0.2;

/// Jitter applied to burst pauses, spread `±25%` around the requested pause.
const BURST_JITTER: f64 = 0.25;

/// Characters per word for words-per-minute conversion.
const CHARS_PER_WORD: f64 = 5.0;

/// A named delay range with a jitter fraction.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimingProfile {
    /// Lower bound of the base delay, milliseconds.
    pub min_ms: u64,
    /// Upper bound of the base delay, milliseconds.
    pub max_ms: u64,
    /// Jitter fraction in `[0, 1]`; the sampled delay is scaled by a factor
    /// drawn uniformly from `1 ± variance`.
    pub variance: f64,
}

impl TimingProfile {
    pub fn new(min_ms: u64, max_ms: u64, variance: f64) -> Self {
        Self {
            min_ms,
            max_ms,
            variance,
        }
    }
}

/// Per-call options for a delay draw.
#[derive(Debug, Clone, Copy)]
pub struct DelayOptions {
    /// Apply the profile's jitter factor. Disabled for statistical tests
    /// that need the pure triangular shape.
    pub variance: bool,
    /// Caller-supplied scaling applied last.
    pub multiplier: f64,
}

impl Default for DelayOptions {
    fn default() -> Self {
        Self {
            variance: true,
            multiplier: 1.0,
        }
    }
}

impl DelayOptions {
    pub fn without_variance() -> Self {
        Self {
            variance: false,
            multiplier: 1.0,
        }
    }

    pub fn with_multiplier(multiplier: f64) -> Self {
        Self {
            variance: true,
            multiplier,
        }
    }
}

/// One step of a [`TimingGenerator::timing_sequence`] run.
#[derive(Debug, Clone)]
pub struct TimingStep {
    pub label: String,
    pub profile: String,
    pub options: DelayOptions,
}

impl TimingStep {
    pub fn new(label: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            profile: profile.into(),
            options: DelayOptions::default(),
        }
    }
}

/// Record of one executed sequence step.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingLogEntry {
    pub label: String,
    pub waited_ms: u64,
}

/// Samples delays from named profiles using a deterministic generator.
///
/// Owns its random source; two generators built from the same seed sample
/// identical delay sequences.
#[derive(Debug)]
pub struct TimingGenerator {
    profiles: HashMap<String, TimingProfile>,
    rng: DeterministicRng,
}

impl TimingGenerator {
    /// A generator with the built-in profile set.
    pub fn new(rng: DeterministicRng) -> Self {
        let mut generator = Self::empty(rng);
        for (name, profile) in builtin_profiles() {
            let installed = generator.add_profile(name, profile);
            debug_assert!(installed.is_ok());
        }
        generator
    }

    /// A generator with no profiles registered.
    pub fn empty(rng: DeterministicRng) -> Self {
        Self {
            profiles: HashMap::new(),
            rng,
        }
    }

    /// Register (or replace) a profile after validating its bounds.
    pub fn add_profile(
        &mut self,
        name: impl Into<String>,
        profile: TimingProfile,
    ) -> Result<(), BehaviorError> {
        let name = name.into();
        if profile.min_ms >= profile.max_ms {
            return Err(BehaviorError::InvalidProfile {
                name,
                reason: format!("min_ms {} must be below max_ms {}", profile.min_ms, profile.max_ms),
            });
        }
        if !(0.0..=1.0).contains(&profile.variance) {
            return Err(BehaviorError::InvalidProfile {
                name,
                reason: format!("variance {} outside [0, 1]", profile.variance),
            });
        }
        debug!(profile = %name, min_ms = profile.min_ms, max_ms = profile.max_ms, "Registered timing profile");
        self.profiles.insert(name, profile);
        Ok(())
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<TimingProfile, BehaviorError> {
        self.profiles
            .get(name)
            .copied()
            .ok_or_else(|| BehaviorError::UnknownProfile(name.to_string()))
    }

    /// Registered profile names, sorted.
    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Draw a delay without suspending. Used by the awaiting variant and by
    /// distribution analysis.
    pub fn sample_delay(
        &mut self,
        profile_name: &str,
        options: DelayOptions,
    ) -> Result<u64, BehaviorError> {
        let profile = self.profile(profile_name)?;

        // Average of two uniforms: triangular around the midpoint.
        let base = (self.rng.next() + self.rng.next()) / 2.0;
        let span = (profile.max_ms - profile.min_ms) as f64;
        let mut ms = profile.min_ms as f64 + base * span;

        if options.variance {
            let jitter = 1.0 + (self.rng.next() * 2.0 - 1.0) * profile.variance;
            ms *= jitter;
        }
        ms *= options.multiplier;

        let ms = ms.max(0.0).round() as u64;
        trace!(profile = %profile_name, ms, "Sampled delay");
        Ok(ms)
    }

    /// Draw a delay and wait it out. Returns the milliseconds waited.
    pub async fn delay(
        &mut self,
        profile_name: &str,
        options: DelayOptions,
    ) -> Result<u64, BehaviorError> {
        let ms = self.sample_delay(profile_name, options)?;
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(ms)
    }

    /// Delay derived from typing `text` at `words_per_minute`, with jitter.
    pub fn typing_delay(&mut self, text: &str, words_per_minute: u32) -> Result<u64, BehaviorError> {
        if words_per_minute == 0 {
            return Err(BehaviorError::InvalidProfile {
                name: "typing".to_string(),
                reason: "words_per_minute must be positive".to_string(),
            });
        }
        let words = text.chars().count() as f64 / CHARS_PER_WORD;
        let base_ms = words / f64::from(words_per_minute) * 60_000.0;
        let jitter = 1.0 + (self.rng.next() * 2.0 - 1.0) * TYPING_JITTER;
        Ok((base_ms * jitter).max(0.0).round() as u64)
    }

    /// Run `count` steps back-to-back: invoke `on_step`, then pause around
    /// `pause_ms` (jittered) between steps. Returns the waited milliseconds
    /// per pause; the final step has no trailing pause.
    pub async fn burst_pattern<F, Fut>(
        &mut self,
        count: usize,
        pause_ms: u64,
        mut on_step: F,
    ) -> Vec<u64>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut waits = Vec::with_capacity(count.saturating_sub(1));
        for index in 0..count {
            on_step(index).await;
            if index + 1 < count {
                let jitter = 1.0 + (self.rng.next() * 2.0 - 1.0) * BURST_JITTER;
                let ms = (pause_ms as f64 * jitter).max(0.0).round() as u64;
                tokio::time::sleep(Duration::from_millis(ms)).await;
                waits.push(ms);
            }
        }
        waits
    }

    /// Await each step's profile in order, collecting a log of actual waits.
    ///
    /// Profile names are validated up front; an unknown name fails the whole
    /// sequence before anything is awaited.
    pub async fn timing_sequence(
        &mut self,
        steps: &[TimingStep],
    ) -> Result<Vec<TimingLogEntry>, BehaviorError> {
        for step in steps {
            self.profile(&step.profile)?;
        }

        let mut log = Vec::with_capacity(steps.len());
        for step in steps {
            let waited_ms = self.delay(&step.profile, step.options).await?;
            log.push(TimingLogEntry {
                label: step.label.clone(),
                waited_ms,
            });
        }
        Ok(log)
    }
}

/// The profile set every generator starts with.
pub fn builtin_profiles() -> Vec<(&'static str, TimingProfile)> {
    vec![
        ("instant", TimingProfile::new(0, 80, 0.1)),
        ("snappy", TimingProfile::new(300, 1_200, 0.25)),
        ("normal", TimingProfile::new(2_000, 8_000, 0.3)),
        ("deliberate", TimingProfile::new(5_000, 15_000, 0.35)),
        ("idle", TimingProfile::new(30_000, 90_000, 0.5)),
    ]
}
