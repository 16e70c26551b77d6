//! Named behavioral profiles for simulated actors.
//!
//! An archetype bundles everything that makes one actor population behave
//! differently from another: how often it skips a step, which timing profile
//! paces it, how its transaction sizes are distributed, whether it bursts,
//! and which contract functions are in character for it.

use crate::BehaviorError;
use serde::{Deserialize, Serialize};
use stampede_rng::DeterministicRng;
use stampede_types::FunctionId;
use std::collections::HashMap;
use tracing::debug;

/// Shape of the transaction-size distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SizeDistribution {
    /// Flat spread across the range.
    Uniform,
    /// Heavy-tailed: many small values, a thin tail of large ones.
    /// Requires `exponent > 0` and `exponent != 1`.
    PowerLaw { exponent: f64 },
}

/// Transaction-size range plus its distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: f64,
    pub max: f64,
    pub distribution: SizeDistribution,
}

impl SizeRange {
    pub fn uniform(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            distribution: SizeDistribution::Uniform,
        }
    }

    pub fn power_law(min: f64, max: f64, exponent: f64) -> Self {
        Self {
            min,
            max,
            distribution: SizeDistribution::PowerLaw { exponent },
        }
    }
}

/// Burst behavior: occasionally fire several calls back-to-back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BurstConfig {
    pub enabled: bool,
    /// Calls per burst.
    pub size: u32,
    /// Probability that an eligible step bursts.
    pub frequency: f64,
}

impl BurstConfig {
    pub fn every(size: u32, frequency: f64) -> Self {
        Self {
            enabled: true,
            size,
            frequency,
        }
    }
}

/// One named behavioral profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeProfile {
    /// Probability that a simulation step is skipped entirely.
    pub skip_probability: f64,
    /// Timing profile name pacing this archetype's steps.
    pub timing_profile: String,
    pub size: SizeRange,
    #[serde(default)]
    pub burst: BurstConfig,
    /// Functions this archetype gravitates to. Empty means no restriction.
    #[serde(default)]
    pub preferred_functions: Vec<FunctionId>,
    /// Functions this archetype never calls.
    #[serde(default)]
    pub avoid_functions: Vec<FunctionId>,
}

/// Registry of archetypes bound to one deterministic random source.
///
/// Each simulation run builds its own registry from its own seed; there is no
/// shared global state between concurrent runs.
#[derive(Debug)]
pub struct ArchetypeRegistry {
    archetypes: HashMap<String, ArchetypeProfile>,
    rng: DeterministicRng,
}

impl ArchetypeRegistry {
    /// An empty registry. Most callers want [`ArchetypeRegistry::with_defaults`].
    pub fn new(rng: DeterministicRng) -> Self {
        Self {
            archetypes: HashMap::new(),
            rng,
        }
    }

    /// A registry preloaded with the built-in archetypes.
    pub fn with_defaults(rng: DeterministicRng) -> Self {
        let mut registry = Self::new(rng);
        for (name, profile) in builtin_archetypes() {
            let installed = registry.register(name, profile);
            debug_assert!(installed.is_ok());
        }
        registry
    }

    /// Register (or replace) an archetype after validating every invariant.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        profile: ArchetypeProfile,
    ) -> Result<(), BehaviorError> {
        let name = name.into();
        Self::validate(&name, &profile)?;
        debug!(archetype = %name, skip = profile.skip_probability, "Registered archetype");
        self.archetypes.insert(name, profile);
        Ok(())
    }

    fn validate(name: &str, profile: &ArchetypeProfile) -> Result<(), BehaviorError> {
        let invalid = |reason: String| BehaviorError::InvalidArchetype {
            name: name.to_string(),
            reason,
        };

        if !(0.0..=1.0).contains(&profile.skip_probability) {
            return Err(invalid(format!(
                "skip_probability {} outside [0, 1]",
                profile.skip_probability
            )));
        }
        if !profile.size.min.is_finite() || !profile.size.max.is_finite() {
            return Err(invalid("size bounds must be finite".to_string()));
        }
        if profile.size.min >= profile.size.max {
            return Err(invalid(format!(
                "size min {} must be below max {}",
                profile.size.min, profile.size.max
            )));
        }
        if let SizeDistribution::PowerLaw { exponent } = profile.size.distribution {
            if exponent <= 0.0 {
                return Err(invalid(format!("power-law exponent {exponent} must be positive")));
            }
            // exponent == 1 makes the inverse CDF divide by zero.
            if exponent == 1.0 {
                return Err(invalid("power-law exponent must not equal 1".to_string()));
            }
            if profile.size.min <= 0.0 {
                return Err(invalid(format!(
                    "power-law size min {} must be positive",
                    profile.size.min
                )));
            }
        }
        if profile.burst.enabled {
            if profile.burst.size == 0 {
                return Err(invalid("burst size must be at least 1".to_string()));
            }
            if !(0.0..=1.0).contains(&profile.burst.frequency) {
                return Err(invalid(format!(
                    "burst frequency {} outside [0, 1]",
                    profile.burst.frequency
                )));
            }
        }
        Ok(())
    }

    /// Look up an archetype by name.
    pub fn get(&self, name: &str) -> Result<&ArchetypeProfile, BehaviorError> {
        self.archetypes
            .get(name)
            .ok_or_else(|| BehaviorError::UnknownArchetype(name.to_string()))
    }

    /// Registered archetype names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.archetypes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// One uniform draw against the archetype's skip probability.
    pub fn should_skip(&mut self, name: &str) -> Result<bool, BehaviorError> {
        let p = self.get(name)?.skip_probability;
        Ok(self.rng.next() < p)
    }

    /// Whether an eligible step bursts. Draws nothing when bursting is
    /// disabled for the archetype.
    pub fn should_burst(&mut self, name: &str) -> Result<bool, BehaviorError> {
        let burst = self.get(name)?.burst;
        if !burst.enabled {
            return Ok(false);
        }
        Ok(self.rng.next() < burst.frequency)
    }

    /// Sample a transaction size from the archetype's distribution.
    pub fn generate_transaction_size(&mut self, name: &str) -> Result<f64, BehaviorError> {
        let size = self.get(name)?.size;
        let r = self.rng.next();
        let value = match size.distribution {
            SizeDistribution::Uniform => size.min + r * (size.max - size.min),
            SizeDistribution::PowerLaw { exponent } => {
                // Inverse-CDF transform; registration guarantees
                // exponent != 1 and min > 0.
                let one_minus = 1.0 - exponent;
                let min_pow = size.min.powf(one_minus);
                let max_pow = size.max.powf(one_minus);
                (min_pow + r * (max_pow - min_pow)).powf(1.0 / one_minus)
            }
        };
        Ok(value.clamp(size.min, size.max))
    }

    /// Whether a contract function is in character for the archetype.
    ///
    /// Avoided functions always lose; otherwise a non-empty preferred list
    /// acts as an allow-list; an empty one allows everything.
    pub fn is_function_suitable(
        &self,
        name: &str,
        function: &FunctionId,
    ) -> Result<bool, BehaviorError> {
        let profile = self.get(name)?;
        if profile.avoid_functions.contains(function) {
            return Ok(false);
        }
        if !profile.preferred_functions.is_empty() {
            return Ok(profile.preferred_functions.contains(function));
        }
        Ok(true)
    }
}

/// The archetype set shipped by default.
///
/// `whale` is the canonical heavy-tail profile: it mostly watches
/// (skip 0.8) but moves large sizes when it acts.
pub fn builtin_archetypes() -> Vec<(&'static str, ArchetypeProfile)> {
    vec![
        (
            "casual",
            ArchetypeProfile {
                skip_probability: 0.6,
                timing_profile: "normal".to_string(),
                size: SizeRange::uniform(1.0, 50.0),
                burst: BurstConfig::default(),
                preferred_functions: Vec::new(),
                avoid_functions: Vec::new(),
            },
        ),
        (
            "degen",
            ArchetypeProfile {
                skip_probability: 0.1,
                timing_profile: "snappy".to_string(),
                size: SizeRange::power_law(1.0, 500.0, 2.0),
                burst: BurstConfig::every(5, 0.2),
                preferred_functions: Vec::new(),
                avoid_functions: Vec::new(),
            },
        ),
        (
            "whale",
            ArchetypeProfile {
                skip_probability: 0.8,
                timing_profile: "deliberate".to_string(),
                size: SizeRange::power_law(10.0, 1_000.0, 1.5),
                burst: BurstConfig::default(),
                preferred_functions: Vec::new(),
                avoid_functions: Vec::new(),
            },
        ),
        (
            "bot",
            ArchetypeProfile {
                skip_probability: 0.02,
                timing_profile: "instant".to_string(),
                size: SizeRange::uniform(1.0, 10.0),
                burst: BurstConfig::every(10, 0.5),
                preferred_functions: Vec::new(),
                avoid_functions: Vec::new(),
            },
        ),
        (
            "idler",
            ArchetypeProfile {
                skip_probability: 0.95,
                timing_profile: "idle".to_string(),
                size: SizeRange::uniform(1.0, 5.0),
                burst: BurstConfig::default(),
                preferred_functions: Vec::new(),
                avoid_functions: Vec::new(),
            },
        ),
    ]
}
