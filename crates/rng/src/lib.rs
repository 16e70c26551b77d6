//! Deterministic pseudo-random source.
//!
//! Every behavioral decision in a simulation run (skips, bursts, delays,
//! transaction sizes) flows through one of these generators, so a run is
//! replayable from its seed alone. Two generators constructed from the same
//! seed produce bit-identical output sequences forever, across processes and
//! platforms.
//!
//! The generator is the 128-bit xorshift (Marsaglia 2003) over four 32-bit
//! words, seeded through a SplitMix-style mixer so nearby seeds still start
//! from well-separated states. Not cryptographic; plenty for statistical
//! shaping.

use thiserror::Error;

/// Errors from range-validated draws.
///
/// All validation happens before any state mutation, so a failed draw leaves
/// the output sequence exactly where it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RngError {
    #[error("invalid integer range: min {min} exceeds max {max}")]
    InvalidIntRange { min: i64, max: i64 },
    #[error("invalid float range: min {min}, max {max}")]
    InvalidFloatRange { min: f64, max: f64 },
    #[error("probability {0} outside [0, 1]")]
    InvalidProbability(f64),
    #[error("cannot choose from an empty slice")]
    EmptyChoice,
}

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

fn splitmix32(s: &mut u32) -> u32 {
    *s = s.wrapping_add(0x9E37_79B9);
    let mut z = *s;
    z = (z ^ (z >> 16)).wrapping_mul(0x21F0_AAAD);
    z = (z ^ (z >> 15)).wrapping_mul(0x735A_2D97);
    z ^ (z >> 15)
}

/// Seeded deterministic generator. One instance per owner; never shared.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    state: [u32; 4],
    seed: u64,
}

impl DeterministicRng {
    /// Create a generator from an integer seed.
    pub fn new(seed: u64) -> Self {
        Self {
            state: Self::derive_state(seed),
            seed,
        }
    }

    fn derive_state(seed: u64) -> [u32; 4] {
        let mut s = (seed ^ (seed >> 32)) as u32;
        let mut state = [0u32; 4];
        for word in &mut state {
            *word = splitmix32(&mut s);
        }
        // The all-zero state is a fixed point of xorshift. Unreachable through
        // the mixer in practice, but the guard keeps the contract absolute.
        if state == [0, 0, 0, 0] {
            state[0] = 1;
        }
        state
    }

    /// The seed this generator (and any `reset()` of it) started from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn next_u32(&mut self) -> u32 {
        let t = self.state[3];
        let s = self.state[0];
        self.state[3] = self.state[2];
        self.state[2] = self.state[1];
        self.state[1] = s;
        let t = t ^ (t << 11);
        let t = t ^ (t >> 8);
        self.state[0] = t ^ s ^ (s >> 19);
        self.state[0]
    }

    /// Uniform draw in `[0, 1)`. Resolution is one part in 2^32.
    pub fn next(&mut self) -> f64 {
        f64::from(self.next_u32()) * (1.0 / 4_294_967_296.0)
    }

    /// Uniform integer in `[min, max]`, both ends inclusive.
    pub fn next_int(&mut self, min: i64, max: i64) -> Result<i64, RngError> {
        if min > max {
            return Err(RngError::InvalidIntRange { min, max });
        }
        let span = (max as i128) - (min as i128) + 1;
        let offset = (self.next() * span as f64) as i128;
        Ok((min as i128 + offset.min(span - 1)) as i64)
    }

    /// Uniform float in `[min, max)`.
    pub fn next_float(&mut self, min: f64, max: f64) -> Result<f64, RngError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(RngError::InvalidFloatRange { min, max });
        }
        Ok(min + self.next() * (max - min))
    }

    /// True with probability `p`.
    pub fn next_bool(&mut self, p: f64) -> Result<bool, RngError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(RngError::InvalidProbability(p));
        }
        Ok(self.next() < p)
    }

    /// Uniformly chosen element of a non-empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Result<&'a T, RngError> {
        if items.is_empty() {
            return Err(RngError::EmptyChoice);
        }
        let index = ((self.next() * items.len() as f64) as usize).min(items.len() - 1);
        Ok(&items[index])
    }

    /// In-place Fisher-Yates shuffle. Draws nothing for slices shorter
    /// than two.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = ((self.next() * (i + 1) as f64) as usize).min(i);
            items.swap(i, j);
        }
    }

    /// Derive a related generator.
    ///
    /// The child seed depends only on the base seed and the offset, never on
    /// how many draws this generator has made, so per-actor forks are
    /// reproducible no matter when they are taken.
    pub fn fork(&self, offset: u64) -> Self {
        Self::new(
            self.seed
                .wrapping_add(offset.wrapping_mul(GOLDEN_GAMMA))
                .wrapping_add(GOLDEN_GAMMA),
        )
    }

    /// Rewind to the start of the sequence, optionally under a new seed.
    pub fn reset(&mut self, seed: Option<u64>) {
        if let Some(seed) = seed {
            self.seed = seed;
        }
        self.state = Self::derive_state(self.seed);
    }
}
