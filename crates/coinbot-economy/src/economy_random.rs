//! Injectable uniform random source for probability-gated commands.
//!
//! Every roll the outcome engine makes goes through [`RandomSource`], so tests
//! can script exact values while the server draws from a seeded `StdRng`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MAX_UNIT_VALUE: f64 = 1.0 - f64::EPSILON;

/// Trait contract for a capability producing uniform values in `[0, 1)`.
pub trait RandomSource: Send {
    fn next_unit(&mut self) -> f64;
}

/// `StdRng`-backed source used by the running bot.
#[derive(Debug, Clone)]
pub struct StdRandomSource {
    rng: StdRng,
}

impl StdRandomSource {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for StdRandomSource {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of values in order, wrapping around when exhausted.
///
/// Out-of-range entries are clamped into `[0, 1)`; an empty script always
/// yields `0.0`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandomSource {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandomSource {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }

    /// Number of values drawn so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRandomSource {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = self.cursor.saturating_add(1);
        if value.is_nan() {
            return 0.0;
        }
        value.clamp(0.0, MAX_UNIT_VALUE)
    }
}

/// Maps a unit value onto `0..span` the way `floor(unit * span)` does.
pub(crate) fn scaled_roll(unit: f64, span: u64) -> u64 {
    if span == 0 {
        return 0;
    }
    let scaled = (unit * span as f64).floor();
    if scaled <= 0.0 {
        return 0;
    }
    (scaled as u64).min(span - 1)
}
