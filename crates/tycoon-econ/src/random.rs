//! Pluggable randomness behind every draw the economy makes.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::MAX_VARIATION_PERCENT;

/// Source of every random draw made by the economy.
pub trait RandomSource {
    /// Price noise percentage in `[-10, 10)`, drawn from a generator freshly
    /// seeded with `seed`. Equal seeds yield equal noise.
    fn price_noise(&mut self, seed: u64) -> Decimal;
    /// Uniform index in `[0, len)`; `len` must be > 0.
    fn pick(&mut self, len: usize) -> usize;
    /// Uniform integer in `[min, max]`.
    fn between(&mut self, min: u32, max: u32) -> u32;
}

/// ChaCha-backed source used outside tests.
pub struct ChaChaSource {
    rng: ChaCha8Rng,
}

impl ChaChaSource {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self::seeded(rand::random())
    }
}

impl RandomSource for ChaChaSource {
    fn price_noise(&mut self, seed: u64) -> Decimal {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let max = MAX_VARIATION_PERCENT as f64;
        let u: f64 = rng.gen_range(-max..max);
        Decimal::from_f64(u).unwrap_or(Decimal::ZERO)
    }

    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    fn between(&mut self, min: u32, max: u32) -> u32 {
        self.rng.gen_range(min..=max)
    }
}

/// Replays scripted draws; once a queue is exhausted it falls back to zero
/// noise, the first index and the minimum quantity.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    noise: VecDeque<Decimal>,
    picks: VecDeque<usize>,
    quantities: VecDeque<u32>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_noise(mut self, noise: impl IntoIterator<Item = Decimal>) -> Self {
        self.noise.extend(noise);
        self
    }

    pub fn with_picks(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks.extend(picks);
        self
    }

    pub fn with_quantities(mut self, quantities: impl IntoIterator<Item = u32>) -> Self {
        self.quantities.extend(quantities);
        self
    }
}

impl RandomSource for ScriptedSource {
    fn price_noise(&mut self, _seed: u64) -> Decimal {
        self.noise.pop_front().unwrap_or(Decimal::ZERO)
    }

    fn pick(&mut self, len: usize) -> usize {
        self.picks.pop_front().unwrap_or(0) % len.max(1)
    }

    fn between(&mut self, min: u32, max: u32) -> u32 {
        self.quantities
            .pop_front()
            .unwrap_or(min)
            .clamp(min, max)
    }
}
