use beanbench_config::{CountRange, FillRates};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::errors::GenerationError;

/// Seeded source for every random decision of a run.
///
/// Output is reproducible only while draws happen in the same order, so a
/// single engine is threaded through all phases sequentially.
#[derive(Debug, Clone)]
pub struct RandomEngine {
    rng: ChaCha8Rng,
    next_id: u64,
    draws: u64,
}

impl RandomEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_id: 0,
            draws: 0,
        }
    }

    /// Integer in `[min, max)`; returns `min` without drawing when the
    /// bounds are equal.
    pub fn uniform(&mut self, min: u32, max: u32) -> Result<u32, GenerationError> {
        if min > max {
            return Err(GenerationError::Configuration(format!(
                "invalid range: min {min} exceeds max {max}"
            )));
        }
        if min == max {
            return Ok(min);
        }
        self.draws += 1;
        Ok(self.rng.random_range(min..max))
    }

    pub fn uniform_in(&mut self, range: CountRange) -> Result<u32, GenerationError> {
        self.uniform(range.min, range.max)
    }

    /// True with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.draws += 1;
        self.rng.random::<f64>() < p
    }

    /// Uniformly selected element of `items`.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Result<&'a T, GenerationError> {
        if items.is_empty() {
            return Err(GenerationError::InvariantViolation(
                "cannot pick from an empty list".to_string(),
            ));
        }
        self.draws += 1;
        let index = self.rng.random_range(0..items.len());
        Ok(&items[index])
    }

    /// Whether a nested instance is created for a reference field at
    /// `level`. Levels past 2 never nest and consume no draw.
    pub fn should_nest(&mut self, rates: &FillRates, level: u32) -> bool {
        match rates.for_level(level) {
            Some(rate) => self.chance(rate),
            None => false,
        }
    }

    /// Monotonic id, unique within the run.
    pub fn next_unique_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Number of random values consumed so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}
