//! Random sources used to lay out rounds and draw tiles.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use train_mania_core::RandomSource;

/// Deterministic pseudo-random source seeded from a single integer.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    /// Creates a source whose sequence is fully determined by `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        self.rng.gen_range(0..bound)
    }
}

/// Replays a fixed sequence of values, cycling once it is exhausted.
///
/// Each value is reduced modulo the requested bound, which makes recorded
/// rounds easy to reproduce: a round reset draws the next tile, then the goal
/// row and column; every successful placement draws one more tile.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRandom {
    values: Vec<u32>,
    cursor: usize,
}

impl ScriptedRandom {
    /// Creates a source that replays `values` in order.
    #[must_use]
    pub fn new(values: Vec<u32>) -> Self {
        Self { values, cursor: 0 }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 || self.values.is_empty() {
            return 0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = self.cursor.wrapping_add(1);
        value % bound
    }
}
