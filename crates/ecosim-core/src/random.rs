//! Source of randomness consumed by the world engine.
//!
//! The engine never reaches for a global generator. Everything random flows
//! through [`RandomSource`], so a seeded [`ChaCha8Rng`] gives reproducible
//! runs. With the `test-util` feature, `ScriptedRandom` gives exact control
//! in tests.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
#[cfg(any(test, feature = "test-util"))]
use std::collections::VecDeque;

pub trait RandomSource {
    /// Returns true with probability `percent` / 100.
    fn is_true(&mut self, percent: u32) -> bool;

    /// Uniform integer in `[min, max_exclusive)`.
    fn random_int(&mut self, min: i32, max_exclusive: i32) -> i32;
}

impl RandomSource for ChaCha8Rng {
    fn is_true(&mut self, percent: u32) -> bool {
        self.gen_range(0..100) < percent
    }

    fn random_int(&mut self, min: i32, max_exclusive: i32) -> i32 {
        if max_exclusive <= min {
            return min;
        }
        self.gen_range(min..max_exclusive)
    }
}

/// Replays pre-recorded answers.
///
/// Once a queue runs dry, `is_true` answers `false` and `random_int` answers
/// `min`. Scripted integers are folded into the requested range.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    flags: VecDeque<bool>,
    ints: VecDeque<i32>,
}

#[cfg(any(test, feature = "test-util"))]
impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flags(mut self, flags: impl IntoIterator<Item = bool>) -> Self {
        self.flags.extend(flags);
        self
    }

    pub fn with_ints(mut self, ints: impl IntoIterator<Item = i32>) -> Self {
        self.ints.extend(ints);
        self
    }

    pub fn remaining(&self) -> usize {
        self.flags.len() + self.ints.len()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl RandomSource for ScriptedRandom {
    fn is_true(&mut self, _percent: u32) -> bool {
        self.flags.pop_front().unwrap_or(false)
    }

    fn random_int(&mut self, min: i32, max_exclusive: i32) -> i32 {
        let value = self.ints.pop_front().unwrap_or(min);
        if max_exclusive <= min {
            return min;
        }
        min + (value - min).rem_euclid(max_exclusive - min)
    }
}
