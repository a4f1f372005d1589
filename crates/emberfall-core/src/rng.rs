//! Random number generator abstraction for determinism.
//!
//! In production this wraps a real RNG. In tests, a seeded or scripted
//! implementation is injected so dice rolls are repeatable.

use rand::Rng;

/// Abstraction over random number generation.
pub trait DeterministicRng: Send + Sync {
    /// Generate a random `usize` index in `[0, len)`. `len` must be nonzero.
    fn next_index(&mut self, len: usize) -> usize;
}

/// Production RNG backed by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngDice;

impl DeterministicRng for ThreadRngDice {
    fn next_index(&mut self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}
