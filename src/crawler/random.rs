//! Pluggable randomness
//!
//! User-agent rotation, backoff jitter and the pause between batches all draw
//! from a [`RandomSource`], so tests can swap in a seeded or silent source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

/// Source of uniformly distributed integers
pub trait RandomSource: Send + Sync {
    /// Returns a value in `0..upper`, or 0 when `upper` is 0
    fn below(&self, upper: u64) -> u64;

    /// Picks an index into a collection of `len` items
    fn pick(&self, len: usize) -> usize {
        self.below(len as u64) as usize
    }

    /// Returns a duration in the inclusive window `min_ms..=max_ms`
    fn duration_between(&self, min_ms: u64, max_ms: u64) -> Duration {
        let span = max_ms.saturating_sub(min_ms);
        Duration::from_millis(min_ms + self.below(span.saturating_add(1)))
    }
}

/// Thread-local OS-seeded randomness for production use
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn below(&self, upper: u64) -> u64 {
        if upper == 0 {
            0
        } else {
            rand::random_range(0..upper)
        }
    }
}

/// Deterministic randomness from a fixed seed
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn below(&self, upper: u64) -> u64 {
        if upper == 0 {
            return 0;
        }
        match self.rng.lock() {
            Ok(mut rng) => rng.random_range(0..upper),
            Err(poisoned) => poisoned.into_inner().random_range(0..upper),
        }
    }
}

/// Always returns zero: no jitter, first user agent, shortest pause
#[derive(Debug, Default, Clone, Copy)]
pub struct NoJitter;

impl RandomSource for NoJitter {
    fn below(&self, _upper: u64) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_random_in_range() {
        let random = ThreadRandom;
        for _ in 0..200 {
            assert!(random.below(4) < 4);
        }
        assert_eq!(random.below(0), 0);
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let a = SeededRandom::new(42);
        let b = SeededRandom::new(42);
        let first: Vec<u64> = (0..16).map(|_| a.below(1000)).collect();
        let second: Vec<u64> = (0..16).map(|_| b.below(1000)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_duration_between_bounds() {
        let random = SeededRandom::new(7);
        for _ in 0..100 {
            let delay = random.duration_between(500, 1500);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1500));
        }
    }

    #[test]
    fn test_no_jitter() {
        assert_eq!(NoJitter.below(100), 0);
        assert_eq!(NoJitter.pick(4), 0);
        assert_eq!(NoJitter.duration_between(500, 1500), Duration::from_millis(500));
        assert_eq!(NoJitter.duration_between(0, 0), Duration::ZERO);
    }
}
