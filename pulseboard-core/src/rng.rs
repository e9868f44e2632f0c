//! Jitter source for synthetic and partially-synthetic records.
//!
//! Unseeded jitter draws from entropy, so two refreshes differ. A seed makes
//! the sequence reproducible, which tests and demos rely on.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Thread-safe uniform jitter shared by the adapters of one source.
#[derive(Debug)]
pub struct Jitter {
    rng: Mutex<StdRng>,
    seeded: bool,
}

impl Jitter {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
            seeded: seed.is_some(),
        }
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Uniform draw from `[lo, hi)`. Returns `lo` for an empty range.
    pub fn uniform(&self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(lo..hi)
    }

    /// Uniform draw from `[0, 1)`.
    pub fn unit(&self) -> f64 {
        self.uniform(0.0, 1.0)
    }

    /// Pick one element. Returns `None` for an empty slice.
    pub fn pick<T: Copy>(&self, items: &[T]) -> Option<T> {
        if items.is_empty() {
            return None;
        }
        let i = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..items.len());
        Some(items[i])
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::new(None)
    }
}
