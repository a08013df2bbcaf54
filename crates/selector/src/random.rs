//! Random sources for picking a candidate.
//!
//! The selector only needs a uniform draw in `[0, 1)`. Keeping it behind a
//! trait lets tests pin the exact candidate that gets chosen.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Uniform random numbers in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

/// Map a draw in `[0, 1)` onto an index below `len`.
///
/// Values outside the range are clamped, so a misbehaving source can never
/// index past the end. `len` must be non-zero.
pub fn pick_index(draw: f64, len: usize) -> usize {
    debug_assert!(len > 0);
    let scaled = (draw.clamp(0.0, 1.0) * len as f64).floor() as usize;
    scaled.min(len - 1)
}

/// Thread-local RNG, the default for real runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::random::<f64>()
    }
}

/// Seedable RNG for reproducible runs.
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
    fn next_f64(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.random::<f64>(),
            Err(poisoned) => poisoned.into_inner().random::<f64>(),
        }
    }
}

/// Replays a fixed sequence of draws, repeating the last one when exhausted.
///
/// An empty sequence always yields `0.0`.
#[derive(Debug, Default)]
pub struct SequenceRandom {
    draws: Mutex<VecDeque<f64>>,
    last: Mutex<f64>,
}

impl SequenceRandom {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: Mutex::new(draws.into_iter().collect()),
            last: Mutex::new(0.0),
        }
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&self) -> f64 {
        let next = self.draws.lock().ok().and_then(|mut d| d.pop_front());
        let Ok(mut last) = self.last.lock() else {
            return next.unwrap_or(0.0);
        };
        if let Some(value) = next {
            *last = value;
        }
        *last
    }
}
