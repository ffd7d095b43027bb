//! Caption sampling without immediate reuse.
//!
//! The sampler owns the used-set so the no-repeat guarantee lives in one
//! place instead of being re-filtered at every call site. All randomness
//! flows through the caller's `Rng`, which keeps draws reproducible under
//! a seeded generator.

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use crate::content::{HORSE_LONG_POOL, HORSE_SHORT_POOL};

/// Samples captions from string pools, preferring ones not drawn before.
///
/// A single sampler instance is shared across all slots of one batch, so a
/// caption used by any earlier slot is excluded from later draws until its
/// pool is exhausted. Once every element of a pool has been used, sampling
/// falls back to the full pool and repeats become possible.
#[derive(Debug, Default, Clone)]
pub struct ContentSampler {
    used: HashSet<String>,
}

impl ContentSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws one caption from `pool`.
    ///
    /// Unused elements are sampled uniformly; if none remain the full pool
    /// is sampled instead. The draw is recorded as used.
    pub fn pick<R: Rng + ?Sized>(&mut self, rng: &mut R, pool: &[&str]) -> String {
        let available: Vec<&&str> = pool.iter().filter(|item| !self.used.contains(**item)).collect();

        let choice = if available.is_empty() {
            pool.choose(rng).copied().unwrap_or_default()
        } else {
            available
                .choose(rng)
                .map(|item| **item)
                .unwrap_or_default()
        };

        let choice = choice.to_string();
        self.used.insert(choice.clone());
        choice
    }

    /// Number of distinct captions drawn so far.
    pub fn used_count(&self) -> usize {
        self.used.len()
    }

    /// Forgets all previous draws.
    pub fn clear(&mut self) {
        self.used.clear();
    }
}

/// Draws the 12 horse-theme captions: 9 long-form and 3 short-form
/// greetings, shuffled together.
pub fn draw_horse_captions<R: Rng + ?Sized>(rng: &mut R) -> Vec<String> {
    let mut long: Vec<&str> = HORSE_LONG_POOL.to_vec();
    long.shuffle(rng);
    let mut short: Vec<&str> = HORSE_SHORT_POOL.to_vec();
    short.shuffle(rng);

    let mut captions: Vec<String> = long
        .into_iter()
        .take(9)
        .chain(short.into_iter().take(3))
        .map(str::to_string)
        .collect();
    captions.shuffle(rng);
    captions
}
