//! Injected randomness for the probabilistic gates and shuffles.
//!
//! Everything random in the crate draws from a [`Chance`], which is any
//! `rand` generator that can cross threads. Production code uses a `StdRng`
//! (seeded when [`FeedConfig::seed`](crate::config::FeedConfig) is set);
//! tests pin outcomes with [`FixedChance`] or replay a sequence with
//! [`ScriptedChance`].

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

/// A boxed-up random source.
pub trait Chance: RngCore + Send {}

impl<R: RngCore + Send> Chance for R {}

/// Bernoulli trial with probability `p`.
///
/// `p <= 0` (or NaN) never succeeds and `p >= 1` always does; neither draws.
pub fn bernoulli(chance: &mut dyn Chance, p: f64) -> bool {
    if p.is_nan() || p <= 0.0 {
        return false;
    }
    if p >= 1.0 {
        return true;
    }
    chance.random_bool(p)
}

/// Shuffle `items` in place.
pub fn shuffle<T>(chance: &mut dyn Chance, items: &mut [T]) {
    items.shuffle(chance);
}

/// Maps a roll in `[0, 1]` onto the full `u64` range, so a Bernoulli draw
/// at `p` succeeds exactly when the roll is below `p`.
fn roll_to_u64(roll: f64) -> u64 {
    // Float-to-int `as` saturates.
    (roll.clamp(0.0, 1.0) * 18_446_744_073_709_551_616.0) as u64
}

fn fill_from_u64(dest: &mut [u8], mut next: impl FnMut() -> u64) {
    for chunk in dest.chunks_mut(8) {
        let bytes = next().to_le_bytes();
        chunk.copy_from_slice(&bytes[..chunk.len()]);
    }
}

/// Returns the same roll forever.
#[derive(Debug, Clone, Copy)]
pub struct FixedChance(pub f64);

impl RngCore for FixedChance {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        roll_to_u64(self.0)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        fill_from_u64(dest, || self.next_u64())
    }
}

/// Replays scripted rolls, then repeats the fallback.
#[derive(Debug, Clone)]
pub struct ScriptedChance {
    rolls: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedChance {
    pub fn new(rolls: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            fallback,
        }
    }
}

impl RngCore for ScriptedChance {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        roll_to_u64(self.rolls.pop_front().unwrap_or(self.fallback))
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        fill_from_u64(dest, || self.next_u64())
    }
}
