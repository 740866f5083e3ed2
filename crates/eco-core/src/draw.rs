//! Uniform random draws used to resolve every probabilistic rule.
//!
//! Behaviour code never touches a global RNG; a [`DrawSource`] is passed into
//! each call instead, so tests can substitute a scripted sequence.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Exclusive upper bound of a percentage draw
pub const DRAW_RANGE: u32 = 100;

pub trait DrawSource {
    /// Uniform sample in `[0, 100)`
    fn draw(&mut self) -> u32;

    /// Uniform index in `[0, n)`; `n` must be non-zero
    fn pick(&mut self, n: usize) -> usize;

    /// Roll once against a percentage chance
    fn chance(&mut self, percent: u32) -> bool {
        self.draw() < percent
    }
}

impl<D: DrawSource + ?Sized> DrawSource for &mut D {
    fn draw(&mut self) -> u32 {
        (**self).draw()
    }

    fn pick(&mut self, n: usize) -> usize {
        (**self).pick(n)
    }
}

/// Deterministic draws from a seeded ChaCha stream
#[derive(Debug, Clone)]
pub struct SeededDraws {
    rng: ChaCha8Rng,
}

impl SeededDraws {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl DrawSource for SeededDraws {
    fn draw(&mut self) -> u32 {
        self.rng.gen_range(0..DRAW_RANGE)
    }

    fn pick(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }
}

/// Replays fixed values, then falls back to constants once exhausted
#[derive(Debug, Clone)]
pub struct ScriptedDraws {
    draws: VecDeque<u32>,
    picks: VecDeque<usize>,
    fallback_draw: u32,
    fallback_pick: usize,
}

impl ScriptedDraws {
    pub fn new(draws: impl IntoIterator<Item = u32>, picks: impl IntoIterator<Item = usize>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            picks: picks.into_iter().collect(),
            fallback_draw: DRAW_RANGE - 1,
            fallback_pick: 0,
        }
    }

    /// A source whose every draw returns `value` and every pick returns `index`
    pub fn constant(value: u32, index: usize) -> Self {
        Self::new([], []).with_fallback(value, index)
    }

    pub fn with_fallback(mut self, draw: u32, pick: usize) -> Self {
        self.fallback_draw = draw.min(DRAW_RANGE - 1);
        self.fallback_pick = pick;
        self
    }

    pub fn remaining_draws(&self) -> usize {
        self.draws.len()
    }
}

impl DrawSource for ScriptedDraws {
    fn draw(&mut self) -> u32 {
        self.draws.pop_front().unwrap_or(self.fallback_draw)
    }

    fn pick(&mut self, n: usize) -> usize {
        self.picks.pop_front().unwrap_or(self.fallback_pick) % n
    }
}
