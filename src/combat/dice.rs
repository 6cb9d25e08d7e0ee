//! Randomness for combat, behind a trait so battles can be replayed
//!
//! Production settlements draw from a seeded ChaCha stream or OS entropy;
//! tests script the draws with [`FixedDice`].

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of every random decision combat makes
pub trait Dice {
    /// Uniform draw in `[low, high]`
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// Critical hit roll, true with probability `p`
    fn critical(&mut self, p: f64) -> bool;

    /// Dodge roll, true with probability `p`
    fn dodge(&mut self, p: f64) -> bool;

    /// Uniform index in `0..n`; `n` must be positive
    fn below(&mut self, n: usize) -> usize;

    /// Uniform integer in `[low, high]`
    fn between(&mut self, low: u32, high: u32) -> u32;
}

/// [`Dice`] backed by any `rand` generator
#[derive(Debug, Clone)]
pub struct RngDice<R: Rng> {
    rng: R,
}

impl<R: Rng> RngDice<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngDice<ChaCha8Rng> {
    /// Reproducible dice: the same seed replays the same battle
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl RngDice<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> Dice for RngDice<R> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    fn critical(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }

    fn dodge(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }

    fn below(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    fn between(&mut self, low: u32, high: u32) -> u32 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// Scripted dice: constant luck and fixed crit/dodge outcomes
///
/// `below` and `between` always return their lowest value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedDice {
    pub luck: f64,
    pub critical: bool,
    pub dodge: bool,
}

impl FixedDice {
    /// Luck 1.0, no crits, no dodges
    pub fn even() -> Self {
        Self::with_luck(1.0)
    }

    pub fn with_luck(luck: f64) -> Self {
        Self {
            luck,
            critical: false,
            dodge: false,
        }
    }
}

impl Dice for FixedDice {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.luck.clamp(low, high)
    }

    fn critical(&mut self, p: f64) -> bool {
        self.critical && p > 0.0
    }

    fn dodge(&mut self, p: f64) -> bool {
        self.dodge && p > 0.0
    }

    fn below(&mut self, _n: usize) -> usize {
        0
    }

    fn between(&mut self, low: u32, _high: u32) -> u32 {
        low
    }
}

/// Hands each settlement its own dice
pub trait DiceSource: Send + Sync {
    fn dice(&self) -> Box<dyn Dice + Send>;
}

/// Per-settlement seeds drawn from one master ChaCha stream
pub struct SeededDiceSource {
    master: Mutex<ChaCha8Rng>,
}

impl SeededDiceSource {
    pub fn new(seed: u64) -> Self {
        Self {
            master: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy().gen())
    }
}

impl DiceSource for SeededDiceSource {
    fn dice(&self) -> Box<dyn Dice + Send> {
        let seed = match self.master.lock() {
            Ok(mut master) => master.gen(),
            Err(poisoned) => poisoned.into_inner().gen(),
        };
        Box::new(RngDice::seeded(seed))
    }
}

impl DiceSource for FixedDice {
    fn dice(&self) -> Box<dyn Dice + Send> {
        Box::new(*self)
    }
}
