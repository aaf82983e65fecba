//! Pluggable dice.
//!
//! The game never rolls by itself: whoever submits `rollDice` draws the
//! number from a `Dice` and records it in the command, so replaying the log
//! reproduces the game without the dice.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

pub trait Dice: Send {
    /// Sum of two six-sided dice, 2..=12
    fn roll(&mut self) -> u8;
}

/// Two fair dice backed by `StdRng`
#[derive(Debug, Clone)]
pub struct StandardDice {
    rng: StdRng,
}

impl StandardDice {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Dice for StandardDice {
    fn roll(&mut self) -> u8 {
        let die1: u8 = self.rng.gen_range(1..=6);
        let die2: u8 = self.rng.gen_range(1..=6);
        die1 + die2
    }
}

/// Replays a fixed sequence of totals, cycling when exhausted
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    script: VecDeque<u8>,
}

impl ScriptedDice {
    /// Totals outside 2..=12 are clamped into range
    pub fn new(rolls: impl IntoIterator<Item = u8>) -> Self {
        Self {
            script: rolls.into_iter().map(|n| n.clamp(2, 12)).collect(),
        }
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self) -> u8 {
        match self.script.pop_front() {
            Some(number) => {
                self.script.push_back(number);
                number
            }
            None => 7,
        }
    }
}
