//! Turn tracker: whose turn it is and which actions are legal.
//!
//! ```text
//! FirstRound ──(last seat placed)──▶ SecondRound ──(seat 0 placed)──▶ Rolling
//! Rolling ──(7, somebody over 7 cards)──▶ Discarding ──(all discarded)──▶ Robbing
//! Rolling ──(7, nobody over 7 cards)──▶ Robbing ──(robber moved)──▶ Playing
//! Rolling ──(other numbers)──▶ Playing ──(finishTurn)──▶ Rolling (next seat)
//! ```

use crate::board::Seat;
use crate::error::{GameResult, TurnViolation};
use crate::hex::{HexCoord, VertexCoord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hands above this size must discard on a 7
pub const DISCARD_LIMIT: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Initial placement, seat order ascending
    FirstRound,
    /// Initial placement, seat order descending; grants starting resources
    SecondRound,
    /// Current player must roll
    Rolling,
    /// Current player must move the robber
    Robbing,
    /// Current player may build, trade and play cards
    Playing,
    /// Players over the hand limit must discard
    Discarding,
}

impl TurnPhase {
    pub fn is_setup(&self) -> bool {
        matches!(self, TurnPhase::FirstRound | TurnPhase::SecondRound)
    }
}

/// Pieces placed by the current seat in this setup round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupProgress {
    pub settlement: Option<VertexCoord>,
    pub road: bool,
}

impl SetupProgress {
    pub fn is_complete(&self) -> bool {
        self.settlement.is_some() && self.road
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnTracker {
    current: Seat,
    phase: TurnPhase,
    robber: HexCoord,
    player_count: u8,
    setup: SetupProgress,
    /// Cards still owed by each seat during `Discarding`
    discards_owed: BTreeMap<Seat, u32>,
    last_roll: Option<u8>,
    /// Counts completed regular turns
    turn_number: u32,
}

impl TurnTracker {
    pub fn new(player_count: u8, robber: HexCoord) -> Self {
        Self {
            current: 0,
            phase: TurnPhase::FirstRound,
            robber,
            player_count,
            setup: SetupProgress::default(),
            discards_owed: BTreeMap::new(),
            last_roll: None,
            turn_number: 0,
        }
    }

    pub fn current(&self) -> Seat {
        self.current
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn robber(&self) -> HexCoord {
        self.robber
    }

    pub fn setup(&self) -> &SetupProgress {
        &self.setup
    }

    pub fn last_roll(&self) -> Option<u8> {
        self.last_roll
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn discards_owed(&self) -> &BTreeMap<Seat, u32> {
        &self.discards_owed
    }

    pub fn discard_owed_by(&self, seat: Seat) -> Option<u32> {
        self.discards_owed.get(&seat).copied()
    }

    // ==================== Guards ====================

    pub fn ensure_current(&self, seat: Seat) -> GameResult<()> {
        if seat != self.current {
            return Err(TurnViolation::NotYourTurn {
                current: self.current,
            }
            .into());
        }
        Ok(())
    }

    pub fn ensure_phase(&self, allowed: &[TurnPhase]) -> GameResult<()> {
        if !allowed.contains(&self.phase) {
            return Err(TurnViolation::WrongPhase(self.phase).into());
        }
        Ok(())
    }

    /// The usual gate for turn-bound commands
    pub fn ensure_turn(&self, seat: Seat, allowed: &[TurnPhase]) -> GameResult<()> {
        self.ensure_phase(allowed)?;
        self.ensure_current(seat)
    }

    // ==================== Setup ====================

    pub fn record_setup_settlement(&mut self, vertex: VertexCoord) {
        self.setup.settlement = Some(vertex);
    }

    pub fn record_setup_road(&mut self) {
        self.setup.road = true;
    }

    /// Move to the next placing seat once both setup pieces are down.
    /// Returns true if the seat changed.
    pub fn advance_setup(&mut self) -> bool {
        if !self.setup.is_complete() {
            return false;
        }
        self.setup = SetupProgress::default();

        let last = self.player_count.saturating_sub(1);
        match self.phase {
            TurnPhase::FirstRound if self.current < last => self.current += 1,
            // The last seat places again to open the second round
            TurnPhase::FirstRound => self.phase = TurnPhase::SecondRound,
            TurnPhase::SecondRound if self.current > 0 => self.current -= 1,
            TurnPhase::SecondRound => {
                self.phase = TurnPhase::Rolling;
                self.current = 0;
            }
            _ => return false,
        }
        true
    }

    // ==================== Rolling and robbing ====================

    /// Record a roll of 7: go to `Discarding` when anyone owes cards,
    /// otherwise straight to `Robbing`
    pub fn begin_robbery(&mut self, owed: BTreeMap<Seat, u32>) {
        self.last_roll = Some(7);
        self.discards_owed = owed;
        self.phase = if self.discards_owed.is_empty() {
            TurnPhase::Robbing
        } else {
            TurnPhase::Discarding
        };
    }

    /// Record a producing roll
    pub fn begin_playing(&mut self, roll: u8) {
        self.last_roll = Some(roll);
        self.phase = TurnPhase::Playing;
    }

    /// Mark a seat's discard as done; `Robbing` follows the last one
    pub fn record_discard(&mut self, seat: Seat) {
        self.discards_owed.remove(&seat);
        if self.discards_owed.is_empty() {
            self.phase = TurnPhase::Robbing;
        }
    }

    pub fn move_robber(&mut self, hex: HexCoord) {
        self.robber = hex;
        if self.phase == TurnPhase::Robbing {
            self.phase = TurnPhase::Playing;
        }
    }

    /// Pass the turn to the next seat
    pub fn finish_turn(&mut self) {
        self.current = (self.current + 1) % self.player_count.max(1);
        self.phase = TurnPhase::Rolling;
        self.last_roll = None;
        self.turn_number += 1;
    }
}
