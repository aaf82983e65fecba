//! Player state: the per-seat aggregate.
//!
//! This module contains:
//! - `Player` with hands, piece supply, turn flags and victory points
//! - `PlayerColor` and `PieceKind`
//! - Seat configuration used when a game is created

use crate::board::Seat;
use crate::error::{GameResult, Shortfall, TurnViolation};
use crate::inventory::{DevCardHand, DevelopmentCard, ResourceHand};
use serde::{Deserialize, Serialize};

/// Stable identity of a seated user, supplied by the session layer
pub type PlayerRef = uuid::Uuid;

/// Pieces each player starts with
pub const ROAD_PIECES: u32 = 15;
pub const SETTLEMENT_PIECES: u32 = 5;
pub const CITY_PIECES: u32 = 4;

/// Player colour, unique among the seated players
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    Red,
    Orange,
    Yellow,
    Blue,
    Green,
    Purple,
    Puce,
    White,
    Brown,
}

impl PlayerColor {
    pub const ALL: [PlayerColor; 9] = [
        PlayerColor::Red,
        PlayerColor::Orange,
        PlayerColor::Yellow,
        PlayerColor::Blue,
        PlayerColor::Green,
        PlayerColor::Purple,
        PlayerColor::Puce,
        PlayerColor::White,
        PlayerColor::Brown,
    ];

    /// Default colour for a seat index
    pub fn for_seat(seat: Seat) -> Self {
        Self::ALL[seat as usize % Self::ALL.len()]
    }
}

/// Kinds of board pieces a player holds in supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PieceKind {
    Road,
    Settlement,
    City,
}

/// One entry of the seating list given at game creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatConfig {
    pub user: PlayerRef,
    pub name: String,
    pub color: PlayerColor,
}

/// A single player's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub seat: Seat,
    pub user: PlayerRef,
    pub name: String,
    pub color: PlayerColor,
    pub resources: ResourceHand,
    /// Cards held since before this turn; playable
    pub old_dev_cards: DevCardHand,
    /// Cards bought this turn; playable from the next turn
    pub new_dev_cards: DevCardHand,
    pub soldiers_played: u32,
    pub monuments_played: u32,
    pub roads_remaining: u32,
    pub settlements_remaining: u32,
    pub cities_remaining: u32,
    pub has_rolled: bool,
    pub has_discarded: bool,
    pub has_played_dev_card: bool,
    /// Public score, refreshed after every mutation
    pub victory_points: u32,
}

impl Player {
    pub fn new(seat: Seat, config: SeatConfig) -> Self {
        Self {
            seat,
            user: config.user,
            name: config.name,
            color: config.color,
            resources: ResourceHand::new(),
            old_dev_cards: DevCardHand::new(),
            new_dev_cards: DevCardHand::new(),
            soldiers_played: 0,
            monuments_played: 0,
            roads_remaining: ROAD_PIECES,
            settlements_remaining: SETTLEMENT_PIECES,
            cities_remaining: CITY_PIECES,
            has_rolled: false,
            has_discarded: false,
            has_played_dev_card: false,
            victory_points: 0,
        }
    }

    /// Settlements currently on the board (upgraded ones excluded)
    pub fn settlements_built(&self) -> u32 {
        SETTLEMENT_PIECES - self.settlements_remaining
    }

    pub fn cities_built(&self) -> u32 {
        CITY_PIECES - self.cities_remaining
    }

    pub fn roads_built(&self) -> u32 {
        ROAD_PIECES - self.roads_remaining
    }

    /// Score from buildings and played monuments; achievements are added by the game
    pub fn base_victory_points(&self) -> u32 {
        self.settlements_built() + 2 * self.cities_built() + self.monuments_played
    }

    pub fn hand_size(&self) -> u32 {
        self.resources.total()
    }

    pub fn dev_card_count(&self) -> u32 {
        self.old_dev_cards.total() + self.new_dev_cards.total()
    }

    /// Fail with the first resource this player cannot cover
    pub fn ensure_can_afford(&self, cost: &ResourceHand) -> GameResult<()> {
        match self.resources.first_shortfall(cost) {
            Some((resource, needed, held)) => Err(Shortfall::Resources {
                resource,
                needed,
                held,
            }
            .into()),
            None => Ok(()),
        }
    }

    pub fn ensure_piece(&self, kind: PieceKind) -> GameResult<()> {
        let remaining = match kind {
            PieceKind::Road => self.roads_remaining,
            PieceKind::Settlement => self.settlements_remaining,
            PieceKind::City => self.cities_remaining,
        };
        if remaining == 0 {
            return Err(Shortfall::Pieces(kind).into());
        }
        Ok(())
    }

    /// Whether a card of this kind can be played now. Monuments may come
    /// from either pile; everything else must be an old card.
    pub fn ensure_playable(&self, card: DevelopmentCard) -> GameResult<()> {
        let held = match card {
            DevelopmentCard::Monument => self.old_dev_cards.get(card) + self.new_dev_cards.get(card),
            _ => self.old_dev_cards.get(card),
        };
        if held == 0 {
            return Err(TurnViolation::NoPlayableCard(card).into());
        }
        if card != DevelopmentCard::Monument && self.has_played_dev_card {
            return Err(TurnViolation::DevCardAlreadyPlayed.into());
        }
        Ok(())
    }

    /// Remove a card previously checked by `ensure_playable`
    pub fn consume_dev_card(&mut self, card: DevelopmentCard) {
        if !self.old_dev_cards.remove(card) {
            self.new_dev_cards.remove(card);
        }
        match card {
            DevelopmentCard::Monument => self.monuments_played += 1,
            DevelopmentCard::Soldier => {
                self.soldiers_played += 1;
                self.has_played_dev_card = true;
            }
            _ => self.has_played_dev_card = true,
        }
    }

    /// Reset turn flags and make bought cards playable
    pub fn end_turn(&mut self) {
        let bought = std::mem::take(&mut self.new_dev_cards);
        self.old_dev_cards.add_hand(&bought);
        self.has_rolled = false;
        self.has_played_dev_card = false;
    }
}
