//! Read-only, JSON-friendly copy of a game at one version.

use crate::achievements::Achievements;
use crate::bank::Bank;
use crate::board::{BoardJson, Seat};
use crate::command::TradeOffer;
use crate::error::GameResult;
use crate::game::{ChatMessage, GameState};
use crate::player::Player;
use crate::turn::TurnTracker;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub version: u64,
    pub board: BoardJson,
    pub players: Vec<Player>,
    pub turn: TurnTracker,
    pub bank: Bank,
    pub achievements: Achievements,
    pub pending_trade: Option<TradeOffer>,
    pub chat: Vec<ChatMessage>,
    pub winner: Option<Seat>,
}

impl GameSnapshot {
    pub fn to_json(&self) -> GameResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<&GameState> for GameSnapshot {
    fn from(game: &GameState) -> Self {
        Self {
            version: game.version(),
            board: game.board.to_json_friendly(),
            players: game.players.clone(),
            turn: game.turn.clone(),
            bank: game.bank.clone(),
            achievements: game.achievements,
            pending_trade: game.pending_trade.clone(),
            chat: game.chat.clone(),
            winner: game.winner(),
        }
    }
}

impl GameState {
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::from(self)
    }
}
