//! Settlers - authoritative rules engine for a hex-island trading game
//!
//! This crate provides the core game logic, including:
//! - Hex coordinate system for tiles, vertices, and edges
//! - Board representation with terrain, pieces, and ports
//! - Player hands, the bank, and building costs
//! - Turn state machine and achievement tracking
//! - A closed command set with a replayable command log
//!
//! # Architecture
//!
//! The engine does no I/O. A host owns one [`GameState`] per game, applies
//! [`Command`]s to it, appends successful ones to a [`CommandLog`], and hands
//! out [`GameSnapshot`]s to readers. Every commit advances the version by one.
//!
//! # Modules
//!
//! - [`hex`]: Coordinate system for hex tiles, vertices, and edges
//! - [`board`]: Game board and geometry queries
//! - [`inventory`] / [`bank`]: Resource and development card counts
//! - [`player`], [`turn`], [`achievements`]: Per-seat and per-turn state
//! - [`command`], [`game`]: Commands and the state machine applying them
//! - [`log`], [`snapshot`]: Replication and read models
//! - [`dice`]: Pluggable randomness for rolls

pub mod achievements;
pub mod bank;
pub mod board;
pub mod command;
pub mod dice;
pub mod error;
pub mod game;
pub mod hex;
pub mod inventory;
pub mod log;
pub mod player;
pub mod snapshot;
pub mod turn;

// Re-export commonly used types
pub use achievements::{Achievement, Achievements, HolderChange};
pub use bank::Bank;
pub use board::{Board, Port, PortKind, Seat, Tile, TileType, VertexBuilding};
pub use command::{Command, CommandKind, GameEvent, TradeOffer};
pub use dice::{Dice, ScriptedDice, StandardDice};
pub use error::{
    ErrorKind, GameError, GameResult, GeometryViolation, IdentityViolation, Rejection, Shortfall,
    TurnViolation,
};
pub use game::{ChatMessage, GameSetup, GameState, VICTORY_POINTS_TO_WIN};
pub use hex::{EdgeCoord, EdgeDirection, HexCoord, VertexCoord, VertexDirection};
pub use inventory::{costs, DevCardHand, DevelopmentCard, Resource, ResourceHand};
pub use log::{CommandLog, LoggedCommand};
pub use player::{PieceKind, Player, PlayerColor, PlayerRef, SeatConfig};
pub use snapshot::GameSnapshot;
pub use turn::{TurnPhase, TurnTracker};
