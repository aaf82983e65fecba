//! Rejection taxonomy for commands and game setup.
//!
//! Every failure is recoverable at the command boundary: a rejected command
//! leaves the game untouched. Each kind carries a typed detail so the caller
//! can render a specific message.

use crate::board::Seat;
use crate::inventory::{DevelopmentCard, Resource};
use crate::player::{PieceKind, PlayerColor, PlayerRef};
use crate::turn::TurnPhase;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type GameResult<T> = Result<T, GameError>;

/// Wrong phase or wrong acting player
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnViolation {
    #[error("the game is over")]
    GameOver,

    #[error("seat {current} is to act")]
    NotYourTurn { current: Seat },

    #[error("not allowed during {0:?}")]
    WrongPhase(TurnPhase),

    #[error("free placement is only allowed during setup")]
    FreeOutsideSetup,

    #[error("only free placements are allowed during setup")]
    PaidDuringSetup,

    #[error("this setup {0:?} is already placed")]
    SetupPiecePlaced(PieceKind),

    #[error("a development card was already played this turn")]
    DevCardAlreadyPlayed,

    #[error("no playable {0:?} card")]
    NoPlayableCard(DevelopmentCard),

    #[error("no discard is owed")]
    NoDiscardOwed,

    #[error("a trade offer is already pending")]
    TradePending,

    #[error("no trade offer is pending")]
    NoPendingTrade,

    #[error("only the receiver of the offer may respond")]
    NotTradeReceiver,

    #[error("dice are rolled by the server")]
    DiceRolledByServer,
}

/// Costs or amounts that cannot be covered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Shortfall {
    #[error("needs {needed} {resource}, holds {held}")]
    Resources {
        resource: Resource,
        needed: u32,
        held: u32,
    },

    #[error("no {0:?} pieces left")]
    Pieces(PieceKind),

    #[error("the bank cannot supply {0}")]
    Bank(Resource),

    #[error("the development deck is empty")]
    DeckEmpty,

    #[error("seat {seat} cannot cover their side of the trade")]
    Counterparty { seat: Seat },

    #[error("must discard exactly {expected} cards, got {got}")]
    DiscardCount { expected: u32, got: u32 },

    #[error("a trade must exchange something on both sides")]
    EmptyTrade,
}

/// Illegal location, adjacency or port usage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryViolation {
    #[error("location is not on land")]
    OffBoard,

    #[error("location is already occupied")]
    Occupied,

    #[error("another building is within one edge")]
    DistanceRule,

    #[error("not connected to the player's network")]
    NotConnected,

    #[error("no own settlement to upgrade")]
    NoSettlement,

    #[error("the robber must move to a different hex")]
    RobberNotMoved,

    #[error("seat {0} cannot be robbed from this hex")]
    InvalidVictim(Seat),

    #[error("ratio {ratio} for {resource} needs a matching port")]
    PortRequired { ratio: u32, resource: Resource },

    #[error("{0} is not a maritime ratio")]
    InvalidRatio(u32),

    #[error("cannot exchange {0} for itself")]
    SameResource(Resource),

    #[error("both roads must be distinct")]
    DuplicateRoad,
}

/// Unknown or conflicting identities
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityViolation {
    #[error("{0} is not seated in this game")]
    NotSeated(PlayerRef),

    #[error("seat {0} does not exist")]
    UnknownSeat(Seat),

    #[error("cannot trade with yourself")]
    SelfTrade,

    #[error("{0} is seated twice")]
    DuplicatePlayer(PlayerRef),

    #[error("colour {0:?} is taken")]
    DuplicateColor(PlayerColor),

    #[error("a game needs 2 to 4 players, got {0}")]
    SeatCount(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("turn violation: {0}")]
    Turn(#[from] TurnViolation),

    #[error("insufficient resources: {0}")]
    Insufficient(#[from] Shortfall),

    #[error("geometry violation: {0}")]
    Geometry(#[from] GeometryViolation),

    #[error("identity violation: {0}")]
    Identity(#[from] IdentityViolation),

    #[error("serialization fault: {0}")]
    Serialization(String),
}

/// Coarse classification used at the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    TurnViolation,
    InsufficientResources,
    GeometryViolation,
    IdentityViolation,
    SerializationFault,
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::Turn(_) => ErrorKind::TurnViolation,
            GameError::Insufficient(_) => ErrorKind::InsufficientResources,
            GameError::Geometry(_) => ErrorKind::GeometryViolation,
            GameError::Identity(_) => ErrorKind::IdentityViolation,
            GameError::Serialization(_) => ErrorKind::SerializationFault,
        }
    }
}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        GameError::Serialization(err.to_string())
    }
}

/// A command that was refused, with the name of the offending command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{command} rejected: {error}")]
pub struct Rejection {
    pub command: &'static str,
    pub error: GameError,
}

impl Rejection {
    pub fn new(command: &'static str, error: impl Into<GameError>) -> Self {
        Self {
            command,
            error: error.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}
