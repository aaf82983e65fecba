//! Commands players submit and the events that result from them.
//!
//! A command is a canonical name, an ordered argument list and the acting
//! player's identity. On the wire it looks like
//!
//! ```json
//! {"player": "…uuid…", "command": "buildRoad", "args": [{"hex": {"q": 0, "r": 0}, "direction": "East"}, false]}
//! ```
//!
//! `CommandKind` is the closed set of commands; decoding an unknown name or
//! malformed arguments is a serialization fault.

use crate::achievements::HolderChange;
use crate::board::Seat;
use crate::error::{GameError, GameResult};
use crate::hex::{EdgeCoord, HexCoord, VertexCoord};
use crate::inventory::{DevelopmentCard, Resource, ResourceHand};
use crate::player::PlayerRef;
use crate::turn::TurnPhase;
use serde::de::DeserializeOwned;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Every operation a player can submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    // ==================== Turn ====================
    /// Roll result drawn by the caller's dice, 2..=12
    RollDice { number: u8 },
    FinishTurn,

    // ==================== Building ====================
    /// `free` marks a setup placement
    BuildRoad { edge: EdgeCoord, free: bool },
    BuildSettlement { vertex: VertexCoord, free: bool },
    BuildCity { vertex: VertexCoord },
    BuyDevCard,

    // ==================== Development cards ====================
    PlaySoldier { location: HexCoord, victim: Option<Seat> },
    PlayRoadBuilding { first: EdgeCoord, second: EdgeCoord },
    PlayYearOfPlenty { first: Resource, second: Resource },
    PlayMonopoly { resource: Resource },
    PlayMonument,

    // ==================== Trading ====================
    OfferTrade {
        receiver: Seat,
        offering: ResourceHand,
        requesting: ResourceHand,
    },
    RespondToTrade { accept: bool },
    MaritimeTrade {
        ratio: u32,
        input: Resource,
        output: Resource,
    },

    // ==================== Robber ====================
    DiscardCards { cards: ResourceHand },
    RobPlayer { location: HexCoord, victim: Option<Seat> },

    SendChat { message: String },
}

impl CommandKind {
    /// Canonical wire name
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::RollDice { .. } => "rollDice",
            CommandKind::FinishTurn => "finishTurn",
            CommandKind::BuildRoad { .. } => "buildRoad",
            CommandKind::BuildSettlement { .. } => "buildSettlement",
            CommandKind::BuildCity { .. } => "buildCity",
            CommandKind::BuyDevCard => "buyDevCard",
            CommandKind::PlaySoldier { .. } => "playSoldier",
            CommandKind::PlayRoadBuilding { .. } => "playRoadBuilding",
            CommandKind::PlayYearOfPlenty { .. } => "playYearOfPlenty",
            CommandKind::PlayMonopoly { .. } => "playMonopoly",
            CommandKind::PlayMonument => "playMonument",
            CommandKind::OfferTrade { .. } => "offerTrade",
            CommandKind::RespondToTrade { .. } => "respondToTrade",
            CommandKind::MaritimeTrade { .. } => "maritimeTrade",
            CommandKind::DiscardCards { .. } => "discardCards",
            CommandKind::RobPlayer { .. } => "robPlayer",
            CommandKind::SendChat { .. } => "sendChat",
        }
    }

    /// Decode a command from its name and positional arguments
    pub fn from_wire(name: &str, args: &[Value]) -> GameResult<Self> {
        let kind = match name {
            "rollDice" => {
                expect_arity(name, args, 1)?;
                let number: u8 = arg(args, 0)?;
                if !(2..=12).contains(&number) {
                    return Err(GameError::Serialization(format!(
                        "dice total {number} outside 2..=12"
                    )));
                }
                CommandKind::RollDice { number }
            }
            "finishTurn" => {
                expect_arity(name, args, 0)?;
                CommandKind::FinishTurn
            }
            "buildRoad" => {
                expect_arity(name, args, 2)?;
                CommandKind::BuildRoad {
                    edge: arg::<EdgeCoord>(args, 0)?.canonical(),
                    free: opt_arg(args, 1)?.unwrap_or(false),
                }
            }
            "buildSettlement" => {
                expect_arity(name, args, 2)?;
                CommandKind::BuildSettlement {
                    vertex: arg(args, 0)?,
                    free: opt_arg(args, 1)?.unwrap_or(false),
                }
            }
            "buildCity" => {
                expect_arity(name, args, 1)?;
                CommandKind::BuildCity { vertex: arg(args, 0)? }
            }
            "buyDevCard" => {
                expect_arity(name, args, 0)?;
                CommandKind::BuyDevCard
            }
            "playSoldier" => {
                expect_arity(name, args, 2)?;
                CommandKind::PlaySoldier {
                    location: arg(args, 0)?,
                    victim: opt_arg(args, 1)?,
                }
            }
            "playRoadBuilding" => {
                expect_arity(name, args, 2)?;
                CommandKind::PlayRoadBuilding {
                    first: arg::<EdgeCoord>(args, 0)?.canonical(),
                    second: arg::<EdgeCoord>(args, 1)?.canonical(),
                }
            }
            "playYearOfPlenty" => {
                expect_arity(name, args, 2)?;
                CommandKind::PlayYearOfPlenty {
                    first: arg(args, 0)?,
                    second: arg(args, 1)?,
                }
            }
            "playMonopoly" => {
                expect_arity(name, args, 1)?;
                CommandKind::PlayMonopoly {
                    resource: arg(args, 0)?,
                }
            }
            "playMonument" => {
                expect_arity(name, args, 0)?;
                CommandKind::PlayMonument
            }
            "offerTrade" => {
                expect_arity(name, args, 3)?;
                CommandKind::OfferTrade {
                    receiver: arg(args, 0)?,
                    offering: arg(args, 1)?,
                    requesting: arg(args, 2)?,
                }
            }
            "respondToTrade" => {
                expect_arity(name, args, 1)?;
                CommandKind::RespondToTrade { accept: arg(args, 0)? }
            }
            "maritimeTrade" => {
                expect_arity(name, args, 3)?;
                CommandKind::MaritimeTrade {
                    ratio: arg(args, 0)?,
                    input: arg(args, 1)?,
                    output: arg(args, 2)?,
                }
            }
            "discardCards" => {
                expect_arity(name, args, 1)?;
                CommandKind::DiscardCards { cards: arg(args, 0)? }
            }
            "robPlayer" => {
                expect_arity(name, args, 2)?;
                CommandKind::RobPlayer {
                    location: arg(args, 0)?,
                    victim: opt_arg(args, 1)?,
                }
            }
            "sendChat" => {
                expect_arity(name, args, 1)?;
                CommandKind::SendChat { message: arg(args, 0)? }
            }
            other => {
                return Err(GameError::Serialization(format!("unknown command {other:?}")));
            }
        };
        Ok(kind)
    }

    /// Positional arguments in wire form
    pub fn to_wire(&self) -> GameResult<Vec<Value>> {
        match serde_json::to_value(WireArgs(self))? {
            Value::Array(args) => Ok(args),
            other => Err(GameError::Serialization(format!(
                "arguments encoded as {other}, expected an array"
            ))),
        }
    }
}

fn expect_arity(name: &str, args: &[Value], max: usize) -> GameResult<()> {
    if args.len() > max {
        return Err(GameError::Serialization(format!(
            "{name} takes at most {max} arguments, got {}",
            args.len()
        )));
    }
    Ok(())
}

/// Required positional argument
fn arg<T: DeserializeOwned>(args: &[Value], idx: usize) -> GameResult<T> {
    let value = args
        .get(idx)
        .ok_or_else(|| GameError::Serialization(format!("missing argument {idx}")))?;
    serde_json::from_value(value.clone())
        .map_err(|e| GameError::Serialization(format!("argument {idx}: {e}")))
}

/// Optional positional argument; absent and `null` both decode to `None`
fn opt_arg<T: DeserializeOwned>(args: &[Value], idx: usize) -> GameResult<Option<T>> {
    match args.get(idx) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => arg(args, idx).map(Some),
    }
}

/// Serializes a command's arguments as a positional array
struct WireArgs<'a>(&'a CommandKind);

impl Serialize for WireArgs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(None)?;
        match self.0 {
            CommandKind::RollDice { number } => seq.serialize_element(number)?,
            CommandKind::FinishTurn | CommandKind::BuyDevCard | CommandKind::PlayMonument => {}
            CommandKind::BuildRoad { edge, free } => {
                seq.serialize_element(edge)?;
                seq.serialize_element(free)?;
            }
            CommandKind::BuildSettlement { vertex, free } => {
                seq.serialize_element(vertex)?;
                seq.serialize_element(free)?;
            }
            CommandKind::BuildCity { vertex } => seq.serialize_element(vertex)?,
            CommandKind::PlaySoldier { location, victim } | CommandKind::RobPlayer { location, victim } => {
                seq.serialize_element(location)?;
                seq.serialize_element(victim)?;
            }
            CommandKind::PlayRoadBuilding { first, second } => {
                seq.serialize_element(first)?;
                seq.serialize_element(second)?;
            }
            CommandKind::PlayYearOfPlenty { first, second } => {
                seq.serialize_element(first)?;
                seq.serialize_element(second)?;
            }
            CommandKind::PlayMonopoly { resource } => seq.serialize_element(resource)?,
            CommandKind::OfferTrade {
                receiver,
                offering,
                requesting,
            } => {
                seq.serialize_element(receiver)?;
                seq.serialize_element(offering)?;
                seq.serialize_element(requesting)?;
            }
            CommandKind::RespondToTrade { accept } => seq.serialize_element(accept)?,
            CommandKind::MaritimeTrade { ratio, input, output } => {
                seq.serialize_element(ratio)?;
                seq.serialize_element(input)?;
                seq.serialize_element(output)?;
            }
            CommandKind::DiscardCards { cards } => seq.serialize_element(cards)?,
            CommandKind::SendChat { message } => seq.serialize_element(message)?,
        }
        seq.end()
    }
}

/// A command bound to the player submitting it. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "WireCommand")]
pub struct Command {
    pub player: PlayerRef,
    pub kind: CommandKind,
}

impl Command {
    pub fn new(player: PlayerRef, kind: CommandKind) -> Self {
        Self { player, kind }
    }

    pub fn from_wire(player: PlayerRef, name: &str, args: &[Value]) -> GameResult<Self> {
        Ok(Self::new(player, CommandKind::from_wire(name, args)?))
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Decoding form of a command
#[derive(Debug, Clone, Deserialize)]
struct WireCommand {
    player: PlayerRef,
    command: String,
    #[serde(default)]
    args: Vec<Value>,
}

impl TryFrom<WireCommand> for Command {
    type Error = GameError;

    fn try_from(wire: WireCommand) -> Result<Self, Self::Error> {
        Command::from_wire(wire.player, &wire.command, &wire.args)
    }
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Encoded<'a> {
            player: &'a PlayerRef,
            command: &'static str,
            args: WireArgs<'a>,
        }

        Encoded {
            player: &self.player,
            command: self.kind.name(),
            args: WireArgs(&self.kind),
        }
        .serialize(serializer)
    }
}

/// A pending offer from the current player to one other seat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOffer {
    pub offerer: Seat,
    pub receiver: Seat,
    pub offering: ResourceHand,
    pub requesting: ResourceHand,
}

/// State changes produced by a committed command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum GameEvent {
    DiceRolled {
        seat: Seat,
        number: u8,
    },

    /// Production after a roll, one entry per receiving seat
    ResourcesProduced {
        distributions: Vec<(Seat, ResourceHand)>,
    },

    /// The bank could not cover everyone's share of this resource
    ProductionWithheld {
        resource: Resource,
    },

    StartingResources {
        seat: Seat,
        resources: ResourceHand,
    },

    SettlementBuilt {
        seat: Seat,
        location: VertexCoord,
    },

    CityBuilt {
        seat: Seat,
        location: VertexCoord,
    },

    RoadBuilt {
        seat: Seat,
        location: EdgeCoord,
    },

    /// The card itself stays private to the buyer
    DevelopmentCardBought {
        seat: Seat,
    },

    DevelopmentCardPlayed {
        seat: Seat,
        card: DevelopmentCard,
    },

    YearOfPlentyGranted {
        seat: Seat,
        resources: ResourceHand,
    },

    MonopolyCollected {
        seat: Seat,
        resource: Resource,
        total: u32,
    },

    RobberMoved {
        seat: Seat,
        from: HexCoord,
        to: HexCoord,
    },

    ResourceStolen {
        thief: Seat,
        victim: Seat,
        resource: Resource,
    },

    CardsDiscarded {
        seat: Seat,
        cards: ResourceHand,
    },

    TradeOffered {
        offer: TradeOffer,
    },

    TradeAccepted {
        offer: TradeOffer,
    },

    TradeDeclined {
        offer: TradeOffer,
    },

    /// The offer lapsed when the turn ended
    TradeWithdrawn {
        offer: TradeOffer,
    },

    MaritimeTraded {
        seat: Seat,
        ratio: u32,
        input: Resource,
        output: Resource,
    },

    AchievementChanged(HolderChange),

    PhaseChanged {
        current: Seat,
        phase: TurnPhase,
    },

    TurnFinished {
        seat: Seat,
        next: Seat,
    },

    ChatSent {
        seat: Seat,
        message: String,
    },

    GameWon {
        seat: Seat,
        victory_points: u32,
    },
}
