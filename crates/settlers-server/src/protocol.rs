//! WebSocket protocol messages for the settlers server.

use serde::{Deserialize, Serialize};
use settlers_core::{ErrorKind, GameSnapshot, PlayerRef, SeatConfig};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Create a new game; a missing seed is drawn at random
    CreateGame {
        #[serde(default)]
        seed: Option<u64>,
        seats: Vec<SeatConfig>,
    },

    /// Submit a command in wire form
    Submit {
        game_id: Uuid,
        player: PlayerRef,
        command: String,
        #[serde(default)]
        args: Vec<serde_json::Value>,
    },

    /// Roll the server dice for the acting player
    Roll { game_id: Uuid, player: PlayerRef },

    /// Long-poll for a version newer than `since_version` (-1 for "now")
    Fetch { game_id: Uuid, since_version: i64 },

    /// Request the command log in JSON-lines form
    Log { game_id: Uuid },

    /// Rebuild a game from a JSON-lines command log
    Restore { game_id: Uuid, log: String },

    /// Ping for keepalive
    Ping,
}

impl ClientMessage {
    /// `since_version` as the registry takes it
    pub fn since(since_version: i64) -> Option<u64> {
        u64::try_from(since_version).ok()
    }
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with the connection's id
    Welcome { connection_id: Uuid },

    /// Game created at version 0
    GameCreated { game_id: Uuid, snapshot: GameSnapshot },

    /// A submitted command committed
    Committed { game_id: Uuid, snapshot: GameSnapshot },

    /// A submitted command was refused; the game is unchanged
    Rejected {
        game_id: Uuid,
        command: String,
        kind: ErrorKind,
        message: String,
    },

    /// Answer to a fetch
    Snapshot { game_id: Uuid, snapshot: GameSnapshot },

    /// Nothing newer arrived before the fetch deadline
    FetchTimedOut { game_id: Uuid, since_version: i64 },

    /// Command log in JSON-lines form
    CommandLog { game_id: Uuid, log: String },

    /// Game rebuilt from a log
    Restored { game_id: Uuid, version: u64 },

    /// Error not tied to a command
    Error {
        game_id: Option<Uuid>,
        kind: Option<ErrorKind>,
        message: String,
    },

    /// Pong response
    Pong,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_submit_without_args() {
        let game_id = Uuid::new_v4();
        let player = Uuid::new_v4();
        let text = json!({
            "type": "Submit",
            "payload": { "game_id": game_id, "player": player, "command": "finishTurn" }
        })
        .to_string();

        match serde_json::from_str::<ClientMessage>(&text).unwrap() {
            ClientMessage::Submit { command, args, .. } => {
                assert_eq!(command, "finishTurn");
                assert!(args.is_empty());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_negative_since_means_now() {
        assert_eq!(ClientMessage::since(-1), None);
        assert_eq!(ClientMessage::since(0), Some(0));
        assert_eq!(ClientMessage::since(12), Some(12));
    }

    #[test]
    fn test_server_message_tagging() {
        let value = serde_json::to_value(ServerMessage::Rejected {
            game_id: Uuid::nil(),
            command: "buildCity".to_string(),
            kind: ErrorKind::GeometryViolation,
            message: "no settlement".to_string(),
        })
        .unwrap();
        assert_eq!(value["type"], "Rejected");
        assert_eq!(value["payload"]["kind"], "GeometryViolation");

        let pong = serde_json::to_value(ServerMessage::Pong).unwrap();
        assert_eq!(pong, json!({ "type": "Pong" }));
    }
}
