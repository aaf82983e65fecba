//! Append-only command log.
//!
//! The log holds the game setup plus every committed command tagged with the
//! version it produced. Replaying it on a fresh game reproduces any
//! historical state exactly. The JSON-lines form puts the setup on the first
//! line and one command per following line.

use crate::command::Command;
use crate::error::{GameError, GameResult};
use crate::game::{GameSetup, GameState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedCommand {
    /// Version of the game right after this command committed
    pub version: u64,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLog {
    setup: GameSetup,
    entries: Vec<LoggedCommand>,
}

impl CommandLog {
    pub fn new(setup: GameSetup) -> Self {
        Self {
            setup,
            entries: Vec::new(),
        }
    }

    pub fn setup(&self) -> &GameSetup {
        &self.setup
    }

    pub fn entries(&self) -> &[LoggedCommand] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Version reached after the last entry
    pub fn head_version(&self) -> u64 {
        self.entries.last().map_or(0, |e| e.version)
    }

    /// Record a committed command. Only the owner of the live game calls this,
    /// right after `GameState::apply` succeeded.
    pub fn append(&mut self, version: u64, command: Command) {
        self.entries.push(LoggedCommand { version, command });
    }

    /// Rebuild the latest state
    pub fn replay(&self) -> GameResult<GameState> {
        self.replay_to(self.head_version())
    }

    /// Rebuild the state as it was at `version`
    pub fn replay_to(&self, version: u64) -> GameResult<GameState> {
        let mut game = GameState::new(&self.setup)?;
        for entry in self.entries.iter().take_while(|e| e.version <= version) {
            game.apply(&entry.command).map_err(|rejection| {
                GameError::Serialization(format!("entry {} no longer applies: {rejection}", entry.version))
            })?;
            if game.version() != entry.version {
                return Err(GameError::Serialization(format!(
                    "entry recorded version {} but replay reached {}",
                    entry.version,
                    game.version()
                )));
            }
        }
        if game.version() != version {
            return Err(GameError::Serialization(format!(
                "version {version} is not in the log (head is {})",
                self.head_version()
            )));
        }
        Ok(game)
    }

    pub fn to_json_lines(&self) -> GameResult<String> {
        let mut out = serde_json::to_string(&self.setup)?;
        out.push('\n');
        for entry in &self.entries {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        Ok(out)
    }

    pub fn from_json_lines(input: &str) -> GameResult<Self> {
        let mut lines = input.lines().filter(|line| !line.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| GameError::Serialization("log is empty".to_string()))?;
        let mut log = Self::new(serde_json::from_str(header)?);
        for (idx, line) in lines.enumerate() {
            let entry: LoggedCommand = serde_json::from_str(line)
                .map_err(|e| GameError::Serialization(format!("line {}: {e}", idx + 2)))?;
            log.entries.push(entry);
        }
        Ok(log)
    }
}
