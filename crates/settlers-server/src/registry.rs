//! Game registry: one authoritative game per id, with long-poll fetch.
//!
//! Each live game sits behind its own mutex, held only while a command is
//! validated, applied, logged and its snapshot frozen. The frozen snapshot is
//! published on a `watch` channel; readers and parked fetches only ever touch
//! that channel, never the lock.

use dashmap::DashMap;
use settlers_core::{
    Command, CommandKind, CommandLog, Dice, ErrorKind, GameError, GameEvent, GameSetup,
    GameSnapshot, GameState, PlayerRef, Rejection, StandardDice,
};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info};
use uuid::Uuid;

pub type GameId = Uuid;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Game {0} not found")]
    UnknownGame(GameId),

    #[error("Game {game} is unavailable: {reason}")]
    Unavailable { game: GameId, reason: String },

    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("Invalid game setup: {0}")]
    InvalidSetup(GameError),

    #[error("Command log encoding failed: {0}")]
    Encoding(GameError),

    #[error("Game {0} lock poisoned")]
    Poisoned(GameId),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::UnknownGame(_) => ErrorKind::IdentityViolation,
            RegistryError::Rejected(rejection) => rejection.kind(),
            RegistryError::InvalidSetup(error) | RegistryError::Encoding(error) => error.kind(),
            RegistryError::Unavailable { .. } | RegistryError::Poisoned(_) => ErrorKind::SerializationFault,
        }
    }
}

/// One committed version together with the events that produced it
#[derive(Debug, Clone)]
pub struct Published {
    pub snapshot: Arc<GameSnapshot>,
    pub events: Vec<GameEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Snapshot(Arc<GameSnapshot>),
    TimedOut,
}

struct LiveGame {
    game: GameState,
    log: CommandLog,
    /// Set once a restore has swapped this slot out of the registry
    retired: bool,
}

struct LiveSlot {
    inner: Mutex<LiveGame>,
    published: watch::Sender<Arc<Published>>,
}

enum GameSlot {
    Live(LiveSlot),
    /// Replay failed; the game stays out of service until an operator resets it
    Unavailable { reason: String },
}

impl GameSlot {
    fn live(game: GameState, log: CommandLog) -> Self {
        let published = Published {
            snapshot: Arc::new(game.snapshot()),
            events: Vec::new(),
        };
        let (sender, _) = watch::channel(Arc::new(published));
        GameSlot::Live(LiveSlot {
            inner: Mutex::new(LiveGame {
                game,
                log,
                retired: false,
            }),
            published: sender,
        })
    }
}

/// Every game hosted by this process. Built once at start-up and shared by
/// `Arc`.
pub struct GameRegistry {
    games: DashMap<GameId, Arc<GameSlot>>,
    dice: Mutex<Box<dyn Dice>>,
}

impl GameRegistry {
    pub fn new(dice: Box<dyn Dice>) -> Self {
        Self {
            games: DashMap::new(),
            dice: Mutex::new(dice),
        }
    }

    /// Registry rolling fair dice, reproducibly if a seed is given
    pub fn with_seed(seed: Option<u64>) -> Self {
        let dice = match seed {
            Some(seed) => StandardDice::seeded(seed),
            None => StandardDice::from_entropy(),
        };
        Self::new(Box::new(dice))
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn create_game(&self, setup: GameSetup) -> Result<(GameId, Arc<GameSnapshot>), RegistryError> {
        let game = GameState::new(&setup).map_err(RegistryError::InvalidSetup)?;
        let snapshot = Arc::new(game.snapshot());
        let id = Uuid::new_v4();

        self.games
            .insert(id, Arc::new(GameSlot::live(game, CommandLog::new(setup))));
        info!("Created game {} with {} seats", id, snapshot.players.len());
        Ok((id, snapshot))
    }

    /// Validate and commit one command, returning the new snapshot
    pub fn submit(&self, game: GameId, command: Command) -> Result<Arc<GameSnapshot>, RegistryError> {
        loop {
            let slot = self.slot(game)?;
            if let Some(snapshot) = commit_to(game, &slot, &command)? {
                return Ok(snapshot);
            }
            debug!("Game {}: slot replaced during submit, retrying", game);
        }
    }

    /// Roll the registry dice for `player` and submit the result
    pub fn roll(&self, game: GameId, player: PlayerRef) -> Result<Arc<GameSnapshot>, RegistryError> {
        // Unknown games don't consume a roll
        self.slot(game)?;
        let number = self
            .dice
            .lock()
            .map_err(|_| RegistryError::Poisoned(game))?
            .roll();
        self.submit(game, Command::new(player, CommandKind::RollDice { number }))
    }

    /// Latest published snapshot
    pub fn snapshot(&self, game: GameId) -> Result<Arc<GameSnapshot>, RegistryError> {
        let receiver = self.subscribe(game)?;
        let snapshot = Arc::clone(&receiver.borrow().snapshot);
        Ok(snapshot)
    }

    /// Channel of every published version, for observers
    pub fn subscribe(&self, game: GameId) -> Result<watch::Receiver<Arc<Published>>, RegistryError> {
        let slot = self.slot(game)?;
        Ok(live_slot(game, &slot)?.published.subscribe())
    }

    /// Snapshot newer than `since`, waiting for the next commit if there is
    /// none yet. `None` answers with the current snapshot straight away.
    ///
    /// The wait holds no lock; dropping the future gives up the wait.
    pub async fn fetch(&self, game: GameId, since: Option<u64>) -> Result<Arc<GameSnapshot>, RegistryError> {
        loop {
            let mut receiver = self.subscribe(game)?;
            let Some(since) = since else {
                let snapshot = Arc::clone(&receiver.borrow().snapshot);
                return Ok(snapshot);
            };

            match receiver.wait_for(|published| published.snapshot.version > since).await {
                Ok(published) => return Ok(Arc::clone(&published.snapshot)),
                // The slot was replaced by a restore; wait on the new one
                Err(_) => continue,
            };
        }
    }

    pub async fn fetch_with_timeout(
        &self,
        game: GameId,
        since: Option<u64>,
        timeout: Duration,
    ) -> Result<FetchOutcome, RegistryError> {
        match tokio::time::timeout(timeout, self.fetch(game, since)).await {
            Ok(result) => result.map(FetchOutcome::Snapshot),
            Err(_) => Ok(FetchOutcome::TimedOut),
        }
    }

    /// Number of fetches currently parked on a game
    pub fn waiters(&self, game: GameId) -> Result<usize, RegistryError> {
        let slot = self.slot(game)?;
        Ok(live_slot(game, &slot)?.published.receiver_count())
    }

    pub fn log(&self, game: GameId) -> Result<CommandLog, RegistryError> {
        let slot = self.slot(game)?;
        let inner = live_slot(game, &slot)?
            .inner
            .lock()
            .map_err(|_| RegistryError::Poisoned(game))?;
        Ok(inner.log.clone())
    }

    /// Rebuild a game from its log under `game`, replacing any slot already
    /// there. A log that fails to replay leaves only this game unavailable.
    pub fn restore(&self, game: GameId, log: CommandLog) -> Result<Arc<GameSnapshot>, RegistryError> {
        match log.replay() {
            Ok(state) => {
                let snapshot = Arc::new(state.snapshot());
                self.replace_slot(game, GameSlot::live(state, log));
                info!("Restored game {} at version {}", game, snapshot.version);
                Ok(snapshot)
            }
            Err(fault) => {
                let reason = fault.to_string();
                error!("Game {} failed to replay: {}", game, reason);
                self.replace_slot(
                    game,
                    GameSlot::Unavailable {
                        reason: reason.clone(),
                    },
                );
                Err(RegistryError::Unavailable { game, reason })
            }
        }
    }

    /// Clear an unavailable game so its id can be restored again.
    /// Returns the reason it was taken out of service.
    pub fn reset_unavailable(&self, game: GameId) -> Option<String> {
        let (_, slot) = self
            .games
            .remove_if(&game, |_, slot| matches!(**slot, GameSlot::Unavailable { .. }))?;
        match &*slot {
            GameSlot::Unavailable { reason } => {
                info!("Game {} reset by operator", game);
                Some(reason.clone())
            }
            GameSlot::Live(_) => None,
        }
    }

    /// Install `slot` under `game`. A live game being replaced is retired
    /// under its own lock, so no commit can land on it after the swap.
    fn replace_slot(&self, game: GameId, slot: GameSlot) {
        let previous = self.games.get(&game).map(|entry| Arc::clone(entry.value()));
        let _retiring = match previous.as_deref() {
            Some(GameSlot::Live(live)) => {
                let mut inner = live.inner.lock().unwrap_or_else(PoisonError::into_inner);
                inner.retired = true;
                Some(inner)
            }
            _ => None,
        };
        self.games.insert(game, Arc::new(slot));
    }

    fn slot(&self, game: GameId) -> Result<Arc<GameSlot>, RegistryError> {
        self.games
            .get(&game)
            .map(|slot| Arc::clone(slot.value()))
            .ok_or(RegistryError::UnknownGame(game))
    }
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::with_seed(None)
    }
}

/// Commit on one slot. `None` means a restore retired the slot first.
fn commit_to(game: GameId, slot: &GameSlot, command: &Command) -> Result<Option<Arc<GameSnapshot>>, RegistryError> {
    let live = live_slot(game, slot)?;
    let mut inner = live.inner.lock().map_err(|_| RegistryError::Poisoned(game))?;
    if inner.retired {
        return Ok(None);
    }

    let events = inner.game.apply(command).map_err(|rejection| {
        debug!("Game {}: {}", game, rejection);
        rejection
    })?;
    let version = inner.game.version();
    inner.log.append(version, command.clone());
    let snapshot = Arc::new(inner.game.snapshot());

    // Published under the lock so waiters see versions in commit order
    live.published.send_replace(Arc::new(Published {
        snapshot: Arc::clone(&snapshot),
        events,
    }));
    drop(inner);

    debug!("Game {}: {} committed version {}", game, command.name(), version);
    Ok(Some(snapshot))
}

fn live_slot(game: GameId, slot: &GameSlot) -> Result<&LiveSlot, RegistryError> {
    match slot {
        GameSlot::Live(live) => Ok(live),
        GameSlot::Unavailable { reason } => Err(RegistryError::Unavailable {
            game,
            reason: reason.clone(),
        }),
    }
}
