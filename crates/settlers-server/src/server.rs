//! WebSocket server and connection handling.

use crate::config::ServerConfig;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::registry::{FetchOutcome, GameId, GameRegistry, RegistryError};
use futures_util::{SinkExt, StreamExt};
use settlers_core::{Command, CommandKind, CommandLog, GameSetup, GameSnapshot, Rejection, TurnViolation};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    pub registry: Arc<GameRegistry>,
    /// Deadline for a single parked fetch
    pub fetch_timeout: Duration,
}

impl ServerState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            registry: Arc::new(GameRegistry::with_seed(config.dice_seed)),
            fetch_timeout: config.fetch_timeout,
        }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(&ServerConfig::default())
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Settlers server listening on {}", addr);
    serve(listener, state).await
}

/// Accept connections on an already bound listener.
pub async fn serve(listener: TcpListener, state: Arc<ServerState>) -> anyhow::Result<()> {
    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Per-connection context handed to message handlers
struct Connection {
    id: Uuid,
    state: Arc<ServerState>,
    tx: mpsc::UnboundedSender<ServerMessage>,
    /// Fetches still parked for this client
    fetches: Vec<JoinHandle<()>>,
}

impl Connection {
    fn send(&self, msg: ServerMessage) {
        let _ = self.tx.send(msg);
    }

    fn send_error(&self, game_id: Option<GameId>, err: RegistryError) {
        self.send(ServerMessage::Error {
            game_id,
            kind: Some(err.kind()),
            message: err.to_string(),
        });
    }

    /// Abort every parked fetch; the registry drops their waiters
    fn cancel_fetches(&mut self) {
        for fetch in self.fetches.drain(..) {
            fetch.abort();
        }
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let connection_id = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let welcome = ServerMessage::Welcome { connection_id };
    ws_sender
        .send(Message::Text(serde_json::to_string(&welcome)?))
        .await?;

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("Failed to encode message: {}", e),
            }
        }
    });

    let mut connection = Connection {
        id: connection_id,
        state,
        tx,
        fetches: Vec::new(),
    };

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(&mut connection, client_msg),
                Err(e) => {
                    warn!("Invalid message from {}: {}", connection_id, e);
                    connection.send(ServerMessage::Error {
                        game_id: None,
                        kind: None,
                        message: format!("Invalid message: {e}"),
                    });
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", connection_id);
                break;
            }
            Ok(Message::Ping(_)) => connection.send(ServerMessage::Pong),
            Err(e) => {
                error!("WebSocket error from {}: {}", connection_id, e);
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect
    connection.cancel_fetches();
    drop(connection);
    send_task.abort();

    info!("Connection closed for {}", connection_id);
    Ok(())
}

/// Handle a client message.
fn handle_message(conn: &mut Connection, msg: ClientMessage) {
    let registry = Arc::clone(&conn.state.registry);

    match msg {
        ClientMessage::CreateGame { seed, seats } => {
            let setup = GameSetup {
                seed: seed.unwrap_or_else(rand::random),
                seats,
            };
            match registry.create_game(setup) {
                Ok((game_id, snapshot)) => conn.send(ServerMessage::GameCreated {
                    game_id,
                    snapshot: GameSnapshot::clone(&snapshot),
                }),
                Err(e) => conn.send_error(None, e),
            }
        }

        ClientMessage::Submit {
            game_id,
            player,
            command,
            args,
        } => match Command::from_wire(player, &command, &args) {
            // Clients may not choose their own dice total
            Ok(decoded) if matches!(decoded.kind, CommandKind::RollDice { .. }) => {
                debug!("Game {}: {} submitted its own dice", game_id, player);
                let rejection = Rejection::new(decoded.kind.name(), TurnViolation::DiceRolledByServer);
                commit(conn, game_id, Err(rejection.into()));
            }
            Ok(decoded) => commit(conn, game_id, registry.submit(game_id, decoded)),
            Err(e) => {
                debug!("Game {}: undecodable {} from {}", game_id, command, player);
                conn.send(ServerMessage::Rejected {
                    game_id,
                    kind: e.kind(),
                    message: e.to_string(),
                    command,
                });
            }
        },

        ClientMessage::Roll { game_id, player } => commit(conn, game_id, registry.roll(game_id, player)),

        ClientMessage::Fetch {
            game_id,
            since_version,
        } => {
            let since = ClientMessage::since(since_version);
            let timeout = conn.state.fetch_timeout;
            let tx = conn.tx.clone();
            conn.fetches.retain(|fetch| !fetch.is_finished());
            conn.fetches.push(tokio::spawn(async move {
                let reply = match registry.fetch_with_timeout(game_id, since, timeout).await {
                    Ok(FetchOutcome::Snapshot(snapshot)) => ServerMessage::Snapshot {
                        game_id,
                        snapshot: GameSnapshot::clone(&snapshot),
                    },
                    Ok(FetchOutcome::TimedOut) => ServerMessage::FetchTimedOut {
                        game_id,
                        since_version,
                    },
                    Err(e) => ServerMessage::Error {
                        game_id: Some(game_id),
                        kind: Some(e.kind()),
                        message: e.to_string(),
                    },
                };
                let _ = tx.send(reply);
            }));
        }

        ClientMessage::Log { game_id } => {
            let text = registry
                .log(game_id)
                .and_then(|log| log.to_json_lines().map_err(RegistryError::Encoding));
            match text {
                Ok(log) => conn.send(ServerMessage::CommandLog { game_id, log }),
                Err(e) => conn.send_error(Some(game_id), e),
            }
        }

        ClientMessage::Restore { game_id, log } => {
            let restored = CommandLog::from_json_lines(&log)
                .map_err(RegistryError::Encoding)
                .and_then(|log| registry.restore(game_id, log));
            match restored {
                Ok(snapshot) => conn.send(ServerMessage::Restored {
                    game_id,
                    version: snapshot.version,
                }),
                Err(e) => conn.send_error(Some(game_id), e),
            }
        }

        ClientMessage::Ping => conn.send(ServerMessage::Pong),
    }
}

/// Report the result of a submit or roll back to the caller
fn commit(conn: &Connection, game_id: GameId, result: Result<Arc<GameSnapshot>, RegistryError>) {
    match result {
        Ok(snapshot) => conn.send(ServerMessage::Committed {
            game_id,
            snapshot: GameSnapshot::clone(&snapshot),
        }),
        Err(RegistryError::Rejected(rejection)) => conn.send(ServerMessage::Rejected {
            game_id,
            command: rejection.command.to_string(),
            kind: rejection.kind(),
            message: rejection.error.to_string(),
        }),
        Err(e) => {
            debug!("Connection {}: {} failed: {}", conn.id, game_id, e);
            conn.send_error(Some(game_id), e);
        }
    }
}
