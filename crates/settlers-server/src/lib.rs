//! Settlers synchronization server.
//!
//! Hosts any number of games in a [`GameRegistry`]. Commands for one game are
//! serialized by that game's lock; readers long-poll with `fetch` and are
//! woken by every commit. The WebSocket adapter in [`server`] maps JSON
//! messages onto registry calls.

pub mod config;
pub mod protocol;
pub mod registry;
pub mod server;

pub use config::{ConfigError, ServerConfig};
pub use registry::{FetchOutcome, GameId, GameRegistry, Published, RegistryError};
pub use server::{run_server, serve, ServerState};
