//! # Nim Server Library
//!
//! Serves many remote Nim players at once from a single thread. Each
//! accepted client either plays its own game against the server's
//! strategy, waits in line for a free game slot, or is turned away.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Reactor
//! The server owns every socket from one task. Each cycle polls readiness
//! across the listener and all connections, accepts at most one new client,
//! reads whatever is missing from each readable connection's current frame,
//! and writes as much pending output as each socket accepts. Nothing blocks
//! on a single connection, so a slow client never stalls the others.
//!
//! ### Admission Pools
//! - **Active**: up to `player_capacity` clients, each with its own game
//! - **Waiting**: up to `wait_capacity` clients, promoted oldest first when
//!   an active client leaves
//! - **Rejected**: everyone else; closed as soon as the REJECT notice drains
//!
//! ### Stream Framing
//! Every message is a fixed 8-byte frame. Bytes are accumulated per
//! connection until a full frame is available, so frames split across reads
//! are reassembled exactly, and unsent response bytes carry over to the next
//! cycle.
//!
//! ## Module Organization
//!
//! - `config`: server settings and their validation
//! - `game`: one client's game session against the server strategy
//! - `client_manager`: connection records, buffers and admission pools
//! - `network`: the reactor loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//! use shared::Strategy;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Board of three heaps, two simultaneous games, one waiting slot
//!     let mut config = ServerConfig::new([3, 4, 5], 2, 1);
//!     config.strategy = Strategy::Optimal;
//!
//!     let mut server = Server::new(config).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod game;
pub mod network;

pub use config::{ConfigError, ServerConfig};
pub use network::Server;
