//! # Nim Client Library
//!
//! Terminal client for the multiplexed Nim server. The player types moves as
//! `<heap letter> <count>` (for example `B 3`) and `Q` to quit.
//!
//! ## Session Flow
//!
//! After connecting, the server announces whether the client plays right
//! away (START), waits for a free slot (WAIT) or is turned away (REJECT).
//! Once playing, the client repeatedly fetches the board, sends the player's
//! move and prints the server's verdict, until the server reports a winner.
//!
//! ## Module Organization
//!
//! - `network`: framed connection that reassembles split frames
//! - `input`: parsing of typed commands
//! - `rendering`: board and result text
//! - `game`: the session state machine tying the above together

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;

pub use game::run;
pub use network::{ClientError, Connection};
