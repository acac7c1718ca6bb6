//! Protocol and game logic shared by the Nim server and its clients
//!
//! - [`protocol`]: the fixed 8-byte frame codec, opcodes and typed messages
//! - [`nim`]: the game engine and the server's move strategies

pub mod nim;
pub mod protocol;

pub use nim::{Game, Heaps, MoveError, Party, Strategy, BOARD_SIZE, MAX_HEAP_SIZE};
pub use protocol::{
    ClientRequest, Frame, FrameBuffer, FrameError, MoveOutcome, ServerMessage, FRAME_SIZE, NONE,
};

pub const SERVER_DEFAULT_HOSTNAME: &str = "localhost";
pub const SERVER_DEFAULT_PORT: u16 = 6444;
