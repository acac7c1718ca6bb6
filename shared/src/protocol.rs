//! Fixed-size binary wire protocol shared by the server and its clients
//!
//! Every message is one 8-byte frame: a 16-bit signed big-endian opcode
//! followed by three 16-bit signed big-endian argument slots. Slots a
//! message does not use carry [`NONE`]. Frames travel over a stream socket,
//! so a reader accumulates bytes in a [`FrameBuffer`] until a whole frame
//! is available.

use crate::nim::{Heaps, Party};
use bincode::Options;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size in bytes of every frame on the wire
pub const FRAME_SIZE: usize = 8;

/// Number of argument slots carried by a frame
pub const FRAME_ARGS: usize = 3;

/// Filler for unused argument slots
pub const NONE: i16 = -1;

// Client -> server
pub const OP_MOVE: i16 = 1;
pub const OP_GAME_STATE: i16 = 2;

// Server -> client
pub const OP_GAME_DONE: i16 = 3;
pub const OP_GAME_ACTIVE: i16 = 4;
pub const OP_MOVE_RESPONSE: i16 = 5;
pub const OP_START: i16 = 6;
pub const OP_WAIT: i16 = 7;
pub const OP_REJECT: i16 = 8;

pub const ARG_MOVE_ACCEPTED: i16 = 1;
pub const ARG_MOVE_ILLEGAL: i16 = 2;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame must be exactly {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("frame codec failure: {0}")]
    Codec(#[from] bincode::Error),

    #[error("unknown opcode {0}")]
    UnknownOpcode(i16),

    #[error("invalid argument {value} for opcode {opcode}")]
    InvalidArgument { opcode: i16, value: i16 },
}

/// Big-endian, fixed-width integers: the `>4h` layout
fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_big_endian()
}

/// One decoded protocol frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub opcode: i16,
    pub args: [i16; FRAME_ARGS],
}

impl Frame {
    /// Builds a frame, padding missing arguments with [`NONE`].
    ///
    /// Passing more than three arguments is a programming error and panics.
    pub fn new(opcode: i16, args: &[i16]) -> Self {
        assert!(
            args.len() <= FRAME_ARGS,
            "a frame carries at most {} arguments, got {}",
            FRAME_ARGS,
            args.len()
        );

        let mut padded = [NONE; FRAME_ARGS];
        padded[..args.len()].copy_from_slice(args);

        Self {
            opcode,
            args: padded,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        Ok(wire_options().serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() != FRAME_SIZE {
            return Err(FrameError::Length {
                expected: FRAME_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(wire_options().deserialize(bytes)?)
    }
}

/// Encodes `opcode` with up to three arguments into wire bytes
pub fn encode(opcode: i16, args: &[i16]) -> Result<Vec<u8>, FrameError> {
    Frame::new(opcode, args).encode()
}

/// Decodes exactly one frame into `(opcode, arg0, arg1, arg2)`
pub fn decode(bytes: &[u8]) -> Result<(i16, i16, i16, i16), FrameError> {
    let frame = Frame::decode(bytes)?;
    let [a, b, c] = frame.args;
    Ok((frame.opcode, a, b, c))
}

/// Result carried by a MOVE_RESPONSE frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Accepted,
    Illegal,
}

impl MoveOutcome {
    pub fn to_wire(self) -> i16 {
        match self {
            MoveOutcome::Accepted => ARG_MOVE_ACCEPTED,
            MoveOutcome::Illegal => ARG_MOVE_ILLEGAL,
        }
    }

    pub fn from_wire(value: i16) -> Option<Self> {
        match value {
            ARG_MOVE_ACCEPTED => Some(MoveOutcome::Accepted),
            ARG_MOVE_ILLEGAL => Some(MoveOutcome::Illegal),
            _ => None,
        }
    }
}

/// Requests a client may send to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRequest {
    Move { heap: i16, count: i16 },
    GameState,
}

impl ClientRequest {
    pub fn to_frame(&self) -> Frame {
        match *self {
            ClientRequest::Move { heap, count } => Frame::new(OP_MOVE, &[heap, count]),
            ClientRequest::GameState => Frame::new(OP_GAME_STATE, &[]),
        }
    }

    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match frame.opcode {
            OP_MOVE => Ok(ClientRequest::Move {
                heap: frame.args[0],
                count: frame.args[1],
            }),
            OP_GAME_STATE => Ok(ClientRequest::GameState),
            other => Err(FrameError::UnknownOpcode(other)),
        }
    }
}

/// Messages the server sends to a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMessage {
    GameDone { winner: Party },
    GameActive { heaps: Heaps },
    MoveResponse(MoveOutcome),
    Start,
    Wait,
    Reject,
}

impl ServerMessage {
    pub fn to_frame(&self) -> Frame {
        match *self {
            ServerMessage::GameDone { winner } => Frame::new(OP_GAME_DONE, &[winner.to_wire()]),
            ServerMessage::GameActive { heaps } => Frame::new(OP_GAME_ACTIVE, &heaps),
            ServerMessage::MoveResponse(outcome) => {
                Frame::new(OP_MOVE_RESPONSE, &[outcome.to_wire()])
            }
            ServerMessage::Start => Frame::new(OP_START, &[]),
            ServerMessage::Wait => Frame::new(OP_WAIT, &[]),
            ServerMessage::Reject => Frame::new(OP_REJECT, &[]),
        }
    }

    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        let invalid = |value| FrameError::InvalidArgument {
            opcode: frame.opcode,
            value,
        };

        match frame.opcode {
            OP_GAME_DONE => Party::from_wire(frame.args[0])
                .map(|winner| ServerMessage::GameDone { winner })
                .ok_or_else(|| invalid(frame.args[0])),
            OP_GAME_ACTIVE => Ok(ServerMessage::GameActive { heaps: frame.args }),
            OP_MOVE_RESPONSE => MoveOutcome::from_wire(frame.args[0])
                .map(ServerMessage::MoveResponse)
                .ok_or_else(|| invalid(frame.args[0])),
            OP_START => Ok(ServerMessage::Start),
            OP_WAIT => Ok(ServerMessage::Wait),
            OP_REJECT => Ok(ServerMessage::Reject),
            other => Err(FrameError::UnknownOpcode(other)),
        }
    }
}

/// Accumulates stream bytes until one complete frame is available.
///
/// Holds at most [`FRAME_SIZE`] bytes, so a reader only ever asks the
/// socket for what is still missing from the current frame.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    bytes: [u8; FRAME_SIZE],
    filled: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes still missing from the current frame
    pub fn remaining(&self) -> usize {
        FRAME_SIZE - self.filled
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn is_complete(&self) -> bool {
        self.filled == FRAME_SIZE
    }

    /// Space to read the missing bytes into
    pub fn unfilled_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[self.filled..]
    }

    /// Marks `n` bytes of [`Self::unfilled_mut`] as received
    pub fn advance(&mut self, n: usize) {
        self.filled = (self.filled + n).min(FRAME_SIZE);
    }

    /// Copies as much of `data` as fits, returning the number of bytes taken
    pub fn extend_from_slice(&mut self, data: &[u8]) -> usize {
        let taken = data.len().min(self.remaining());
        self.bytes[self.filled..self.filled + taken].copy_from_slice(&data[..taken]);
        self.filled += taken;
        taken
    }

    /// Decodes and clears the buffer once a full frame has accumulated
    pub fn take_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        if !self.is_complete() {
            return Ok(None);
        }
        self.filled = 0;
        Frame::decode(&self.bytes).map(Some)
    }
}
