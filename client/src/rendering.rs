//! Terminal output for the Nim client

use crate::input::HEAP_NAMES;
use shared::{Heaps, MoveOutcome, Party};
use std::fmt::Write;

pub const START_MESSAGE: &str = "Now you are playing against the server!";
pub const WAIT_MESSAGE: &str = "Waiting to play against the server.";
pub const REJECT_MESSAGE: &str = "You are rejected by the server.";
pub const TURN_PROMPT: &str = "Your turn: ";

/// One `Heap X: n` line per heap
pub fn render_board(heaps: &Heaps) -> String {
    let mut board = String::new();
    for (name, size) in HEAP_NAMES.iter().zip(heaps) {
        let _ = writeln!(board, "Heap {}: {}", name, size);
    }
    board
}

/// Final empty board followed by the result line
pub fn render_game_over(winner: Party) -> String {
    let mut text = render_board(&[0; 3]);
    text.push_str(match winner {
        Party::Server => "Server win!\n",
        Party::Client => "You win!\n",
    });
    text
}

pub fn render_move_outcome(outcome: MoveOutcome) -> &'static str {
    match outcome {
        MoveOutcome::Accepted => "Move accepted\n",
        MoveOutcome::Illegal => "Illegal move\n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_board() {
        assert_eq!(
            render_board(&[3, 0, 1000]),
            "Heap A: 3\nHeap B: 0\nHeap C: 1000\n"
        );
    }

    #[test]
    fn test_render_game_over() {
        assert_eq!(
            render_game_over(Party::Client),
            "Heap A: 0\nHeap B: 0\nHeap C: 0\nYou win!\n"
        );
        assert!(render_game_over(Party::Server).ends_with("Server win!\n"));
    }

    #[test]
    fn test_render_move_outcome() {
        assert_eq!(render_move_outcome(MoveOutcome::Accepted), "Move accepted\n");
        assert_eq!(render_move_outcome(MoveOutcome::Illegal), "Illegal move\n");
    }
}
