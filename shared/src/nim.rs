//! Nim game engine and the server's move-selection strategies
//!
//! A [`Game`] owns one board of [`BOARD_SIZE`] heaps and records which
//! party moved last. Moves only go through [`Game::apply_move`]; once every
//! heap is empty the game is done and the board never changes again.

use thiserror::Error;

/// Number of heaps on every board
pub const BOARD_SIZE: usize = 3;

/// Largest heap size accepted for a starting board
pub const MAX_HEAP_SIZE: i16 = 1000;

/// Heap sizes in board order
pub type Heaps = [i16; BOARD_SIZE];

/// The two sides of a game, with their wire values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Server,
    Client,
}

impl Party {
    pub fn other(self) -> Self {
        match self {
            Party::Server => Party::Client,
            Party::Client => Party::Server,
        }
    }

    pub fn to_wire(self) -> i16 {
        match self {
            Party::Server => 1,
            Party::Client => 2,
        }
    }

    pub fn from_wire(value: i16) -> Option<Self> {
        match value {
            1 => Some(Party::Server),
            2 => Some(Party::Client),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    #[error("cannot remove {count} from heap {heap}")]
    Illegal { heap: i16, count: i16 },

    #[error("game is already over")]
    GameOver,
}

/// State of one game between the server and a single client
#[derive(Debug, Clone)]
pub struct Game {
    heaps: Heaps,
    done: bool,
    turn: Party,
}

impl Game {
    pub fn new(heaps: Heaps) -> Self {
        Self {
            heaps,
            done: heaps.iter().all(|&heap| heap == 0),
            turn: Party::Client,
        }
    }

    pub fn heaps(&self) -> Heaps {
        self.heaps
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Party recorded by the most recent [`Self::apply_move`] call
    pub fn turn(&self) -> Party {
        self.turn
    }

    pub fn next_turn(&self) -> Party {
        self.turn.other()
    }

    pub fn validate_move(&self, heap: i16, count: i16) -> bool {
        let Ok(index) = usize::try_from(heap) else {
            return false;
        };
        match self.heaps.get(index) {
            Some(&size) => (0..=size).contains(&count),
            None => false,
        }
    }

    /// Applies a move for the party whose turn it is.
    ///
    /// The turn flips before validation, so an illegal move still counts as
    /// that party's turn.
    pub fn apply_move(&mut self, heap: i16, count: i16) -> Result<(), MoveError> {
        if self.done {
            return Err(MoveError::GameOver);
        }

        self.turn = self.next_turn();
        if !self.validate_move(heap, count) {
            return Err(MoveError::Illegal { heap, count });
        }

        self.heaps[heap as usize] -= count;
        self.done = self.heaps.iter().all(|&heap| heap == 0);
        Ok(())
    }

    /// The party that emptied the board, once the game is done
    pub fn winner(&self) -> Option<Party> {
        self.done.then(|| self.next_turn())
    }
}

/// How the server picks its reply move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Take one object from the largest heap
    #[default]
    Greedy,
    /// Leave the opponent a zero nim-sum whenever possible
    Optimal,
}

impl Strategy {
    /// Picks `(heap, count)` for a board that is not yet empty
    pub fn select(&self, heaps: &Heaps) -> (i16, i16) {
        match self {
            Strategy::Greedy => greedy_move(heaps),
            Strategy::Optimal => optimal_move(heaps),
        }
    }
}

pub fn nim_sum(heaps: &Heaps) -> i16 {
    heaps.iter().fold(0, |acc, &heap| acc ^ heap)
}

fn greedy_move(heaps: &Heaps) -> (i16, i16) {
    let mut largest = 0;
    for (index, &heap) in heaps.iter().enumerate() {
        if heap > heaps[largest] {
            largest = index;
        }
    }
    (largest as i16, 1)
}

fn optimal_move(heaps: &Heaps) -> (i16, i16) {
    let sum = nim_sum(heaps);
    if sum == 0 {
        return greedy_move(heaps);
    }

    heaps
        .iter()
        .enumerate()
        .find(|&(_, &heap)| heap ^ sum < heap)
        .map(|(index, &heap)| (index as i16, heap - (heap ^ sum)))
        .unwrap_or_else(|| greedy_move(heaps))
}
