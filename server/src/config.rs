//! Runtime configuration for the Nim server

use shared::{Heaps, Strategy, MAX_HEAP_SIZE, SERVER_DEFAULT_PORT};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("heap {index} has size {size}; heap sizes must be between 1 and {max}")]
    HeapOutOfRange { index: usize, size: i16, max: i16 },

    #[error("number of simultaneous players must be positive")]
    NoPlayers,

    #[error("waiting list size must be positive")]
    NoWaitList,
}

/// Everything the server needs before it starts accepting players
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind the listener on
    pub host: String,
    pub port: u16,
    /// Starting board handed to every new game
    pub heaps: Heaps,
    /// Maximum number of games played at once
    pub player_capacity: usize,
    /// Maximum number of clients queued for a free game slot
    pub wait_capacity: usize,
    pub strategy: Strategy,
}

impl ServerConfig {
    pub fn new(heaps: Heaps, player_capacity: usize, wait_capacity: usize) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: SERVER_DEFAULT_PORT,
            heaps,
            player_capacity,
            wait_capacity,
            strategy: Strategy::default(),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some((index, &size)) = self
            .heaps
            .iter()
            .enumerate()
            .find(|&(_, &size)| !(1..=MAX_HEAP_SIZE).contains(&size))
        {
            return Err(ConfigError::HeapOutOfRange {
                index,
                size,
                max: MAX_HEAP_SIZE,
            });
        }
        if self.player_capacity == 0 {
            return Err(ConfigError::NoPlayers);
        }
        if self.wait_capacity == 0 {
            return Err(ConfigError::NoWaitList);
        }
        Ok(())
    }
}
