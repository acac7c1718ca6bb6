use log::debug;
use shared::{ClientRequest, Game, Heaps, MoveOutcome, ServerMessage, Strategy};

/// Hosts one client's game against the server's strategy.
///
/// Every request produces exactly one response message. The server's own
/// reply move is applied silently and only shows up in later state requests.
#[derive(Debug, Clone)]
pub struct GameHost {
    game: Game,
    strategy: Strategy,
}

impl GameHost {
    pub fn new(heaps: Heaps, strategy: Strategy) -> Self {
        Self {
            game: Game::new(heaps),
            strategy,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn execute(&mut self, request: ClientRequest) -> ServerMessage {
        match request {
            ClientRequest::Move { heap, count } => self.execute_move_request(heap, count),
            ClientRequest::GameState => self.execute_game_state_request(),
        }
    }

    fn execute_game_state_request(&self) -> ServerMessage {
        match self.game.winner() {
            Some(winner) => ServerMessage::GameDone { winner },
            None => ServerMessage::GameActive {
                heaps: self.game.heaps(),
            },
        }
    }

    fn execute_move_request(&mut self, heap: i16, count: i16) -> ServerMessage {
        let outcome = match self.game.apply_move(heap, count) {
            Ok(()) => MoveOutcome::Accepted,
            Err(e) => {
                debug!("Rejected client move: {}", e);
                MoveOutcome::Illegal
            }
        };

        if outcome == MoveOutcome::Accepted && !self.game.is_done() {
            self.execute_server_move();
        }

        ServerMessage::MoveResponse(outcome)
    }

    fn execute_server_move(&mut self) {
        let (heap, count) = self.strategy.select(&self.game.heaps());
        if let Err(e) = self.game.apply_move(heap, count) {
            debug!("Strategy {:?} produced an unusable move: {}", self.strategy, e);
        }
    }
}
