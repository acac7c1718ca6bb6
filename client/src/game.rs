//! Client side of a Nim game
//!
//! The client walks a fixed cycle: wait to be admitted, ask for the board,
//! read the player's move, send it, read the verdict, ask for the board
//! again. Lines typed while the client is not waiting for a move are queued
//! and used for the next move, except `Q`, which quits at any time.

use crate::input::{parse_command, Command};
use crate::network::{ClientError, Connection};
use crate::rendering::{
    render_board, render_game_over, render_move_outcome, REJECT_MESSAGE, START_MESSAGE,
    TURN_PROMPT, WAIT_MESSAGE,
};
use log::{debug, info, warn};
use shared::{ClientRequest, ServerMessage};
use std::collections::VecDeque;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Connected, waiting for START, WAIT or REJECT
    PreGame,
    SendGameStateRequest,
    RecvGameState,
    /// Waiting for the player to type a move
    SendMove,
    RecvMoveResponse,
}

/// Effect of one server message on the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// `None` ends the session
    pub next: Option<ClientState>,
    pub output: String,
}

impl Transition {
    fn to(next: ClientState, output: impl Into<String>) -> Self {
        Self {
            next: Some(next),
            output: output.into(),
        }
    }

    fn exit(output: impl Into<String>) -> Self {
        Self {
            next: None,
            output: output.into(),
        }
    }
}

/// Applies a server message received in `state`.
pub fn handle_message(state: ClientState, message: ServerMessage) -> Transition {
    match (state, message) {
        (ClientState::PreGame, ServerMessage::Start) => Transition::to(
            ClientState::SendGameStateRequest,
            format!("{}\n", START_MESSAGE),
        ),
        (ClientState::PreGame, ServerMessage::Wait) => {
            Transition::to(ClientState::PreGame, format!("{}\n", WAIT_MESSAGE))
        }
        (ClientState::PreGame, ServerMessage::Reject) => {
            Transition::exit(format!("{}\n", REJECT_MESSAGE))
        }

        (ClientState::RecvGameState, ServerMessage::GameActive { heaps }) => Transition::to(
            ClientState::SendMove,
            format!("{}{}", render_board(&heaps), TURN_PROMPT),
        ),
        (ClientState::RecvGameState, ServerMessage::GameDone { winner }) => {
            Transition::exit(render_game_over(winner))
        }

        (ClientState::RecvMoveResponse, ServerMessage::MoveResponse(outcome)) => Transition::to(
            ClientState::SendGameStateRequest,
            render_move_outcome(outcome),
        ),

        (ClientState::PreGame | ClientState::RecvGameState | ClientState::RecvMoveResponse, _) => {
            warn!("Unexpected {:?} while in {:?}", message, state);
            Transition::exit("")
        }

        // Nothing was asked for, so there is nothing to act on
        (ClientState::SendGameStateRequest | ClientState::SendMove, _) => {
            debug!("Ignoring unsolicited {:?} while in {:?}", message, state);
            Transition::to(state, "")
        }
    }
}

/// Plays one session against the server until the game ends, the player
/// quits, or either side goes away.
pub async fn run<S, R, W>(
    mut connection: Connection<S>,
    input: R,
    mut output: W,
) -> Result<(), ClientError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut typed: VecDeque<String> = VecDeque::new();
    let mut input_open = true;
    let mut state = ClientState::PreGame;

    loop {
        match state {
            ClientState::SendGameStateRequest => {
                connection.send(ClientRequest::GameState).await?;
                state = ClientState::RecvGameState;
                continue;
            }
            ClientState::SendMove => {
                if let Some(line) = typed.pop_front() {
                    let Command::Move { heap, count } = parse_command(&line) else {
                        return Ok(());
                    };
                    connection.send(ClientRequest::Move { heap, count }).await?;
                    state = ClientState::RecvMoveResponse;
                    continue;
                }
                if !input_open {
                    info!("Input closed, leaving the game");
                    return Ok(());
                }
            }
            _ => {}
        }

        tokio::select! {
            message = connection.recv() => {
                let message = match message {
                    Ok(message) => message,
                    Err(ClientError::Closed) => {
                        info!("Disconnected from server");
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                };

                let transition = handle_message(state, message);
                if !transition.output.is_empty() {
                    output.write_all(transition.output.as_bytes()).await?;
                    output.flush().await?;
                }
                match transition.next {
                    Some(next) => state = next,
                    None => return Ok(()),
                }
            }
            line = lines.next_line(), if input_open => {
                match line? {
                    Some(line) if parse_command(&line) == Command::Quit => {
                        info!("Quitting");
                        return Ok(());
                    }
                    Some(line) => typed.push_back(line),
                    None => input_open = false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{MoveOutcome, Party};
    use tokio_test::io::Builder;

    fn server_bytes(message: ServerMessage) -> Vec<u8> {
        message.to_frame().encode().unwrap()
    }

    fn client_bytes(request: ClientRequest) -> Vec<u8> {
        request.to_frame().encode().unwrap()
    }

    #[test]
    fn test_pre_game_transitions() {
        assert_eq!(
            handle_message(ClientState::PreGame, ServerMessage::Start),
            Transition::to(
                ClientState::SendGameStateRequest,
                "Now you are playing against the server!\n"
            )
        );
        assert_eq!(
            handle_message(ClientState::PreGame, ServerMessage::Wait).next,
            Some(ClientState::PreGame)
        );
        assert_eq!(
            handle_message(ClientState::PreGame, ServerMessage::Reject),
            Transition::exit("You are rejected by the server.\n")
        );
    }

    #[test]
    fn test_game_state_transitions() {
        assert_eq!(
            handle_message(
                ClientState::RecvGameState,
                ServerMessage::GameActive { heaps: [1, 2, 3] }
            ),
            Transition::to(
                ClientState::SendMove,
                "Heap A: 1\nHeap B: 2\nHeap C: 3\nYour turn: "
            )
        );

        let done = handle_message(
            ClientState::RecvGameState,
            ServerMessage::GameDone {
                winner: Party::Server,
            },
        );
        assert_eq!(done.next, None);
        assert!(done.output.ends_with("Server win!\n"));
    }

    #[test]
    fn test_move_response_transitions() {
        assert_eq!(
            handle_message(
                ClientState::RecvMoveResponse,
                ServerMessage::MoveResponse(MoveOutcome::Illegal)
            ),
            Transition::to(ClientState::SendGameStateRequest, "Illegal move\n")
        );
    }

    #[test]
    fn test_unexpected_message_ends_session() {
        assert_eq!(
            handle_message(
                ClientState::PreGame,
                ServerMessage::GameActive { heaps: [1, 1, 1] }
            )
            .next,
            None
        );
        assert_eq!(
            handle_message(ClientState::RecvMoveResponse, ServerMessage::Start).next,
            None
        );
        assert_eq!(
            handle_message(ClientState::SendMove, ServerMessage::Wait).next,
            Some(ClientState::SendMove)
        );
    }

    #[tokio::test]
    async fn test_full_session_against_scripted_server() {
        let mock = Builder::new()
            .read(&server_bytes(ServerMessage::Start))
            .write(&client_bytes(ClientRequest::GameState))
            .read(&server_bytes(ServerMessage::GameActive { heaps: [1, 1, 1] }))
            .write(&client_bytes(ClientRequest::Move { heap: 0, count: 1 }))
            .read(&server_bytes(ServerMessage::MoveResponse(MoveOutcome::Accepted)))
            .write(&client_bytes(ClientRequest::GameState))
            .read(&server_bytes(ServerMessage::GameActive { heaps: [0, 0, 1] }))
            .write(&client_bytes(ClientRequest::Move { heap: 2, count: 1 }))
            .read(&server_bytes(ServerMessage::MoveResponse(MoveOutcome::Accepted)))
            .write(&client_bytes(ClientRequest::GameState))
            .read(&server_bytes(ServerMessage::GameDone {
                winner: Party::Client,
            }))
            .build();

        let mut output = Vec::new();
        run(Connection::new(mock), &b"A 1\nC 1\n"[..], &mut output)
            .await
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("Now you are playing against the server!\n"));
        assert!(output.contains("Heap A: 1\nHeap B: 1\nHeap C: 1\nYour turn: Move accepted\n"));
        assert!(output.ends_with("Heap A: 0\nHeap B: 0\nHeap C: 0\nYou win!\n"));
    }

    #[tokio::test]
    async fn test_malformed_input_is_sent_as_invalid_move() {
        let mock = Builder::new()
            .read(&server_bytes(ServerMessage::Start))
            .write(&client_bytes(ClientRequest::GameState))
            .read(&server_bytes(ServerMessage::GameActive { heaps: [1, 1, 1] }))
            .write(&client_bytes(ClientRequest::Move {
                heap: shared::NONE,
                count: shared::NONE,
            }))
            .read(&server_bytes(ServerMessage::MoveResponse(MoveOutcome::Illegal)))
            .write(&client_bytes(ClientRequest::GameState))
            .read(&server_bytes(ServerMessage::GameActive { heaps: [1, 1, 1] }))
            .build();

        let mut output = Vec::new();
        run(Connection::new(mock), &b"take everything\n"[..], &mut output)
            .await
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Illegal move\n"));
    }

    #[tokio::test]
    async fn test_rejected_client_exits() {
        let mock = Builder::new()
            .read(&server_bytes(ServerMessage::Reject))
            .build();

        let mut output = Vec::new();
        run(Connection::new(mock), tokio::io::empty(), &mut output)
            .await
            .unwrap();
        assert_eq!(output, b"You are rejected by the server.\n");
    }

    #[tokio::test]
    async fn test_quit_while_waiting() {
        let (client, _server) = tokio::io::duplex(64);

        let mut output = Vec::new();
        run(Connection::new(client), &b"Q\n"[..], &mut output)
            .await
            .unwrap();
        assert!(output.is_empty());
    }
}
