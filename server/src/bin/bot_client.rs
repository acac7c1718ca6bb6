//! Scripted Nim player for exercising a running server.
//!
//! Connects, waits for a game slot, then plays until the game ends using
//! one of the server's own strategies.

use clap::Parser;
use log::{info, warn};
use shared::{ClientRequest, Frame, ServerMessage, Strategy, FRAME_SIZE};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[derive(Parser, Debug)]
#[command(author, version, about = "Plays one Nim game against a server", long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:6444")]
    server: String,

    /// Use the nim-sum strategy instead of taking one from the largest heap
    #[arg(long)]
    optimal_strategy: bool,
}

async fn send(
    stream: &mut TcpStream,
    request: ClientRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = request.to_frame().encode()?;
    stream.write_all(&data).await?;
    Ok(())
}

async fn recv(stream: &mut TcpStream) -> Result<ServerMessage, Box<dyn std::error::Error>> {
    let mut buf = [0u8; FRAME_SIZE];
    stream.read_exact(&mut buf).await?;
    Ok(ServerMessage::from_frame(&Frame::decode(&buf)?)?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let strategy = if args.optimal_strategy {
        Strategy::Optimal
    } else {
        Strategy::Greedy
    };

    let mut stream = TcpStream::connect(&args.server).await?;
    info!("Connected to {}", args.server);

    loop {
        match recv(&mut stream).await? {
            ServerMessage::Start => break,
            ServerMessage::Wait => info!("Waiting for a free game slot"),
            ServerMessage::Reject => {
                warn!("Rejected by the server");
                return Ok(());
            }
            other => warn!("Unexpected message before game start: {:?}", other),
        }
    }

    let mut moves = 0;
    loop {
        send(&mut stream, ClientRequest::GameState).await?;
        let heaps = match recv(&mut stream).await? {
            ServerMessage::GameActive { heaps } => heaps,
            ServerMessage::GameDone { winner } => {
                info!("Game over after {} moves, winner: {:?}", moves, winner);
                return Ok(());
            }
            other => return Err(format!("unexpected game state reply: {:?}", other).into()),
        };

        let (heap, count) = strategy.select(&heaps);
        info!("Board {:?}, removing {} from heap {}", heaps, count, heap);
        send(&mut stream, ClientRequest::Move { heap, count }).await?;

        match recv(&mut stream).await? {
            ServerMessage::MoveResponse(outcome) => info!("Move {:?}", outcome),
            other => return Err(format!("unexpected move reply: {:?}", other).into()),
        }
        moves += 1;
    }
}
