//! Performance benchmarks for the Nim engine, codec and server
//!
//! These are coarse wall-clock checks run as ordinary tests.

use rand::Rng;
use shared::{ClientRequest, Frame, FrameBuffer, Game, ServerMessage, Strategy, FRAME_SIZE};
use std::time::{Duration, Instant};

fn random_heaps(rng: &mut impl Rng) -> [i16; 3] {
    [
        rng.gen_range(1..=1000),
        rng.gen_range(1..=1000),
        rng.gen_range(1..=1000),
    ]
}

/// Benchmarks move selection for both strategies
#[test]
fn benchmark_strategy_selection() {
    let mut rng = rand::thread_rng();
    let boards: Vec<[i16; 3]> = (0..10_000).map(|_| random_heaps(&mut rng)).collect();

    for strategy in [Strategy::Greedy, Strategy::Optimal] {
        let start = Instant::now();
        for heaps in &boards {
            let (heap, count) = strategy.select(heaps);
            assert!(Game::new(*heaps).validate_move(heap, count));
        }
        let duration = start.elapsed();
        println!(
            "{:?} selection: {} boards in {:?}",
            strategy,
            boards.len(),
            duration
        );

        // Should complete in under 500ms
        assert!(duration.as_millis() < 500);
    }
}

/// Plays complete server-versus-server games to exhaustion
#[test]
fn benchmark_full_games() {
    let mut rng = rand::thread_rng();
    let start = Instant::now();
    let mut moves = 0usize;

    for _ in 0..100 {
        let mut game = Game::new(random_heaps(&mut rng));
        while !game.is_done() {
            let (heap, count) = Strategy::Greedy.select(&game.heaps());
            game.apply_move(heap, count).unwrap();
            moves += 1;
        }
        assert!(game.winner().is_some());
    }

    let duration = start.elapsed();
    println!("Full games: {} moves in {:?}", moves, duration);

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks frame encoding and byte-at-a-time reassembly
#[test]
fn benchmark_frame_codec() {
    let messages = [
        ServerMessage::GameActive { heaps: [1000, 500, 1] },
        ServerMessage::Start,
        ServerMessage::MoveResponse(shared::MoveOutcome::Illegal),
    ];

    let iterations = 10_000;
    let start = Instant::now();
    let mut buffer = FrameBuffer::new();

    for i in 0..iterations {
        let message = messages[i % messages.len()];
        let bytes = message.to_frame().encode().unwrap();
        assert_eq!(bytes.len(), FRAME_SIZE);

        for byte in &bytes {
            buffer.extend_from_slice(std::slice::from_ref(byte));
        }
        let frame = buffer.take_frame().unwrap().unwrap();
        assert_eq!(ServerMessage::from_frame(&frame).unwrap(), message);
    }

    let duration = start.elapsed();
    println!(
        "Frame codec: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Stress tests the reactor with many simultaneous clients
#[tokio::test]
async fn stress_test_many_clients() {
    use server::{Server, ServerConfig};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::time::timeout;

    const CLIENTS: usize = 50;

    let mut config = ServerConfig::new([10, 10, 10], CLIENTS, 1);
    config.host = "127.0.0.1".to_string();
    config.port = 0;
    let mut server = Server::new(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.run().await;
    });

    async fn recv(stream: &mut TcpStream) -> ServerMessage {
        let mut bytes = [0u8; FRAME_SIZE];
        stream.read_exact(&mut bytes).await.unwrap();
        ServerMessage::from_frame(&Frame::decode(&bytes).unwrap()).unwrap()
    }

    let start = Instant::now();
    let mut streams = Vec::with_capacity(CLIENTS);
    for _ in 0..CLIENTS {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        assert_eq!(recv(&mut stream).await, ServerMessage::Start);
        streams.push(stream);
    }

    let request = ClientRequest::GameState.to_frame().encode().unwrap();
    let rounds = 20;
    let exchange = async {
        for _ in 0..rounds {
            for stream in streams.iter_mut() {
                stream.write_all(&request).await.unwrap();
            }
            for stream in streams.iter_mut() {
                assert_eq!(
                    recv(stream).await,
                    ServerMessage::GameActive { heaps: [10, 10, 10] }
                );
            }
        }
    };
    timeout(Duration::from_secs(10), exchange)
        .await
        .expect("server stalled under load");

    let duration = start.elapsed();
    println!(
        "Many clients: {} clients x {} requests in {:?}",
        CLIENTS, rounds, duration
    );
}
