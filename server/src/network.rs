//! Server network layer: a single-threaded reactor over TCP
//!
//! One task owns the listener and every connection. Each cycle it waits
//! until at least one socket is ready, then accepts at most one client,
//! reads what is missing from each readable connection's current frame, and
//! flushes as much pending output as every socket accepts. No call ever
//! blocks on an individual socket: reads and writes use `try_read` /
//! `try_write`, and a socket that is not ready is simply revisited on a
//! later cycle.

use crate::client_manager::{ClientManager, ConnectionId, Pool};
use crate::config::ServerConfig;
use log::{debug, error, info, warn};
use shared::{FrameError, FRAME_SIZE};
use std::future::poll_fn;
use std::io;
use std::net::SocketAddr;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

/// Why a connection is being torn down
#[derive(Debug, Error)]
enum ConnectionError {
    #[error("peer closed the connection")]
    PeerClosed,

    #[error("socket error: {0}")]
    Io(#[from] io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] FrameError),
}

/// Sockets reported ready by one poll
#[derive(Debug, Default)]
struct Readiness {
    accepted: Option<io::Result<(TcpStream, SocketAddr)>>,
    readable: Vec<ConnectionId>,
    writable: bool,
}

impl Readiness {
    fn is_empty(&self) -> bool {
        self.accepted.is_none() && self.readable.is_empty() && !self.writable
    }
}

/// Multiplexed Nim server
pub struct Server {
    listener: TcpListener,
    clients: ClientManager<TcpStream>,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;

        let listener = TcpListener::bind(config.address()).await?;
        info!(
            "Server listening on {} (players: {}, waiting list: {}, strategy: {:?})",
            listener.local_addr()?,
            config.player_capacity,
            config.wait_capacity,
            config.strategy
        );

        Ok(Server {
            listener,
            clients: ClientManager::new(
                config.player_capacity,
                config.wait_capacity,
                config.heaps,
                config.strategy,
            ),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Main reactor loop. Connection failures never end it.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Server started successfully");

        loop {
            self.run_cycle().await;
        }
    }

    async fn run_cycle(&mut self) {
        let readiness = poll_fn(|cx| self.poll_readiness(cx)).await;

        if let Some(accepted) = readiness.accepted {
            self.handle_new_connection(accepted);
        }
        self.handle_reads(&readiness.readable);
        self.handle_writes();
    }

    /// Registers interest in every socket and resolves once any is ready.
    ///
    /// Every connection keeps read interest so hangups are noticed in any
    /// pool. Write interest is skipped for connections with nothing to send.
    fn poll_readiness(&self, cx: &mut Context<'_>) -> Poll<Readiness> {
        let mut readiness = Readiness::default();

        if let Poll::Ready(accepted) = self.listener.poll_accept(cx) {
            readiness.accepted = Some(accepted);
        }

        for connection in self.clients.iter() {
            if connection.stream.poll_read_ready(cx).is_ready() {
                readiness.readable.push(connection.id);
            }
            if connection.has_pending_output()
                && connection.stream.poll_write_ready(cx).is_ready()
            {
                readiness.writable = true;
            }
        }

        if readiness.is_empty() {
            Poll::Pending
        } else {
            Poll::Ready(readiness)
        }
    }

    fn handle_new_connection(&mut self, accepted: io::Result<(TcpStream, SocketAddr)>) {
        let (stream, addr) = match accepted {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Failed to accept connection: {}", e);
                return;
            }
        };

        match self.clients.admit(stream, addr) {
            Ok((id, pool)) => debug!(
                "Connection {} joined {:?} ({} connections open)",
                id,
                pool,
                self.clients.len()
            ),
            Err(e) => error!("Failed to admit connection from {}: {}", addr, e),
        }
    }

    fn handle_reads(&mut self, readable: &[ConnectionId]) {
        for &id in readable {
            if let Err(e) = self.read_connection(id) {
                match &e {
                    ConnectionError::PeerClosed => debug!("Connection {}: {}", id, e),
                    _ => warn!("Connection {}: {}", id, e),
                }
                self.close_connection(id);
            }
        }
    }

    /// Reads at most the bytes missing from the current frame, then
    /// dispatches it if complete.
    ///
    /// A connection with a parked frame is still read so that a hangup
    /// tears it down. Bytes it sends beyond the parked frame are dropped.
    fn read_connection(&mut self, id: ConnectionId) -> Result<(), ConnectionError> {
        let Some(connection) = self.clients.get_mut(id) else {
            return Ok(());
        };

        if connection.has_parked_frame() {
            let mut scratch = [0u8; FRAME_SIZE];
            return match connection.stream.try_read(&mut scratch) {
                Ok(0) => Err(ConnectionError::PeerClosed),
                Ok(n) => {
                    debug!(
                        "Connection {} ({:?}) dropped {} bytes past its parked frame",
                        id,
                        connection.pool(),
                        n
                    );
                    Ok(())
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
                Err(e) => Err(e.into()),
            };
        }

        match connection
            .stream
            .try_read(connection.incoming.unfilled_mut())
        {
            Ok(0) => return Err(ConnectionError::PeerClosed),
            Ok(n) => {
                connection.incoming.advance(n);
                debug!(
                    "Connection {} received {} bytes ({} buffered)",
                    id,
                    n,
                    connection.incoming.len()
                );
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        connection.process_incoming()?;
        Ok(())
    }

    /// Flushes pending output on every connection that has some.
    ///
    /// Sockets that cannot take bytes right now report `WouldBlock` and are
    /// retried next cycle.
    fn handle_writes(&mut self) {
        for id in self.clients.pending_output() {
            match self.write_connection(id) {
                Ok(true) => {
                    debug!("Connection {} received its rejection notice", id);
                    self.close_connection(id);
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("Connection {}: {}", id, e);
                    self.close_connection(id);
                }
            }
        }
    }

    /// Returns true once a rejected connection has drained its notice
    fn write_connection(&mut self, id: ConnectionId) -> Result<bool, ConnectionError> {
        let Some(connection) = self.clients.get_mut(id) else {
            return Ok(false);
        };

        match connection.stream.try_write(&connection.outgoing) {
            Ok(n) => {
                connection.consume_output(n);
                debug!(
                    "Connection {} sent {} bytes ({} pending)",
                    id,
                    n,
                    connection.outgoing.len()
                );
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
            Err(e) => return Err(e.into()),
        }

        Ok(!connection.has_pending_output() && connection.pool() == Pool::Rejected)
    }

    /// Tears down a connection; promoted waiting players get their START
    /// flushed on the next cycle
    fn close_connection(&mut self, id: ConnectionId) {
        for connection in self.clients.close(id) {
            debug!("Closing socket of connection {}", connection.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{ClientRequest, Frame, MoveOutcome, ServerMessage};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::time::{sleep, timeout};

    async fn spawn_server(heaps: [i16; 3], players: usize, waiting: usize) -> SocketAddr {
        let mut config = ServerConfig::new(heaps, players, waiting);
        config.host = "127.0.0.1".to_string();
        config.port = 0;

        let mut server = Server::new(config).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = server.run().await;
        });
        addr
    }

    async fn recv(stream: &mut TcpStream) -> ServerMessage {
        let mut bytes = [0u8; FRAME_SIZE];
        timeout(Duration::from_secs(5), stream.read_exact(&mut bytes))
            .await
            .expect("timed out waiting for a frame")
            .unwrap();
        ServerMessage::from_frame(&Frame::decode(&bytes).unwrap()).unwrap()
    }

    async fn send(stream: &mut TcpStream, request: ClientRequest) {
        let bytes = request.to_frame().encode().unwrap();
        stream.write_all(&bytes).await.unwrap();
    }

    async fn assert_closed(stream: &mut TcpStream) {
        let mut byte = [0u8; 1];
        let read = timeout(Duration::from_secs(5), stream.read(&mut byte))
            .await
            .expect("timed out waiting for close");
        assert!(matches!(read, Ok(0) | Err(_)));
    }

    #[tokio::test]
    async fn test_invalid_config_is_refused() {
        let config = ServerConfig::new([0, 1, 1], 1, 1);
        assert!(Server::new(config).await.is_err());
    }

    #[tokio::test]
    async fn test_start_then_game_state() {
        let addr = spawn_server([1, 2, 3], 1, 1).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();

        assert_eq!(recv(&mut stream).await, ServerMessage::Start);
        send(&mut stream, ClientRequest::GameState).await;
        assert_eq!(
            recv(&mut stream).await,
            ServerMessage::GameActive { heaps: [1, 2, 3] }
        );
    }

    #[tokio::test]
    async fn test_frame_split_across_writes() {
        let addr = spawn_server([1, 1, 1], 1, 1).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.set_nodelay(true).unwrap();
        assert_eq!(recv(&mut stream).await, ServerMessage::Start);

        let bytes = ClientRequest::Move { heap: 0, count: 1 }
            .to_frame()
            .encode()
            .unwrap();
        stream.write_all(&bytes[..3]).await.unwrap();
        sleep(Duration::from_millis(50)).await;
        stream.write_all(&bytes[3..]).await.unwrap();

        assert_eq!(
            recv(&mut stream).await,
            ServerMessage::MoveResponse(MoveOutcome::Accepted)
        );
    }

    #[tokio::test]
    async fn test_rejected_client_is_closed() {
        let addr = spawn_server([1, 1, 1], 1, 1).await;

        let mut active = TcpStream::connect(addr).await.unwrap();
        assert_eq!(recv(&mut active).await, ServerMessage::Start);
        let mut waiting = TcpStream::connect(addr).await.unwrap();
        assert_eq!(recv(&mut waiting).await, ServerMessage::Wait);

        let mut rejected = TcpStream::connect(addr).await.unwrap();
        assert_eq!(recv(&mut rejected).await, ServerMessage::Reject);
        assert_closed(&mut rejected).await;
    }

    #[tokio::test]
    async fn test_unknown_opcode_closes_connection() {
        let addr = spawn_server([1, 1, 1], 1, 1).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        assert_eq!(recv(&mut stream).await, ServerMessage::Start);

        let bytes = Frame::new(42, &[]).encode().unwrap();
        stream.write_all(&bytes).await.unwrap();
        assert_closed(&mut stream).await;
    }
}
