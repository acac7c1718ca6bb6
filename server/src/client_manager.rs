//! Connection registry and admission control for the multiplexed server
//!
//! Every open socket has exactly one [`Connection`] record holding its
//! partial-frame receive buffer, its pending send bytes and its pool
//! membership. The [`ClientManager`] owns all records and enforces the
//! three-way admission policy:
//! - up to `player_capacity` connections play an active game
//! - up to `wait_capacity` more wait, oldest first, for a free game slot
//! - everyone else is rejected and closed once the rejection notice is sent
//!
//! The registry is generic over the stream type so the admission logic can
//! be exercised without real sockets.

use crate::game::GameHost;
use log::{debug, info, warn};
use shared::{ClientRequest, FrameBuffer, FrameError, Heaps, ServerMessage, Strategy};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;

/// Stable identifier assigned to each accepted connection
pub type ConnectionId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Active,
    Waiting,
    Rejected,
}

#[derive(Debug)]
enum Membership {
    Active(GameHost),
    Waiting,
    Rejected,
}

/// One accepted socket and everything buffered for it
#[derive(Debug)]
pub struct Connection<S> {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    pub stream: S,
    /// Bytes of the frame currently being received
    pub incoming: FrameBuffer,
    /// Encoded responses not yet accepted by the socket
    pub outgoing: Vec<u8>,
    membership: Membership,
}

impl<S> Connection<S> {
    fn new(id: ConnectionId, addr: SocketAddr, stream: S, membership: Membership) -> Self {
        Self {
            id,
            addr,
            stream,
            incoming: FrameBuffer::new(),
            outgoing: Vec::new(),
            membership,
        }
    }

    pub fn pool(&self) -> Pool {
        match self.membership {
            Membership::Active(_) => Pool::Active,
            Membership::Waiting => Pool::Waiting,
            Membership::Rejected => Pool::Rejected,
        }
    }

    /// The game session, present only while the connection is active
    pub fn session(&self) -> Option<&GameHost> {
        match &self.membership {
            Membership::Active(host) => Some(host),
            _ => None,
        }
    }

    /// True while a whole frame sits in the receive buffer unprocessed,
    /// which only happens outside an active game
    pub fn has_parked_frame(&self) -> bool {
        self.incoming.is_complete()
    }

    pub fn has_pending_output(&self) -> bool {
        !self.outgoing.is_empty()
    }

    fn enqueue(&mut self, message: ServerMessage) -> Result<(), FrameError> {
        self.outgoing.extend(message.to_frame().encode()?);
        Ok(())
    }

    /// Hands a completed frame to the game session and queues its response.
    ///
    /// Waiting and rejected connections keep their bytes buffered untouched.
    /// An unknown opcode is an error; the caller closes the connection.
    pub fn process_incoming(&mut self) -> Result<(), FrameError> {
        let response = {
            let Membership::Active(host) = &mut self.membership else {
                return Ok(());
            };
            let Some(frame) = self.incoming.take_frame()? else {
                return Ok(());
            };
            let request = ClientRequest::from_frame(&frame)?;
            debug!("Connection {} request {:?}", self.id, request);
            host.execute(request)
        };

        debug!("Connection {} response {:?}", self.id, response);
        self.enqueue(response)
    }

    /// Drops the first `written` bytes of the send buffer
    pub fn consume_output(&mut self, written: usize) {
        let written = written.min(self.outgoing.len());
        self.outgoing.drain(..written);
    }
}

/// Owns every connection record and the admission pools
pub struct ClientManager<S> {
    connections: HashMap<ConnectionId, Connection<S>>,
    /// Waiting connections in arrival order
    waiting: VecDeque<ConnectionId>,
    next_connection_id: ConnectionId,
    player_capacity: usize,
    wait_capacity: usize,
    /// Starting board and strategy for every new game
    heaps: Heaps,
    strategy: Strategy,
}

impl<S> ClientManager<S> {
    pub fn new(
        player_capacity: usize,
        wait_capacity: usize,
        heaps: Heaps,
        strategy: Strategy,
    ) -> Self {
        Self {
            connections: HashMap::new(),
            waiting: VecDeque::new(),
            next_connection_id: 1,
            player_capacity,
            wait_capacity,
            heaps,
            strategy,
        }
    }

    /// Registers a freshly accepted stream and places it in a pool.
    ///
    /// The matching START, WAIT or REJECT notice is queued immediately.
    pub fn admit(
        &mut self,
        stream: S,
        addr: SocketAddr,
    ) -> Result<(ConnectionId, Pool), FrameError> {
        let id = self.next_connection_id;
        self.next_connection_id = self.next_connection_id.wrapping_add(1);

        let pool = if self.active_len() < self.player_capacity {
            Pool::Active
        } else if self.waiting.len() < self.wait_capacity {
            Pool::Waiting
        } else {
            Pool::Rejected
        };

        let (membership, notice) = match pool {
            Pool::Active => (
                Membership::Active(GameHost::new(self.heaps, self.strategy)),
                ServerMessage::Start,
            ),
            Pool::Waiting => (Membership::Waiting, ServerMessage::Wait),
            Pool::Rejected => (Membership::Rejected, ServerMessage::Reject),
        };

        let mut connection = Connection::new(id, addr, stream, membership);
        connection.enqueue(notice)?;

        if pool == Pool::Waiting {
            self.waiting.push_back(id);
        }
        self.connections.insert(id, connection);

        info!("Connection {} from {} admitted as {:?}", id, addr, pool);
        Ok((id, pool))
    }

    /// Removes a connection and, if it held a game slot, promotes the
    /// oldest waiting connection into it.
    ///
    /// Returns every record that left the registry. Dropping them closes
    /// their sockets.
    pub fn close(&mut self, id: ConnectionId) -> Vec<Connection<S>> {
        let mut closed = Vec::new();
        let mut pending = vec![id];

        while let Some(id) = pending.pop() {
            let Some(connection) = self.connections.remove(&id) else {
                continue;
            };
            info!(
                "Connection {} from {} closed ({:?})",
                id,
                connection.addr,
                connection.pool()
            );

            match connection.pool() {
                Pool::Active => {
                    if let Some(next) = self.waiting.pop_front() {
                        if let Err(e) = self.start_game(next) {
                            warn!("Failed to start game for connection {}: {}", next, e);
                            pending.push(next);
                        }
                    }
                }
                Pool::Waiting => self.waiting.retain(|&waiting| waiting != id),
                Pool::Rejected => {}
            }

            closed.push(connection);
        }

        closed
    }

    /// Moves a connection into an active game with a fresh board
    fn start_game(&mut self, id: ConnectionId) -> Result<(), FrameError> {
        let host = GameHost::new(self.heaps, self.strategy);
        let Some(connection) = self.connections.get_mut(&id) else {
            return Ok(());
        };

        connection.membership = Membership::Active(host);
        connection.enqueue(ServerMessage::Start)?;
        info!("Connection {} promoted to an active game", id);

        // Bytes sent while waiting are answered now
        connection.process_incoming()
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection<S>> {
        self.connections.get(&id)
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Connection<S>> {
        self.connections.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection<S>> {
        self.connections.values()
    }

    /// Ids of connections with bytes waiting to be written
    pub fn pending_output(&self) -> Vec<ConnectionId> {
        self.connections
            .values()
            .filter(|connection| connection.has_pending_output())
            .map(|connection| connection.id)
            .collect()
    }

    /// Waiting connection ids, oldest first
    pub fn waiting(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.waiting.iter().copied()
    }

    pub fn pool_len(&self, pool: Pool) -> usize {
        self.connections
            .values()
            .filter(|connection| connection.pool() == pool)
            .count()
    }

    pub fn active_len(&self) -> usize {
        self.pool_len(Pool::Active)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
