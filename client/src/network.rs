use log::debug;
use shared::{ClientRequest, FrameBuffer, FrameError, ServerMessage};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("server closed the connection")]
    Closed,

    #[error("socket error: {0}")]
    Io(#[from] io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] FrameError),
}

/// Framed connection to a Nim server
pub struct Connection<S> {
    stream: S,
    incoming: FrameBuffer,
}

impl Connection<TcpStream> {
    pub async fn connect(hostname: &str, port: u16) -> io::Result<Self> {
        let stream = TcpStream::connect((hostname, port)).await?;
        debug!("Connected to {}", stream.peer_addr()?);
        Ok(Self::new(stream))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            incoming: FrameBuffer::new(),
        }
    }

    pub async fn send(&mut self, request: ClientRequest) -> Result<(), ClientError> {
        let bytes = request.to_frame().encode()?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        debug!("Sent {:?}", request);
        Ok(())
    }

    /// Waits for the next complete server message.
    ///
    /// Cancel safe: bytes of a partially received frame stay buffered and
    /// the next call picks up where this one stopped.
    pub async fn recv(&mut self) -> Result<ServerMessage, ClientError> {
        loop {
            if let Some(frame) = self.incoming.take_frame()? {
                let message = ServerMessage::from_frame(&frame)?;
                debug!("Received {:?}", message);
                return Ok(message);
            }

            let n = self.stream.read(self.incoming.unfilled_mut()).await?;
            if n == 0 {
                return Err(ClientError::Closed);
            }
            self.incoming.advance(n);
        }
    }
}
