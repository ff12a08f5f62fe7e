//! TCP Network Transport Implementation
//!
//! Length-prefixed framing over TCP. Every frame is a 4-byte big-endian
//! length followed by that many payload bytes.

use crate::{Endpoint, Result, TransportError};
use bytes::{Bytes, BytesMut};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Size of the frame length prefix
pub const FRAME_HEADER_LEN: usize = 4;

/// Default cap on a single frame's payload
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024; // 16MB

/// TCP connection wrapper with reusable frame buffers
pub struct TcpConnection {
    stream: TcpStream,
    peer_addr: SocketAddr,
    bytes_sent: u64,
    bytes_received: u64,
    read_buffer: BytesMut,
    write_buffer: BytesMut,
}

impl TcpConnection {
    pub fn new(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        if let Err(e) = stream.set_nodelay(true) {
            warn!(peer = %peer_addr, error = %e, "Failed to set TCP_NODELAY");
        }

        Self {
            stream,
            peer_addr,
            bytes_sent: 0,
            bytes_received: 0,
            read_buffer: BytesMut::with_capacity(64 * 1024),
            write_buffer: BytesMut::with_capacity(64 * 1024),
        }
    }

    /// Connect to an endpoint with a timeout
    pub async fn connect(endpoint: &Endpoint, connect_timeout: Duration) -> Result<Self> {
        let authority = endpoint.authority();

        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(&authority))
            .await
            .map_err(|_| TransportError::timeout("TCP connect", connect_timeout.as_millis() as u64))?
            .map_err(|e| TransportError::connection_with_source(
                format!("Failed to connect to {endpoint}"),
                None,
                e,
            ))?;

        let peer_addr = stream
            .peer_addr()
            .map_err(|e| TransportError::network_with_source("Failed to get peer address", e))?;

        info!(endpoint = %endpoint, peer = %peer_addr, "Connected to TCP peer");
        Ok(Self::new(stream, peer_addr))
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Send one frame
    pub async fn send_message(&mut self, data: &[u8]) -> Result<()> {
        let len = u32::try_from(data.len()).map_err(|_| {
            TransportError::protocol(format!("Frame of {} bytes cannot be length-prefixed", data.len()))
        })?;

        self.write_buffer.clear();
        self.write_buffer.extend_from_slice(&len.to_be_bytes());
        self.write_buffer.extend_from_slice(data);

        self.stream
            .write_all(&self.write_buffer)
            .await
            .map_err(|e| TransportError::network_with_source("Failed to write message", e))?;

        self.stream
            .flush()
            .await
            .map_err(|e| TransportError::network_with_source("Failed to flush TCP stream", e))?;

        self.bytes_sent += (FRAME_HEADER_LEN + data.len()) as u64;

        debug!(
            peer = %self.peer_addr,
            bytes = data.len(),
            total_sent = self.bytes_sent,
            "Sent frame over TCP"
        );

        Ok(())
    }

    /// Receive one frame.
    ///
    /// Returns `Ok(None)` when the peer closes the connection between frames.
    pub async fn receive_message(&mut self, max_size: usize) -> Result<Option<Bytes>> {
        let mut len_bytes = [0u8; FRAME_HEADER_LEN];
        match self.stream.read_exact(&mut len_bytes).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => {
                return Err(TransportError::network_with_source(
                    "Failed to read message length",
                    e,
                ))
            }
        }

        let message_len = u32::from_be_bytes(len_bytes) as usize;

        if message_len > max_size {
            return Err(TransportError::protocol(format!(
                "Message size {} exceeds maximum {}",
                message_len, max_size
            )));
        }

        self.read_buffer.clear();
        self.read_buffer.resize(message_len, 0);

        self.stream
            .read_exact(&mut self.read_buffer)
            .await
            .map_err(|e| TransportError::network_with_source("Failed to read message data", e))?;

        self.bytes_received += (FRAME_HEADER_LEN + message_len) as u64;

        debug!(
            peer = %self.peer_addr,
            bytes = message_len,
            total_received = self.bytes_received,
            "Received frame over TCP"
        );

        Ok(Some(self.read_buffer.split_to(message_len).freeze()))
    }

    /// Shut down the write half
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(peer = %self.peer_addr, error = %e, "Error shutting down TCP connection");
        }
        info!(peer = %self.peer_addr, "Closed TCP connection");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn pair() -> (TcpConnection, TcpConnection) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let endpoint = Endpoint::from_socket_addr(addr);

        let (client, server) = tokio::join!(
            TcpConnection::connect(&endpoint, Duration::from_secs(1)),
            listener.accept()
        );
        let (stream, peer) = server.unwrap();
        (client.unwrap(), TcpConnection::new(stream, peer))
    }

    #[tokio::test]
    async fn test_frames_arrive_in_order() {
        let (mut client, mut server) = pair().await;

        client.send_message(b"first").await.unwrap();
        client.send_message(b"").await.unwrap();
        client.send_message(b"third").await.unwrap();

        let max = DEFAULT_MAX_FRAME_SIZE;
        assert_eq!(server.receive_message(max).await.unwrap().unwrap(), &b"first"[..]);
        assert_eq!(server.receive_message(max).await.unwrap().unwrap(), &b""[..]);
        assert_eq!(server.receive_message(max).await.unwrap().unwrap(), &b"third"[..]);
        assert_eq!(client.bytes_sent(), (3 * FRAME_HEADER_LEN + 10) as u64);
    }

    #[tokio::test]
    async fn test_clean_close_yields_none() {
        let (client, mut server) = pair().await;
        client.close().await;

        assert!(server.receive_message(1024).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_is_protocol_error() {
        let (mut client, mut server) = pair().await;
        client.send_message(&[7u8; 64]).await.unwrap();

        let err = server.receive_message(16).await.unwrap_err();
        assert_eq!(err.category(), "protocol");
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to find a port with nothing listening
        let addr = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap()
        };
        let endpoint = Endpoint::from_socket_addr(addr);

        let err = TcpConnection::connect(&endpoint, Duration::from_secs(1))
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            TransportError::Connection { .. } | TransportError::Io { .. } | TransportError::Timeout { .. }
        ));
    }
}
