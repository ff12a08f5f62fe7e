//! Inbound TCP listener
//!
//! Binding happens synchronously so that the bound port (including an
//! ephemeral one) is known before any runtime exists. `start` moves the socket
//! into the current tokio runtime, accepts connections and funnels every
//! received frame into one channel.

use super::tcp::TcpConnection;
use crate::{Endpoint, Result, TransportError};
use bytes::Bytes;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

/// One frame received from a peer
#[derive(Debug, Clone)]
pub struct InboundFrame {
    pub peer: SocketAddr,
    pub payload: Bytes,
}

/// A bound but not yet accepting listener
#[derive(Debug)]
pub struct FrameListener {
    listener: std::net::TcpListener,
    local: Endpoint,
    max_frame_size: usize,
}

impl FrameListener {
    /// Bind the endpoint's address
    pub fn bind(endpoint: &Endpoint, max_frame_size: usize) -> Result<Self> {
        let listener = std::net::TcpListener::bind(endpoint.authority()).map_err(|e| {
            TransportError::network_with_source(format!("Failed to bind TCP listener on {endpoint}"), e)
        })?;
        listener.set_nonblocking(true)?;

        let local = Endpoint::from_socket_addr(listener.local_addr()?);
        info!(endpoint = %endpoint, bound = %local, "TCP listener bound");

        Ok(Self {
            listener,
            local,
            max_frame_size,
        })
    }

    /// Address actually bound
    pub fn local_endpoint(&self) -> &Endpoint {
        &self.local
    }

    /// Start accepting. Must be called from inside a tokio runtime.
    pub fn start(self) -> Result<InboundFrames> {
        let listener = TcpListener::from_std(self.listener)?;
        let (tx, rx) = mpsc::unbounded_channel();

        let accept_task = tokio::spawn(accept_loop(listener, tx, self.max_frame_size));

        Ok(InboundFrames {
            frames: rx,
            accept_task,
            local: self.local,
        })
    }
}

/// Stream of frames from every accepted connection.
///
/// Dropping it stops accepting and closes all inbound connections.
pub struct InboundFrames {
    frames: mpsc::UnboundedReceiver<InboundFrame>,
    accept_task: JoinHandle<()>,
    local: Endpoint,
}

impl InboundFrames {
    /// Next frame from any peer
    pub async fn recv(&mut self) -> Option<InboundFrame> {
        self.frames.recv().await
    }

    pub fn local_endpoint(&self) -> &Endpoint {
        &self.local
    }
}

impl Drop for InboundFrames {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn accept_loop(
    listener: TcpListener,
    tx: mpsc::UnboundedSender<InboundFrame>,
    max_frame_size: usize,
) {
    let mut readers = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(peer = %peer, "Accepted TCP connection");
                    let connection = TcpConnection::new(stream, peer);
                    readers.spawn(read_loop(connection, tx.clone(), max_frame_size));
                }
                Err(e) => {
                    warn!(error = %e, "Failed to accept TCP connection");
                }
            },
            Some(_) = readers.join_next(), if !readers.is_empty() => {}
        }
    }
}

async fn read_loop(
    mut connection: TcpConnection,
    tx: mpsc::UnboundedSender<InboundFrame>,
    max_frame_size: usize,
) {
    let peer = connection.peer_addr();

    loop {
        match connection.receive_message(max_frame_size).await {
            Ok(Some(payload)) => {
                if tx.send(InboundFrame { peer, payload }).is_err() {
                    break;
                }
            }
            Ok(None) => {
                debug!(peer = %peer, "Peer closed TCP connection");
                break;
            }
            Err(e) => {
                warn!(peer = %peer, error = %e, category = e.category(), "Dropping inbound TCP connection");
                break;
            }
        }
    }
}
