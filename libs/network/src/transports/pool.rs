//! Outbound connection cache
//!
//! One lazily-opened connection per destination endpoint, reused for every
//! later frame to that endpoint. A connection that fails a write is evicted;
//! the next frame to that endpoint reconnects.

use super::tcp::TcpConnection;
use crate::{Endpoint, Result, TransportError};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Per-endpoint outbound connections
pub struct ConnectionCache {
    connections: HashMap<Endpoint, TcpConnection>,
    connect_timeout: Duration,
    max_frame_size: usize,
}

impl ConnectionCache {
    pub fn new(connect_timeout: Duration, max_frame_size: usize) -> Self {
        Self {
            connections: HashMap::new(),
            connect_timeout,
            max_frame_size,
        }
    }

    /// Send one frame to `endpoint`, connecting first if needed
    pub async fn send(&mut self, endpoint: &Endpoint, payload: &[u8]) -> Result<()> {
        if payload.len() > self.max_frame_size {
            return Err(TransportError::protocol(format!(
                "Message size {} exceeds maximum {}",
                payload.len(),
                self.max_frame_size
            )));
        }

        if !self.connections.contains_key(endpoint) {
            let connection = TcpConnection::connect(endpoint, self.connect_timeout).await?;
            self.connections.insert(endpoint.clone(), connection);
        }

        let Some(connection) = self.connections.get_mut(endpoint) else {
            return Err(TransportError::connection(
                format!("No connection cached for {endpoint}"),
                None,
            ));
        };

        if let Err(e) = connection.send_message(payload).await {
            debug!(endpoint = %endpoint, error = %e, "Evicting failed connection");
            self.connections.remove(endpoint);
            return Err(e);
        }

        Ok(())
    }

    pub fn contains(&self, endpoint: &Endpoint) -> bool {
        self.connections.contains_key(endpoint)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Close every cached connection at once
    pub async fn close_all(&mut self) {
        let count = self.connections.len();
        for (_, connection) in self.connections.drain() {
            connection.close().await;
        }
        if count > 0 {
            info!(connections = count, "Closed outbound connections");
        }
    }
}
