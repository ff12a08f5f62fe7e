//! Outbound remote delivery
//!
//! `RemoteSender` is a cheap clonable handle. Encoding happens on the
//! caller's thread, so a message that cannot be represented on the wire is
//! reported straight back. Encoded frames go through a channel to a dedicated
//! `remote-sender` thread, which owns a current-thread tokio runtime and the
//! per-endpoint connection cache. Transport failures there are logged and the
//! frame is dropped.

use crate::actor_ref::{ActorAddress, ActorRef};
use crate::messages::Payload;
use crate::{ActorError, Result};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use switchyard_codec::WireRecord;
use switchyard_config::RemoteSettings;
use switchyard_network::{ConnectionCache, Endpoint};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Bound on how long `close()` waits for the sender thread
const CLOSE_WAIT: Duration = Duration::from_secs(1);

enum Command {
    Deliver { endpoint: Endpoint, frame: Vec<u8> },
    Close { done: crossbeam_channel::Sender<()> },
}

struct SenderInner {
    commands: mpsc::UnboundedSender<Command>,
    local_endpoint: RwLock<Option<Endpoint>>,
}

/// Handle to the process's outbound remote channel
#[derive(Clone)]
pub struct RemoteSender {
    inner: Arc<SenderInner>,
}

impl RemoteSender {
    /// Start the sender thread. `local_endpoint` is advertised as the reply
    /// address of every message sent on behalf of a local actor.
    pub fn new(local_endpoint: Option<Endpoint>, settings: &RemoteSettings) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ActorError::spawn("remote sender runtime", e))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let cache = ConnectionCache::new(settings.connect_timeout(), settings.max_frame_bytes);

        thread::Builder::new()
            .name("remote-sender".to_string())
            .spawn(move || runtime.block_on(deliver_loop(rx, cache)))
            .map_err(|e| ActorError::spawn("remote sender thread", e))?;

        info!(local_endpoint = ?local_endpoint, "Remote sender started");

        Ok(Self {
            inner: Arc::new(SenderInner {
                commands: tx,
                local_endpoint: RwLock::new(local_endpoint),
            }),
        })
    }

    pub fn local_endpoint(&self) -> Option<Endpoint> {
        self.inner.local_endpoint.read().clone()
    }

    pub fn set_local_endpoint(&self, endpoint: Option<Endpoint>) {
        *self.inner.local_endpoint.write() = endpoint;
    }

    /// Build the wire record for one delivery.
    ///
    /// The advertised reply endpoint is the sender's own endpoint when the
    /// sender is remote, otherwise this process's local endpoint. A reference
    /// forwarded through a third process therefore advertises that process,
    /// not the original one.
    pub fn wire_record(
        &self,
        actor_name: &str,
        message: &dyn Payload,
        sender: Option<&ActorRef>,
    ) -> Result<WireRecord> {
        let sender_endpoint = match sender {
            Some(ActorRef::Remote(remote)) => Some(remote.endpoint().to_string()),
            _ => self.local_endpoint().map(|endpoint| endpoint.to_string()),
        };

        Ok(WireRecord {
            sender_actor: sender.map(|s| s.name().to_string()),
            sender_endpoint,
            receiver: actor_name.to_string(),
            message_type: message.type_name().to_string(),
            message: message.to_fields()?,
        })
    }

    /// Encode and queue one message for `actor_name` at `endpoint`
    pub fn send_to(
        &self,
        endpoint: &Endpoint,
        actor_name: &str,
        message: &dyn Payload,
        sender: Option<&ActorRef>,
    ) -> Result<()> {
        let record = self.wire_record(actor_name, message, sender)?;
        let frame = record.encode()?;

        trace!(
            endpoint = %endpoint,
            receiver = actor_name,
            message_type = %record.message_type,
            bytes = frame.len(),
            "Queue remote message"
        );

        self.inner
            .commands
            .send(Command::Deliver {
                endpoint: endpoint.clone(),
                frame,
            })
            .map_err(|_| ActorError::mailbox_closed("remote-sender"))
    }

    /// Close every cached outbound connection. Later sends reconnect.
    pub fn close(&self) {
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        if self.inner.commands.send(Command::Close { done: done_tx }).is_err() {
            return;
        }
        if done_rx.recv_timeout(CLOSE_WAIT).is_err() {
            debug!("Remote sender did not confirm close in time");
        }
    }
}

impl fmt::Debug for RemoteSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSender")
            .field("local_endpoint", &self.local_endpoint())
            .finish()
    }
}

async fn deliver_loop(mut commands: mpsc::UnboundedReceiver<Command>, mut cache: ConnectionCache) {
    while let Some(command) = commands.recv().await {
        match command {
            Command::Deliver { endpoint, frame } => {
                if let Err(e) = cache.send(&endpoint, &frame).await {
                    warn!(
                        endpoint = %endpoint,
                        error = %e,
                        category = e.category(),
                        "Dropping remote message"
                    );
                }
            }
            Command::Close { done } => {
                cache.close_all().await;
                let _ = done.send(());
            }
        }
    }

    cache.close_all().await;
    debug!("Remote sender stopped");
}
