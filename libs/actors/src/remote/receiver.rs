//! Inbound remote delivery
//!
//! The receiver is an actor whose loop multiplexes the process's TCP
//! listener with its own control mailbox. Every decoded wire record goes
//! through [`InboundRouter`]:
//!
//! 1. target name not registered here: reject with "actor not found"
//! 2. type name not in the registry: reject with "unknown message type"
//! 3. constructor fails: reject with the decode error
//! 4. otherwise deliver, with a `RemoteRef` to the sender as sender
//!
//! A reject goes back only when the record named both a sender actor and a
//! sender endpoint. Rejects are fire-and-forget.

use crate::actor::{Actor, Context, Handlers};
use crate::actor_ref::{ActorAddress, ActorRef, LocalRef, RemoteRef};
use crate::mailbox::Envelope;
use crate::manager::Directory;
use crate::messages::{AnyMessage, Reject, Shutdown, Start};
use crate::registry::MessageRegistry;
use crate::remote::RemoteSender;
use crate::{ActorError, Result};
use std::sync::Arc;
use std::time::Duration;
use switchyard_codec::WireRecord;
use switchyard_config::RemoteSettings;
use switchyard_network::{Endpoint, FrameListener, InboundFrame};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

/// A resolved inbound message ready for a local mailbox
#[derive(Debug)]
pub struct Delivery {
    pub target: LocalRef,
    pub message: AnyMessage,
    pub sender: Option<ActorRef>,
}

/// Resolves wire records against local actors and the message registry
#[derive(Debug, Clone)]
pub struct InboundRouter {
    directory: Directory,
    registry: Arc<MessageRegistry>,
    sender: RemoteSender,
}

impl InboundRouter {
    pub fn new(directory: Directory, registry: Arc<MessageRegistry>, sender: RemoteSender) -> Self {
        Self {
            directory,
            registry,
            sender,
        }
    }

    /// Reference back to the record's sender, if it named one
    pub fn reply_ref(&self, record: &WireRecord) -> Option<RemoteRef> {
        let (actor, endpoint) = record.reply_address()?;
        match Endpoint::parse(endpoint) {
            Ok(endpoint) => Some(RemoteRef::new(actor, endpoint, self.sender.clone())),
            Err(e) => {
                warn!(sender_endpoint = endpoint, error = %e, "Ignoring unusable sender endpoint");
                None
            }
        }
    }

    /// Find the target and rebuild the message
    pub fn resolve(&self, record: WireRecord, reply_to: Option<RemoteRef>) -> Result<Delivery> {
        let target = self
            .directory
            .get(&record.receiver)
            .ok_or_else(|| ActorError::actor_not_found(&record.receiver))?;

        let message = self.registry.construct(&record.message_type, record.message)?;

        Ok(Delivery {
            target,
            message,
            sender: reply_to.map(ActorRef::Remote),
        })
    }

    /// Deliver the record locally or reject it back to its sender
    pub fn route(&self, record: WireRecord) {
        let reply_to = self.reply_ref(&record);
        let receiver = record.receiver.clone();
        let message_type = record.message_type.clone();

        match self.resolve(record, reply_to.clone()) {
            Ok(delivery) => {
                trace!(actor = %receiver, message_type = %message_type, "Deliver remote message");
                if let Err(e) = delivery.target.send_boxed(delivery.message, delivery.sender) {
                    warn!(actor = %receiver, error = %e, "Local delivery of remote message failed");
                }
            }
            Err(e) => {
                warn!(
                    actor = %receiver,
                    message_type = %message_type,
                    reason = %e,
                    category = e.category(),
                    "Undeliverable remote message"
                );

                let Some(reply_to) = reply_to else {
                    debug!(actor = %receiver, "No sender address, reject not sent");
                    return;
                };

                let reject = Reject {
                    message_type,
                    reason: e.to_string(),
                    rejected_by: receiver,
                };
                if let Err(e) = reply_to.send(reject, None) {
                    debug!(to = reply_to.name(), error = %e, "Reject could not be sent");
                }
            }
        }
    }
}

/// The process's inbound listener, run as an actor
pub struct RemoteReceiver {
    listener: Option<FrameListener>,
    local_endpoint: Endpoint,
    router: InboundRouter,
    tick: Duration,
}

impl RemoteReceiver {
    /// Bind `endpoint` now; accepting starts when the actor runs
    pub fn bind(
        endpoint: &Endpoint,
        directory: Directory,
        registry: Arc<MessageRegistry>,
        sender: RemoteSender,
        settings: &RemoteSettings,
    ) -> Result<Self> {
        let listener = FrameListener::bind(endpoint, settings.max_frame_bytes)?;
        let local_endpoint = listener.local_endpoint().clone();

        Ok(Self {
            listener: Some(listener),
            local_endpoint,
            router: InboundRouter::new(directory, registry, sender),
            tick: settings.receiver_tick().max(Duration::from_millis(1)),
        })
    }

    /// Address actually bound, with any ephemeral port resolved
    pub fn local_endpoint(&self) -> &Endpoint {
        &self.local_endpoint
    }

    pub fn router(&self) -> &InboundRouter {
        &self.router
    }

    fn on_start(&mut self, ctx: &Context, _envelope: Envelope<Start>) -> Result<()> {
        debug!(actor = ctx.name(), endpoint = %self.local_endpoint, "Remote receiver started");
        Ok(())
    }

    fn on_shutdown(&mut self, ctx: &Context, _envelope: Envelope<Shutdown>) -> Result<()> {
        info!(actor = ctx.name(), endpoint = %self.local_endpoint, "Remote receiver shutting down");
        ctx.stop();
        Ok(())
    }

    fn handle_frame(&self, frame: InboundFrame) {
        match WireRecord::decode(&frame.payload) {
            Ok(record) => self.router.route(record),
            Err(e) => warn!(peer = %frame.peer, error = %e, "Dropping undecodable frame"),
        }
    }

    async fn serve(&mut self, listener: FrameListener, ctx: &Context, handlers: &Handlers<Self>) -> Result<()> {
        let mut inbound = listener.start()?;
        let mut tick = tokio::time::interval(self.tick);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(actor = ctx.name(), endpoint = %inbound.local_endpoint(), "Remote receiver listening");

        while ctx.is_running() {
            tokio::select! {
                frame = inbound.recv() => match frame {
                    Some(frame) => self.handle_frame(frame),
                    None => break,
                },
                _ = tick.tick() => {}
            }

            while let Some(envelope) = ctx.try_next_envelope() {
                handlers.dispatch(self, ctx, envelope)?;
            }
        }

        Ok(())
    }
}

impl Actor for RemoteReceiver {
    fn handlers(handlers: &mut Handlers<Self>) {
        handlers
            .on::<Start, _>(Self::on_start)
            .on::<Shutdown, _>(Self::on_shutdown);
    }

    fn run(&mut self, ctx: &Context, handlers: &Handlers<Self>) -> Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| ActorError::configuration("remote receiver listener already consumed"))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ActorError::spawn("remote receiver runtime", e))?;

        self.init(ctx);
        runtime.block_on(self.serve(listener, ctx, handlers))?;
        self.end(ctx);
        Ok(())
    }
}
