//! Mailboxes and envelopes
//!
//! A mailbox is an unbounded FIFO with exactly one consumer: the owning
//! actor's thread. Producers hold a [`LocalRef`].

use crate::actor_ref::{ActorRef, LocalRef};
use crate::messages::{AnyMessage, Message};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::fmt;
use std::time::Duration;

/// Single-use channel carrying the reply to a `fast_send`
pub struct ReplyChannel {
    tx: Sender<AnyMessage>,
}

impl ReplyChannel {
    pub(crate) fn new(tx: Sender<AnyMessage>) -> Self {
        Self { tx }
    }

    /// Deliver the reply. Fails only if the waiting caller is gone.
    pub(crate) fn send(self, reply: AnyMessage) -> std::result::Result<(), AnyMessage> {
        self.tx.send(reply).map_err(|e| e.into_inner())
    }
}

impl fmt::Debug for ReplyChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ReplyChannel")
    }
}

/// A message plus its optional sender and reply channel
#[derive(Debug)]
pub struct Envelope<M = AnyMessage> {
    pub message: M,
    pub sender: Option<ActorRef>,
    reply: Option<ReplyChannel>,
}

impl<M> Envelope<M> {
    pub fn new(message: M, sender: Option<ActorRef>) -> Self {
        Self {
            message,
            sender,
            reply: None,
        }
    }

    pub(crate) fn with_reply(message: M, sender: Option<ActorRef>, reply: ReplyChannel) -> Self {
        Self {
            message,
            sender,
            reply: Some(reply),
        }
    }

    /// True until the reply channel has been used
    pub fn has_reply_channel(&self) -> bool {
        self.reply.is_some()
    }

    pub(crate) fn take_reply(&mut self) -> Option<ReplyChannel> {
        self.reply.take()
    }
}

impl Envelope {
    /// Typed view of the envelope, or the envelope back if the type differs
    pub fn downcast<M: Message>(self) -> std::result::Result<Envelope<M>, Envelope> {
        let Envelope {
            message,
            sender,
            reply,
        } = self;

        match message.downcast::<M>() {
            Ok(message) => Ok(Envelope {
                message,
                sender,
                reply,
            }),
            Err(message) => Err(Envelope {
                message,
                sender,
                reply,
            }),
        }
    }
}

/// Consumer side of a mailbox
#[derive(Debug)]
pub struct Mailbox {
    name: String,
    inbox: Receiver<Envelope>,
}

/// Create a mailbox and the local reference that feeds it
pub fn mailbox(name: impl Into<String>) -> (LocalRef, Mailbox) {
    let name = name.into();
    let (tx, rx) = crossbeam_channel::unbounded();
    (LocalRef::new(name.clone(), tx), Mailbox { name, inbox: rx })
}

impl Mailbox {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait up to `timeout` for the next envelope
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Envelope> {
        match self.inbox.recv_timeout(timeout) {
            Ok(envelope) => Some(envelope),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                // No producers left; keep the caller's poll cadence
                std::thread::sleep(timeout);
                None
            }
        }
    }

    /// Next envelope if one is already queued
    pub fn try_recv(&self) -> Option<Envelope> {
        self.inbox.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.inbox.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inbox.is_empty()
    }
}
