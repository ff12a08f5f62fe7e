//! Actor references
//!
//! `ActorRef` is the location-transparent address handed around by user
//! code. Its local variant feeds a mailbox in this process; its remote variant
//! serializes through the [`RemoteSender`] to another process's listener.
//!
//! Blocking round trips are only defined for local targets: `SyncAddress` is
//! implemented by `LocalRef` alone, and `ActorRef::fast_send` fails fast with
//! `UnsupportedOperation` on a remote target.

use crate::mailbox::{Envelope, ReplyChannel};
use crate::messages::{AnyMessage, Message};
use crate::remote::RemoteSender;
use crate::{ActorError, Result};
use crossbeam_channel::Sender;
use std::fmt;
use std::sync::Arc;
use switchyard_network::Endpoint;
use tracing::trace;

/// Anything messages can be sent to
pub trait ActorAddress {
    fn name(&self) -> &str;

    /// Fire-and-forget delivery of an already boxed message
    fn send_boxed(&self, message: AnyMessage, sender: Option<ActorRef>) -> Result<()>;

    /// Fire-and-forget delivery
    fn send<M: Message>(&self, message: M, sender: Option<ActorRef>) -> Result<()>
    where
        Self: Sized,
    {
        self.send_boxed(Box::new(message), sender)
    }
}

/// Addresses that support a blocking request/reply round trip
pub trait SyncAddress: ActorAddress {
    /// Enqueue and block until the handler replies. There is no timeout.
    fn fast_send_boxed(&self, message: AnyMessage, sender: Option<ActorRef>) -> Result<AnyMessage>;

    fn fast_send<M: Message>(&self, message: M, sender: Option<ActorRef>) -> Result<AnyMessage>
    where
        Self: Sized,
    {
        self.fast_send_boxed(Box::new(message), sender)
    }
}

/// Reference to an actor in this process
#[derive(Clone)]
pub struct LocalRef {
    name: Arc<str>,
    mailbox: Sender<Envelope>,
}

impl LocalRef {
    pub(crate) fn new(name: String, mailbox: Sender<Envelope>) -> Self {
        Self {
            name: name.into(),
            mailbox,
        }
    }

    /// Messages queued and not yet taken by the actor
    pub fn pending(&self) -> usize {
        self.mailbox.len()
    }

    fn enqueue(&self, envelope: Envelope) -> Result<()> {
        self.mailbox
            .send(envelope)
            .map_err(|_| ActorError::mailbox_closed(self.name.as_ref()))
    }
}

impl ActorAddress for LocalRef {
    fn name(&self) -> &str {
        &self.name
    }

    fn send_boxed(&self, message: AnyMessage, sender: Option<ActorRef>) -> Result<()> {
        trace!(actor = %self.name, message_type = message.type_name(), "Enqueue local message");
        self.enqueue(Envelope::new(message, sender))
    }
}

impl SyncAddress for LocalRef {
    fn fast_send_boxed(&self, message: AnyMessage, sender: Option<ActorRef>) -> Result<AnyMessage> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.enqueue(Envelope::with_reply(
            message,
            sender,
            ReplyChannel::new(tx.clone()),
        ))?;

        // Holding `tx` means an envelope dropped without a reply keeps the wait open
        let reply = rx.recv();
        drop(tx);

        reply.map_err(|_| ActorError::ReplyChannelClosed {
            actor: self.name.to_string(),
        })
    }
}

impl fmt::Debug for LocalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalRef").field("name", &self.name).finish()
    }
}

/// Reference to an actor behind another process's listener
#[derive(Clone)]
pub struct RemoteRef {
    name: Arc<str>,
    endpoint: Endpoint,
    sender: RemoteSender,
}

impl RemoteRef {
    pub fn new(name: impl Into<String>, endpoint: Endpoint, sender: RemoteSender) -> Self {
        Self {
            name: name.into().into(),
            endpoint,
            sender,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl ActorAddress for RemoteRef {
    fn name(&self) -> &str {
        &self.name
    }

    fn send_boxed(&self, message: AnyMessage, sender: Option<ActorRef>) -> Result<()> {
        self.sender
            .send_to(&self.endpoint, &self.name, message.as_ref(), sender.as_ref())
    }
}

impl fmt::Debug for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteRef")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Location-transparent actor reference
#[derive(Debug, Clone)]
pub enum ActorRef {
    Local(LocalRef),
    Remote(RemoteRef),
}

impl ActorRef {
    pub fn is_local(&self) -> bool {
        matches!(self, ActorRef::Local(_))
    }

    pub fn as_local(&self) -> Option<&LocalRef> {
        match self {
            ActorRef::Local(local) => Some(local),
            ActorRef::Remote(_) => None,
        }
    }

    pub fn as_remote(&self) -> Option<&RemoteRef> {
        match self {
            ActorRef::Remote(remote) => Some(remote),
            ActorRef::Local(_) => None,
        }
    }

    /// Endpoint of a remote target
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.as_remote().map(RemoteRef::endpoint)
    }

    /// Blocking round trip; only local targets can answer synchronously
    pub fn fast_send_boxed(&self, message: AnyMessage, sender: Option<ActorRef>) -> Result<AnyMessage> {
        match self {
            ActorRef::Local(local) => local.fast_send_boxed(message, sender),
            ActorRef::Remote(remote) => Err(ActorError::unsupported(
                "fast_send",
                format!("remote actor '{}' at {}", remote.name(), remote.endpoint()),
            )),
        }
    }

    pub fn fast_send<M: Message>(&self, message: M, sender: Option<ActorRef>) -> Result<AnyMessage> {
        self.fast_send_boxed(Box::new(message), sender)
    }
}

impl ActorAddress for ActorRef {
    fn name(&self) -> &str {
        match self {
            ActorRef::Local(local) => local.name(),
            ActorRef::Remote(remote) => remote.name(),
        }
    }

    fn send_boxed(&self, message: AnyMessage, sender: Option<ActorRef>) -> Result<()> {
        match self {
            ActorRef::Local(local) => local.send_boxed(message, sender),
            ActorRef::Remote(remote) => remote.send_boxed(message, sender),
        }
    }
}

impl From<LocalRef> for ActorRef {
    fn from(local: LocalRef) -> Self {
        ActorRef::Local(local)
    }
}

impl From<RemoteRef> for ActorRef {
    fn from(remote: RemoteRef) -> Self {
        ActorRef::Remote(remote)
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRef::Local(local) => write!(f, "{}", local.name()),
            ActorRef::Remote(remote) => write!(f, "{}@{}", remote.name(), remote.endpoint()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::mailbox;
    use crate::messages::{Start, Timeout};
    use std::thread;
    use std::time::Duration;
    use switchyard_config::RemoteSettings;

    #[test]
    fn test_local_send_is_immediate() {
        let (target, inbox) = mailbox("target");
        target.send(Start, None).unwrap();
        target.send(Timeout { id: 1 }, None).unwrap();

        assert_eq!(target.pending(), 2);
        assert!(inbox.try_recv().unwrap().message.is::<Start>());
        assert!(inbox.try_recv().unwrap().message.is::<Timeout>());
    }

    #[test]
    fn test_send_to_dropped_mailbox_fails() {
        let (target, inbox) = mailbox("gone");
        drop(inbox);

        let err = target.send(Start, None).unwrap_err();
        assert!(matches!(err, ActorError::MailboxClosed { .. }));
    }

    #[test]
    fn test_fast_send_returns_first_reply() {
        let (target, inbox) = mailbox("echo");
        let responder = thread::spawn(move || {
            let mut envelope = inbox.recv_timeout(Duration::from_secs(5)).unwrap();
            let reply = envelope.take_reply().unwrap();
            let id = envelope.message.downcast_ref::<Timeout>().unwrap().id;
            reply.send(Box::new(Timeout { id: id + 1 })).unwrap();
        });

        let reply = target.fast_send(Timeout { id: 41 }, None).unwrap();
        assert_eq!(reply.downcast::<Timeout>().unwrap(), Timeout { id: 42 });
        responder.join().unwrap();
    }

    #[test]
    fn test_remote_fast_send_fails_fast() {
        let sender = RemoteSender::new(None, &RemoteSettings::default()).unwrap();
        let remote = ActorRef::from(RemoteRef::new(
            "pong",
            Endpoint::new("127.0.0.1", 9),
            sender,
        ));

        let err = remote.fast_send(Start, None).unwrap_err();
        assert_eq!(err.category(), "unsupported_operation");
        assert_eq!(remote.to_string(), "pong@tcp://127.0.0.1:9");
        assert!(!remote.is_local());
    }
}
