//! Actor Core
//!
//! An actor is plain state plus a dispatch table. The manager gives it a
//! mailbox and a dedicated thread; the thread runs [`Actor::run`], which by
//! default is:
//!
//! 1. `init()` once
//! 2. while running: wait up to the mailbox poll interval, dispatch one envelope
//! 3. `end()` once
//!
//! Dispatch goes through [`Handlers`], filled once per actor type by
//! [`Actor::handlers`] and keyed by the message's `TypeId`. A message with no
//! registered handler is dropped.
//!
//! A handler returning `Err` (or panicking) ends the loop and the thread;
//! `end()` does not run and nothing restarts the actor.

use crate::actor_ref::{ActorAddress, ActorRef, LocalRef};
use crate::mailbox::{Envelope, Mailbox};
use crate::messages::Message;
use crate::Result;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// User-defined actor behaviour
pub trait Actor: Send + Sized + 'static {
    /// Register one handler per message type this actor understands
    fn handlers(handlers: &mut Handlers<Self>);

    fn init(&mut self, _ctx: &Context) {}

    fn end(&mut self, _ctx: &Context) {}

    /// The processing loop. Override only to multiplex other inputs.
    fn run(&mut self, ctx: &Context, handlers: &Handlers<Self>) -> Result<()> {
        self.init(ctx);

        while ctx.is_running() {
            if let Some(envelope) = ctx.next_envelope() {
                handlers.dispatch(self, ctx, envelope)?;
            }
        }

        self.end(ctx);
        Ok(())
    }
}

type HandlerFn<A> = Box<dyn Fn(&mut A, &Context, Envelope) -> Result<()> + Send>;

struct HandlerEntry<A> {
    type_name: &'static str,
    handler: HandlerFn<A>,
}

/// Per-actor-type dispatch table
pub struct Handlers<A> {
    table: HashMap<TypeId, HandlerEntry<A>>,
}

impl<A: Actor> Handlers<A> {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Table filled by `A::handlers`
    pub fn for_actor() -> Self {
        let mut handlers = Self::new();
        A::handlers(&mut handlers);
        handlers
    }

    /// Route messages of type `M` to `handler`. A later registration for the
    /// same type replaces the earlier one.
    pub fn on<M, F>(&mut self, handler: F) -> &mut Self
    where
        M: Message,
        F: Fn(&mut A, &Context, Envelope<M>) -> Result<()> + Send + 'static,
    {
        let erased: HandlerFn<A> = Box::new(
            move |actor: &mut A, ctx: &Context, envelope: Envelope| -> Result<()> {
                match envelope.downcast::<M>() {
                    Ok(envelope) => handler(actor, ctx, envelope),
                    Err(envelope) => {
                        warn!(
                            actor = ctx.name(),
                            expected = M::TYPE_NAME,
                            received = envelope.message.type_name(),
                            "Handler table entry does not match message type"
                        );
                        Ok(())
                    }
                }
            },
        );

        self.table.insert(
            TypeId::of::<M>(),
            HandlerEntry {
                type_name: M::TYPE_NAME,
                handler: erased,
            },
        );
        self
    }

    pub fn handles<M: Message>(&self) -> bool {
        self.table.contains_key(&TypeId::of::<M>())
    }

    /// Type names with a registered handler
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.table.values().map(|e| e.type_name).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Invoke the handler for this envelope's message type, if any
    pub fn dispatch(&self, actor: &mut A, ctx: &Context, envelope: Envelope) -> Result<()> {
        match self.table.get(&envelope.message.message_type_id()) {
            Some(entry) => (entry.handler)(actor, ctx, envelope),
            None => {
                trace!(
                    actor = ctx.name(),
                    message_type = envelope.message.type_name(),
                    "No handler registered, dropping message"
                );
                Ok(())
            }
        }
    }
}

impl<A: Actor> Default for Handlers<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// An actor's view of its own mailbox and lifecycle
#[derive(Debug)]
pub struct Context {
    myself: LocalRef,
    mailbox: Mailbox,
    running: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl Context {
    pub fn new(myself: LocalRef, mailbox: Mailbox, running: Arc<AtomicBool>, poll_interval: Duration) -> Self {
        Self {
            myself,
            mailbox,
            running,
            poll_interval,
        }
    }

    pub fn name(&self) -> &str {
        self.myself.name()
    }

    pub fn myself(&self) -> &LocalRef {
        &self.myself
    }

    /// Own reference, ready to pass as a sender
    pub fn myself_ref(&self) -> ActorRef {
        ActorRef::Local(self.myself.clone())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Leave the processing loop after the current wait slice
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Wait up to the poll interval for the next envelope
    pub fn next_envelope(&self) -> Option<Envelope> {
        self.mailbox.recv_timeout(self.poll_interval)
    }

    /// Next envelope only if one is already queued
    pub fn try_next_envelope(&self) -> Option<Envelope> {
        self.mailbox.try_recv()
    }

    /// Answer the envelope's originator.
    ///
    /// The reply channel wins if the envelope came from `fast_send`; otherwise
    /// the response goes to the sender with this actor as its sender;
    /// otherwise there is no one to answer and the response is dropped.
    pub fn reply<M, R: Message>(&self, envelope: &mut Envelope<M>, response: R) {
        if let Some(channel) = envelope.take_reply() {
            if channel.send(Box::new(response)).is_err() {
                debug!(actor = self.name(), "fast_send caller went away before the reply");
            }
            return;
        }

        match &envelope.sender {
            Some(sender) => {
                if let Err(e) = sender.send(response, Some(self.myself_ref())) {
                    warn!(
                        actor = self.name(),
                        to = %sender,
                        error = %e,
                        category = e.category(),
                        "Reply could not be delivered"
                    );
                }
            }
            None => {
                trace!(actor = self.name(), message_type = R::TYPE_NAME, "No one to reply to");
            }
        }
    }
}
