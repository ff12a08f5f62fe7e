//! Switchyard Actor Runtime
//!
//! Thread-per-actor message passing with transparent cross-process delivery.
//! Local sends move boxed messages through an in-memory mailbox; messages
//! addressed to another process are flattened to a JSON field map and shipped
//! over a length-prefixed TCP stream.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────── process A ────────────────┐      ┌──────── process B ────────┐
//! │                                           │      │                           │
//! │  ┌─────────┐  LocalRef   ┌─────────────┐  │      │  ┌──────────────────────┐ │
//! │  │ ActorA  │────────────▶│ ActorB      │  │      │  │ RemoteReceiver       │ │
//! │  │ thread  │  Box<dyn>   │ thread      │  │      │  │ listener + registry  │ │
//! │  └─────────┘             └─────────────┘  │      │  └──────────┬───────────┘ │
//! │       │ RemoteRef                         │      │             │ LocalRef    │
//! │       ▼                                   │ TCP  │             ▼             │
//! │  ┌──────────────┐   JSON WireRecord       │      │  ┌──────────────────────┐ │
//! │  │ RemoteSender │─────────────────────────┼─────▶│  │ ActorC               │ │
//! │  └──────────────┘                         │      │  └──────────────────────┘ │
//! └───────────────────────────────────────────┘      └───────────────────────────┘
//! ```
//!
//! Unknown message types and unknown actors are answered with a
//! [`Reject`] sent back to the originator's endpoint.
//!
//! # Examples
//!
//! ```rust,no_run
//! use serde::{Deserialize, Serialize};
//! use switchyard::prelude::*;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Greet {
//!     name: String,
//! }
//! switchyard::impl_message!(Greet);
//!
//! struct Greeter;
//!
//! impl Greeter {
//!     fn on_greet(&mut self, ctx: &Context, envelope: Envelope<Greet>) -> Result<()> {
//!         tracing::info!(actor = ctx.name(), who = %envelope.message.name, "hello");
//!         Ok(())
//!     }
//! }
//!
//! impl Actor for Greeter {
//!     fn handlers(handlers: &mut Handlers<Self>) {
//!         handlers.on::<Greet, _>(Self::on_greet);
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let mut manager = Manager::new();
//!     let greeter = manager.manage("greeter", Greeter);
//!     manager.init()?;
//!     greeter.send(Greet { name: "world".into() }, None)?;
//!     manager.end();
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod actor_ref;
pub mod error;
pub mod mailbox;
pub mod manager;
pub mod messages;
pub mod registry;
pub mod remote;
pub mod timer;

pub use actor::{Actor, Context, Handlers};
pub use actor_ref::{ActorAddress, ActorRef, LocalRef, RemoteRef, SyncAddress};
pub use error::{ActorError, Result};
pub use mailbox::{mailbox, Envelope, Mailbox};
pub use manager::{Directory, Manager, ManagerHandle};
pub use messages::{AnyMessage, Message, Payload, Reject, Shutdown, Start, Timeout};
pub use registry::{Constructor, MessageRegistry};
pub use remote::{InboundRouter, RemoteReceiver, RemoteSender};
pub use timer::{Timer, TimerId, TimerIds};

pub use switchyard_config::RuntimeConfig;
pub use switchyard_network::Endpoint;

/// Everything an actor implementation usually needs
pub mod prelude {
    pub use crate::actor::{Actor, Context, Handlers};
    pub use crate::actor_ref::{ActorAddress, ActorRef, LocalRef, RemoteRef, SyncAddress};
    pub use crate::error::{ActorError, Result};
    pub use crate::mailbox::Envelope;
    pub use crate::manager::{Manager, ManagerHandle};
    pub use crate::messages::{Message, Reject, Shutdown, Start, Timeout};
    pub use crate::registry::MessageRegistry;
    pub use crate::timer::{Timer, TimerId};
    pub use switchyard_network::Endpoint;
}
