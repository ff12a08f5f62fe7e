//! Actor Messages
//!
//! Every message is a plain serde type with a stable type name. Local
//! delivery moves the value itself through the mailbox; only remote delivery
//! turns it into a flat field map keyed by that name.
//!
//! `Payload` is the object-safe view used once a message is boxed into an
//! envelope. Handlers get the concrete type back through `TypeId` dispatch.

use crate::timer::TimerId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::fmt;
use switchyard_codec::{encode_fields, CodecResult, FieldMap};

/// A message that can be sent to any actor, local or remote
pub trait Message: Serialize + DeserializeOwned + fmt::Debug + Send + 'static {
    /// Name carried on the wire and used for registry lookup
    const TYPE_NAME: &'static str;
}

/// Implement [`Message`] using each type's own name as its wire name
#[macro_export]
macro_rules! impl_message {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl $crate::Message for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);
            }
        )+
    };
}

/// Type-erased message
pub trait Payload: Any + Send + fmt::Debug {
    fn type_name(&self) -> &'static str;

    /// Flat field map for the wire
    fn to_fields(&self) -> CodecResult<FieldMap>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<M: Message> Payload for M {
    fn type_name(&self) -> &'static str {
        M::TYPE_NAME
    }

    fn to_fields(&self) -> CodecResult<FieldMap> {
        encode_fields(M::TYPE_NAME, self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// Boxed message as carried by envelopes
pub type AnyMessage = Box<dyn Payload>;

impl dyn Payload {
    /// `TypeId` of the concrete message
    pub fn message_type_id(&self) -> TypeId {
        self.as_any().type_id()
    }

    pub fn is<M: Message>(&self) -> bool {
        self.as_any().is::<M>()
    }

    pub fn downcast_ref<M: Message>(&self) -> Option<&M> {
        self.as_any().downcast_ref::<M>()
    }

    /// Recover the concrete message, or get the box back unchanged
    pub fn downcast<M: Message>(self: Box<Self>) -> Result<M, Box<Self>> {
        if !self.is::<M>() {
            return Err(self);
        }
        match self.into_any().downcast::<M>() {
            Ok(message) => Ok(*message),
            Err(_) => unreachable!("type checked before downcast"),
        }
    }
}

/// Sent by the manager once an actor's thread is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Start;

/// Sent by the manager when the system is shutting down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shutdown;

/// Injected by a timer each time it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeout {
    pub id: TimerId,
}

/// Returned to a remote sender whose message could not be delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reject {
    pub message_type: String,
    pub reason: String,
    pub rejected_by: String,
}

impl_message!(Start, Shutdown, Timeout, Reject);
