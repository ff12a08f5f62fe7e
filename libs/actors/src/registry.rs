//! Message Registry
//!
//! Maps wire type names to constructors so the inbound side can rebuild a
//! message from a field map. Built during bootstrap, then shared read-only
//! behind an `Arc`.

use crate::messages::{AnyMessage, Message, Reject};
use crate::{ActorError, Result};
use std::collections::HashMap;
use std::fmt;
use switchyard_codec::{decode_fields, CodecResult, FieldMap};
use tracing::debug;

/// Rebuilds one message type from its field map
pub type Constructor = fn(FieldMap) -> CodecResult<AnyMessage>;

/// Type name to constructor table
#[derive(Clone)]
pub struct MessageRegistry {
    constructors: HashMap<String, Constructor>,
}

fn construct<M: Message>(fields: FieldMap) -> CodecResult<AnyMessage> {
    decode_fields::<M>(M::TYPE_NAME, fields).map(|message| Box::new(message) as AnyMessage)
}

impl MessageRegistry {
    /// Registry that already understands `Reject`, which the runtime itself sends
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<Reject>();
        registry
    }

    /// Registry with nothing in it
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register `M` under its own type name
    pub fn register<M: Message>(&mut self) -> &mut Self {
        self.register_as(M::TYPE_NAME, construct::<M>)
    }

    /// Register a constructor under an explicit wire name
    pub fn register_as(&mut self, type_name: impl Into<String>, constructor: Constructor) -> &mut Self {
        let type_name = type_name.into();
        if self.constructors.insert(type_name.clone(), constructor).is_some() {
            debug!(message_type = %type_name, "Replaced message constructor");
        }
        self
    }

    pub fn lookup(&self, type_name: &str) -> Option<Constructor> {
        self.constructors.get(type_name).copied()
    }

    /// Look up and run the constructor for `type_name`
    pub fn construct(&self, type_name: &str, fields: FieldMap) -> Result<AnyMessage> {
        let constructor = self
            .lookup(type_name)
            .ok_or_else(|| ActorError::unknown_message_type(type_name))?;
        Ok(constructor(fields)?)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Registered names, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for MessageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MessageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}
