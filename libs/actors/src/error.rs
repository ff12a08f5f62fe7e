//! Actor runtime errors

use switchyard_codec::CodecError;
use switchyard_network::TransportError;
use thiserror::Error;

/// Main actor runtime error type
#[derive(Error, Debug)]
pub enum ActorError {
    /// The reference variant cannot perform this operation
    #[error("{operation} is not supported by {target}")]
    UnsupportedOperation {
        operation: &'static str,
        target: String,
    },

    /// Target mailbox has no consumer any more
    #[error("mailbox of actor '{actor}' is closed")]
    MailboxClosed { actor: String },

    /// Reply channel ended without a reply
    #[error("reply channel of actor '{actor}' closed before a reply")]
    ReplyChannelClosed { actor: String },

    /// No actor registered under this name
    #[error("actor '{actor}' not found")]
    ActorNotFound { actor: String },

    /// Message type missing from the registry
    #[error("unknown message type '{message_type}'")]
    UnknownMessageType { message_type: String },

    /// Field map encoding or decoding failed
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Transport failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// OS thread or runtime could not be started
    #[error("failed to spawn {what}: {source}")]
    Spawn {
        what: String,
        source: std::io::Error,
    },

    /// Invalid settings
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Failure reported by an actor's own handler
    #[error("handler failed: {message}")]
    Handler { message: String },
}

/// Result type alias for actor operations
pub type Result<T> = std::result::Result<T, ActorError>;

impl ActorError {
    /// Create an unsupported operation error
    pub fn unsupported(operation: &'static str, target: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation,
            target: target.into(),
        }
    }

    /// Create a mailbox closed error
    pub fn mailbox_closed(actor: impl Into<String>) -> Self {
        Self::MailboxClosed {
            actor: actor.into(),
        }
    }

    /// Create an actor not found error
    pub fn actor_not_found(actor: impl Into<String>) -> Self {
        Self::ActorNotFound {
            actor: actor.into(),
        }
    }

    /// Create an unknown message type error
    pub fn unknown_message_type(message_type: impl Into<String>) -> Self {
        Self::UnknownMessageType {
            message_type: message_type.into(),
        }
    }

    /// Create a spawn error
    pub fn spawn(what: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            what: what.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a handler error
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ActorError::UnsupportedOperation { .. } => "unsupported_operation",
            ActorError::MailboxClosed { .. } => "mailbox_closed",
            ActorError::ReplyChannelClosed { .. } => "reply_channel_closed",
            ActorError::ActorNotFound { .. } => "actor_not_found",
            ActorError::UnknownMessageType { .. } => "unknown_message_type",
            ActorError::Codec(_) => "codec",
            ActorError::Transport(_) => "transport",
            ActorError::Spawn { .. } => "spawn",
            ActorError::Configuration { .. } => "configuration",
            ActorError::Handler { .. } => "handler",
        }
    }
}
