//! Codec-level errors for field maps and wire records
//!
//! Each variant names the message type or field involved so a rejected
//! payload can be reported back to its sender with a readable reason.

use thiserror::Error;

/// Errors produced while turning messages into field maps and back
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON encoding or decoding failed
    #[error("JSON error for {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Message did not serialize to a JSON object (or unit)
    #[error("Message type '{type_name}' must serialize to a flat object, got {found}")]
    NotAnObject {
        type_name: String,
        found: &'static str,
    },

    /// Field value is an array or object, which the wire format cannot carry
    #[error("Field '{field}' of message type '{type_name}' is not a scalar")]
    NestedField { type_name: String, field: String },
}

/// Result type alias for codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;

impl CodecError {
    /// Create a JSON error with the context it happened in
    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            CodecError::Json { .. } => "json",
            CodecError::NotAnObject { .. } => "not_an_object",
            CodecError::NestedField { .. } => "nested_field",
        }
    }
}
