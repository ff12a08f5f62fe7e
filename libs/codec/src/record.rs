//! The remote wire record
//!
//! One record travels per frame. The sender fields let the receiving side
//! reconstruct a reference it can reply or reject to.

use crate::{CodecError, CodecResult, FieldMap};
use serde::{Deserialize, Serialize};

/// Serialized form of one remote delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRecord {
    pub sender_actor: Option<String>,
    pub sender_endpoint: Option<String>,
    pub receiver: String,
    pub message_type: String,
    pub message: FieldMap,
}

impl WireRecord {
    /// Encode the record as JSON bytes ready for framing
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CodecError::json("wire record", e))
    }

    /// Decode a record from one frame's payload
    pub fn decode(bytes: &[u8]) -> CodecResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::json("wire record", e))
    }

    /// Sender name and endpoint, if both are present and non-empty.
    ///
    /// Only then can the receiving side address anything back.
    pub fn reply_address(&self) -> Option<(&str, &str)> {
        match (self.sender_actor.as_deref(), self.sender_endpoint.as_deref()) {
            (Some(actor), Some(endpoint)) if !actor.is_empty() && !endpoint.is_empty() => {
                Some((actor, endpoint))
            }
            _ => None,
        }
    }
}
