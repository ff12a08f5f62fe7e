//! # Switchyard Wire Codec
//!
//! ## Purpose
//!
//! Encoding rules for messages that leave the process:
//! - Flat field maps (field name to scalar) built from any `Serialize` type
//! - The `WireRecord` carried in each transport frame
//!
//! ## What This Crate Does NOT Contain
//! - Network transport logic (belongs in `switchyard-network`)
//! - Knowledge of actors, references or the message registry
//!
//! ## Architecture Role
//!
//! ```text
//! actors → [codec] → network
//!   ↑         ↓         ↓
//! Message  FieldMap   Frames
//! ```

pub mod error;
pub mod fields;
pub mod record;

pub use error::{CodecError, CodecResult};
pub use fields::{decode_fields, encode_fields, FieldMap};
pub use record::WireRecord;
