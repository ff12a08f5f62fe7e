//! Network Infrastructure
//!
//! Point-to-point TCP transport for remote actor delivery:
//! - `Endpoint`: `tcp://host:port` addresses
//! - `FrameListener` / `InboundFrames`: one listener per process, frames from
//!   every peer merged into one stream
//! - `ConnectionCache`: lazily-opened outbound connections, one per endpoint
//!
//! Frames are opaque bytes here; the wire record lives in `switchyard-codec`.

pub mod endpoint;
pub mod error;
pub mod transports;

pub use endpoint::Endpoint;
pub use error::{Result, TransportError};
pub use transports::{
    ConnectionCache, FrameListener, InboundFrame, InboundFrames, TcpConnection,
    DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_LEN,
};
