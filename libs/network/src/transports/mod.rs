//! TCP transport
//!
//! Framed connections, the inbound listener and the outbound connection
//! cache used by the remote actor bridge.

pub mod listener;
pub mod pool;
pub mod tcp;

pub use listener::{FrameListener, InboundFrame, InboundFrames};
pub use pool::ConnectionCache;
pub use tcp::{TcpConnection, DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_LEN};
