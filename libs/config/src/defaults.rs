//! Default configuration values
//!
//! Used by `RuntimeConfig::default()` and by callers that never load a file.

/// Actor runtime defaults
pub mod actors {
    /// Bounded wait on an empty mailbox before re-checking the running flag (milliseconds)
    pub const MAILBOX_POLL_MS: u64 = 100;

    /// Manager run-loop poll of the termination flag (milliseconds)
    pub const RUN_POLL_MS: u64 = 100;

    /// Per-thread join deadline during shutdown (milliseconds)
    pub const JOIN_TIMEOUT_MS: u64 = 1_000;
}

/// Remote bridge defaults
pub mod remote {
    /// Receiver tick between control-mailbox checks (milliseconds)
    pub const RECEIVER_TICK_MS: u64 = 1;

    /// Outbound connect timeout (milliseconds)
    pub const CONNECT_TIMEOUT_MS: u64 = 5_000;

    /// Largest frame accepted or sent
    pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024; // 16MB
}

/// Logging defaults
pub mod logging {
    /// Filter used when RUST_LOG is not set
    pub const LEVEL: &str = "info";
}
