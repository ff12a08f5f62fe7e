//! # Switchyard Configuration
//!
//! Runtime settings for the actor runtime and its remote bridge, plus the
//! tracing subscriber setup shared by every process.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use switchyard_config::{init_logging, RuntimeConfig};
//!
//! let config = RuntimeConfig::load(None)?;
//! init_logging(&config.logging)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod defaults;
pub mod logging;
pub mod runtime_config;

// Re-export commonly used types
pub use logging::init_logging;
pub use runtime_config::{ActorSettings, LoggingSettings, RemoteSettings, RuntimeConfig, ENV_PREFIX};
