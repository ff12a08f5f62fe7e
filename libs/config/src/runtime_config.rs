//! Runtime Configuration Module
//!
//! Loads actor runtime settings from built-in defaults, an optional TOML file
//! and `SWITCHYARD__SECTION__KEY` environment variables, in that order.

use crate::defaults;
use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SWITCHYARD";

/// Main runtime configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct RuntimeConfig {
    pub actors: ActorSettings,
    pub remote: RemoteSettings,
    pub logging: LoggingSettings,
}

/// Mailbox and lifecycle timing
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ActorSettings {
    pub mailbox_poll_ms: u64,
    pub run_poll_ms: u64,
    pub join_timeout_ms: u64,
}

/// Remote bridge settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RemoteSettings {
    /// Endpoint advertised to peers for replies, e.g. `tcp://localhost:5001`
    pub endpoint: Option<String>,
    /// Endpoint the inbound listener binds, e.g. `tcp://*:5001`
    pub bind: Option<String>,
    pub receiver_tick_ms: u64,
    pub connect_timeout_ms: u64,
    pub max_frame_bytes: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for ActorSettings {
    fn default() -> Self {
        Self {
            mailbox_poll_ms: defaults::actors::MAILBOX_POLL_MS,
            run_poll_ms: defaults::actors::RUN_POLL_MS,
            join_timeout_ms: defaults::actors::JOIN_TIMEOUT_MS,
        }
    }
}

impl ActorSettings {
    pub fn mailbox_poll(&self) -> Duration {
        Duration::from_millis(self.mailbox_poll_ms)
    }

    pub fn run_poll(&self) -> Duration {
        Duration::from_millis(self.run_poll_ms)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            bind: None,
            receiver_tick_ms: defaults::remote::RECEIVER_TICK_MS,
            connect_timeout_ms: defaults::remote::CONNECT_TIMEOUT_MS,
            max_frame_bytes: defaults::remote::MAX_FRAME_BYTES,
        }
    }
}

impl RemoteSettings {
    pub fn receiver_tick(&self) -> Duration {
        Duration::from_millis(self.receiver_tick_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::logging::LEVEL.to_string(),
            json: false,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from defaults, an optional file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(
            path,
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
    }

    fn load_with_env(path: Option<&Path>, environment: Environment) -> Result<Self> {
        let defaults = Config::try_from(&RuntimeConfig::default())
            .context("Failed to build default configuration")?;

        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = path {
            info!("Loading runtime config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        } else {
            debug!("No runtime config file, using defaults and environment");
        }

        builder = builder.add_source(environment);

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration as TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(Some(source))
    }

    #[test]
    fn test_defaults_without_file() {
        let config = RuntimeConfig::load_with_env(None, env(&[])).unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.actors.mailbox_poll(), Duration::from_millis(100));
        assert_eq!(config.actors.join_timeout(), Duration::from_secs(1));
        assert_eq!(config.remote.max_frame_bytes, 16 * 1024 * 1024);
        assert_eq!(config.remote.endpoint, None);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("switchyard.toml");

        let config_content = r#"
[actors]
join_timeout_ms = 250

[remote]
endpoint = "tcp://localhost:5001"
bind = "tcp://*:5001"

[logging]
level = "debug"
"#;

        fs::write(&config_path, config_content).unwrap();

        let config = RuntimeConfig::load_with_env(Some(&config_path), env(&[])).unwrap();

        assert_eq!(config.actors.join_timeout_ms, 250);
        assert_eq!(config.actors.mailbox_poll_ms, 100);
        assert_eq!(config.remote.endpoint.as_deref(), Some("tcp://localhost:5001"));
        assert_eq!(config.remote.bind.as_deref(), Some("tcp://*:5001"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_environment_override() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("switchyard.toml");
        fs::write(&config_path, "[actors]\nrun_poll_ms = 50\n").unwrap();

        let config = RuntimeConfig::load_with_env(
            Some(&config_path),
            env(&[
                ("SWITCHYARD__ACTORS__RUN_POLL_MS", "20"),
                ("SWITCHYARD__REMOTE__RECEIVER_TICK_MS", "5"),
            ]),
        )
        .unwrap();

        assert_eq!(config.actors.run_poll_ms, 20);
        assert_eq!(config.remote.receiver_tick(), Duration::from_millis(5));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(RuntimeConfig::load_with_env(Some(&missing), env(&[])).is_err());
    }

    #[test]
    fn test_toml_rendering_loads_back() {
        let mut config = RuntimeConfig::default();
        config.remote.endpoint = Some("tcp://localhost:5002".into());

        let dir = tempdir().unwrap();
        let path = dir.path().join("rendered.toml");
        fs::write(&path, config.to_toml().unwrap()).unwrap();

        let loaded = RuntimeConfig::load_with_env(Some(&path), env(&[])).unwrap();
        assert_eq!(loaded, config);
    }
}
