//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::defaults::{
    default_bridge_name, default_database_path, default_link_aliases, default_metrics_port,
};
use super::linking::LinkingConfig;
use super::messages::MessagesConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bridge configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Bridge identity and process settings.
    #[serde(default)]
    pub bridge: BridgeConfig,
    /// Link persistence configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Linking flow configuration.
    #[serde(default)]
    pub linking: LinkingConfig,
    /// Command registration configuration.
    #[serde(default)]
    pub commands: CommandsConfig,
    /// User-facing messages.
    #[serde(default)]
    pub messages: MessagesConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Bridge identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Name used in logs and as the chat command namespace.
    #[serde(default = "default_bridge_name")]
    pub name: String,
    /// Prometheus metrics HTTP port (default: 9090). `0` disables the endpoint.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            name: default_bridge_name(),
            metrics_port: default_metrics_port(),
        }
    }
}

/// Which persistence backend holds the links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    /// Process-local, lost on restart.
    Memory,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// Path to SQLite database file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: default_database_path(),
        }
    }
}

/// Command registration configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandsConfig {
    /// Extra game-side labels for the `link` command.
    #[serde(default = "default_link_aliases")]
    pub link_aliases: Vec<String>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            link_aliases: default_link_aliases(),
        }
    }
}
