//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, BridgeConfig, DatabaseConfig)
//! - [`linking`]: Linking code and cooldown configuration (LinkingConfig)
//! - [`messages`]: User-facing message strings (MessagesConfig)
//! - [`validation`]: Start-up validation of a loaded config

mod defaults;
mod linking;
mod messages;
mod types;
pub mod validation;

pub use linking::LinkingConfig;
pub use messages::MessagesConfig;
pub use types::{BackendKind, BridgeConfig, CommandsConfig, Config, ConfigError, DatabaseConfig};
pub use validation::{ValidationError, validate};
