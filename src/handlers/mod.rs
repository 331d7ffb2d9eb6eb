//! Combined command handlers.
//!
//! Each command is declared once and served on both the game surface and
//! the chat surface through [`CommandRegistry`].

pub mod core;
pub mod helpers;
mod link;
mod linked;

pub use self::core::{
    ChatCommandDefinition, CombinedCommand, CommandRegistry, CommandSchema, ExecutionContext,
    OptionKind, OptionSpec, Surface,
};
pub use link::LinkCommand;
pub use linked::LinkedCommand;

use crate::config::MessagesConfig;
use crate::linking::{LinkFlow, LinkProvider};
use crate::state::PlayerDirectory;
use std::sync::Arc;
use tracing::warn;

/// Build the registry with every built-in command.
///
/// `link_aliases` become extra game labels for `link`.
pub fn build_registry(
    provider: Arc<dyn LinkProvider>,
    flow: Arc<LinkFlow>,
    players: Arc<dyn PlayerDirectory>,
    messages: Arc<MessagesConfig>,
    link_aliases: &[String],
) -> CommandRegistry {
    let mut registry = CommandRegistry::new(Arc::clone(&messages));

    registry.register(Arc::new(LinkCommand::new(
        Arc::clone(&provider),
        flow,
        Arc::clone(&players),
        Arc::clone(&messages),
    )));
    registry.register(Arc::new(LinkedCommand::new(provider, players, messages)));

    for alias in link_aliases {
        if !registry.alias(alias, "link") {
            warn!(alias = %alias, "Ignoring link alias that shadows a command");
        }
    }

    registry
}
