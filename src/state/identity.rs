//! Invoker identities supplied by platform adapters.
//!
//! Both traits are implemented outside this crate. `send_message` may be
//! called from a tokio worker; adapters that need a specific thread must
//! marshal the message there themselves.

use super::Permission;
use uuid::Uuid;

/// Someone who ran a command on the game surface: a player or the console.
pub trait GameSender: Send + Sync {
    fn name(&self) -> &str;

    /// Stable game account id. `None` for the console and other non-players.
    fn player_id(&self) -> Option<Uuid>;

    fn has_permission(&self, permission: Permission) -> bool;

    fn send_message(&self, message: &str);
}

/// A chat-network user who ran a slash command.
pub trait ChatUser: Send + Sync {
    /// Snowflake id of the chat account.
    fn id(&self) -> u64;

    fn name(&self) -> &str;

    fn has_permission(&self, permission: Permission) -> bool;

    /// Reply to the interaction.
    fn send_message(&self, message: &str);
}
