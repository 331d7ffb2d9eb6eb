//! Execution context for combined commands.
//!
//! Each surface adapter turns its native invocation into one
//! [`ExecutionContext`]; command bodies never see which native API the
//! invocation came from except through [`ExecutionContext::surface`].

use crate::state::{ChatUser, GameSender, Permission};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// The front end a command was invoked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    Game,
    Chat,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::Chat => "chat",
        }
    }
}

/// A game-surface invocation: `/label arg arg`.
pub struct GameInvocation {
    pub sender: Arc<dyn GameSender>,
    /// The label actually typed, which may be an alias.
    pub label: String,
    pub arguments: HashMap<String, String>,
}

/// A chat-surface slash command invocation.
pub struct ChatInvocation {
    pub user: Arc<dyn ChatUser>,
    pub command: String,
    pub arguments: HashMap<String, String>,
}

/// One normalized command invocation.
pub enum ExecutionContext {
    Game(GameInvocation),
    Chat(ChatInvocation),
}

impl ExecutionContext {
    pub fn game(
        sender: Arc<dyn GameSender>,
        label: impl Into<String>,
        arguments: HashMap<String, String>,
    ) -> Self {
        Self::Game(GameInvocation {
            sender,
            label: label.into(),
            arguments,
        })
    }

    pub fn chat(
        user: Arc<dyn ChatUser>,
        command: impl Into<String>,
        arguments: HashMap<String, String>,
    ) -> Self {
        Self::Chat(ChatInvocation {
            user,
            command: command.into(),
            arguments,
        })
    }

    pub fn surface(&self) -> Surface {
        match self {
            Self::Game(_) => Surface::Game,
            Self::Chat(_) => Surface::Chat,
        }
    }

    /// Raw value of a named argument. Empty values count as absent.
    pub fn argument(&self, name: &str) -> Option<&str> {
        let arguments = match self {
            Self::Game(g) => &g.arguments,
            Self::Chat(c) => &c.arguments,
        };
        arguments
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Label to show in instructions (`/label code`).
    pub fn label(&self) -> &str {
        match self {
            Self::Game(g) => &g.label,
            Self::Chat(c) => &c.command,
        }
    }

    pub fn invoker_name(&self) -> &str {
        match self {
            Self::Game(g) => g.sender.name(),
            Self::Chat(c) => c.user.name(),
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        match self {
            Self::Game(g) => g.sender.has_permission(permission),
            Self::Chat(c) => c.user.has_permission(permission),
        }
    }

    /// Reply to whoever invoked the command.
    pub fn send(&self, message: &str) {
        match self {
            Self::Game(g) => g.sender.send_message(message),
            Self::Chat(c) => c.user.send_message(message),
        }
    }

    /// Game account of the invoker, if the invoker is an in-game player.
    pub fn player_id(&self) -> Option<Uuid> {
        match self {
            Self::Game(g) => g.sender.player_id(),
            Self::Chat(_) => None,
        }
    }

    /// Chat account of the invoker, if the command came from the chat network.
    pub fn chat_user_id(&self) -> Option<u64> {
        match self {
            Self::Game(_) => None,
            Self::Chat(c) => Some(c.user.id()),
        }
    }
}
