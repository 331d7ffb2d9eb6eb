//! Declarative command schema and its two renderers.
//!
//! A command is declared once as a [`CommandSchema`]. The game front end
//! renders it into a tree of executable forms ([`CommandSchema::game_forms`]),
//! the chat front end into a slash-command definition
//! ([`CommandSchema::chat_definition`]). Both see the same option names, so
//! [`super::ExecutionContext::argument`] works identically on either surface.

use crate::state::Permission;
use serde::Serialize;

/// Primitive type of a declared option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    /// A chat account reference.
    User,
    /// A game account reference.
    Player,
}

/// Option type as the chat network understands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatOptionType {
    String,
    User,
}

impl OptionKind {
    pub fn chat_type(&self) -> ChatOptionType {
        match self {
            // the chat network has no notion of game accounts
            Self::String | Self::Player => ChatOptionType::String,
            Self::User => ChatOptionType::User,
        }
    }
}

/// One named argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: OptionKind,
    pub required: bool,
    /// Extra permission needed once this option is supplied.
    pub permission: Option<Permission>,
}

impl OptionSpec {
    pub fn required(name: &'static str, kind: OptionKind, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind,
            required: true,
            permission: None,
        }
    }

    pub fn optional(name: &'static str, kind: OptionKind, description: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = Some(permission);
        self
    }
}

/// Single declaration shared by both front ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub permission: Permission,
    pub options: Vec<OptionSpec>,
    /// The game surface also accepts the command with no arguments at all,
    /// even when options are declared required (e.g. a self-targeted form).
    pub bare_game_invocation: bool,
}

/// One executable node of the game command tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameForm<'a> {
    pub options: &'a [OptionSpec],
    /// Every permission on the path from the root to this node.
    pub permissions: Vec<Permission>,
}

impl GameForm<'_> {
    pub fn usage(&self, label: &str) -> String {
        let mut usage = format!("/{}", label);
        for option in self.options {
            usage.push_str(&format!(" <{}>", option.name));
        }
        usage
    }
}

/// Slash-command definition rendered for the chat network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatCommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub options: Vec<ChatOptionDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatOptionDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "type")]
    pub kind: ChatOptionType,
    pub required: bool,
}

impl CommandSchema {
    /// Positional depth `depth` of the game tree is executable when no
    /// required option remains after it.
    fn executable_at(&self, depth: usize) -> bool {
        if depth == 0 && self.bare_game_invocation {
            return true;
        }
        !self.options[depth..].iter().any(|o| o.required)
    }

    /// Executable game forms, shortest first.
    pub fn game_forms(&self) -> Vec<GameForm<'_>> {
        (0..=self.options.len())
            .filter(|&depth| self.executable_at(depth))
            .map(|depth| {
                let options = &self.options[..depth];
                let mut permissions = vec![self.permission];
                permissions.extend(options.iter().filter_map(|o| o.permission));
                GameForm {
                    options,
                    permissions,
                }
            })
            .collect()
    }

    /// The game form taking exactly `arity` positional arguments.
    pub fn game_form(&self, arity: usize) -> Option<GameForm<'_>> {
        self.game_forms()
            .into_iter()
            .find(|f| f.options.len() == arity)
    }

    /// Usage lines for `label`, one per executable form.
    pub fn game_usage(&self, label: &str) -> Vec<String> {
        self.game_forms().iter().map(|f| f.usage(label)).collect()
    }

    /// Permissions a chat invocation needs: the command's own plus those of
    /// every option the caller actually supplied.
    pub fn chat_permissions(&self, supplied: impl Fn(&str) -> bool) -> Vec<Permission> {
        let mut permissions = vec![self.permission];
        permissions.extend(
            self.options
                .iter()
                .filter(|o| supplied(o.name))
                .filter_map(|o| o.permission),
        );
        permissions
    }

    pub fn chat_definition(&self) -> ChatCommandDefinition {
        ChatCommandDefinition {
            name: self.name,
            description: self.description,
            options: self
                .options
                .iter()
                .map(|o| ChatOptionDefinition {
                    name: o.name,
                    description: o.description,
                    kind: o.kind.chat_type(),
                    required: o.required,
                })
                .collect(),
        }
    }
}
