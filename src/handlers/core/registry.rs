//! Command registry and the two front-end adapters.
//!
//! Built once at start-up and shared behind an `Arc`. The game adapter parses
//! positional arguments against the schema's game tree and enforces the
//! path permissions before the command runs. The chat adapter takes named
//! options as delivered by the chat network and checks the same permissions:
//! the command's own plus those of each supplied option.

use super::context::ExecutionContext;
use super::schema::ChatCommandDefinition;
use super::traits::CombinedCommand;
use crate::config::MessagesConfig;
use crate::error::{CommandError, CommandResult};
use crate::state::{ChatUser, GameSender};
use crate::telemetry::CommandTimer;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, warn};

/// Registry of combined commands.
pub struct CommandRegistry {
    commands: HashMap<&'static str, Arc<dyn CombinedCommand>>,
    /// Extra game labels -> command name.
    aliases: HashMap<String, &'static str>,
    messages: Arc<MessagesConfig>,
}

impl CommandRegistry {
    pub fn new(messages: Arc<MessagesConfig>) -> Self {
        Self {
            commands: HashMap::new(),
            aliases: HashMap::new(),
            messages,
        }
    }

    pub fn register(&mut self, command: Arc<dyn CombinedCommand>) {
        let name = command.schema().name;
        if self.commands.insert(name, command).is_some() {
            warn!(command = name, "Command registered twice, keeping the last one");
        }
    }

    /// Add a game label for an already registered command.
    ///
    /// Returns `false` if `command` is unknown or the alias shadows a command name.
    pub fn alias(&mut self, alias: &str, command: &str) -> bool {
        let alias = alias.to_ascii_lowercase();
        if self.commands.contains_key(alias.as_str()) {
            return false;
        }
        let Some((&name, _)) = self.commands.get_key_value(command) else {
            return false;
        };
        self.aliases.insert(alias, name);
        true
    }

    /// Look up a command by name or game alias.
    pub fn resolve(&self, label: &str) -> Option<&Arc<dyn CombinedCommand>> {
        let label = label.to_ascii_lowercase();
        let name = self
            .aliases
            .get(&label)
            .copied()
            .unwrap_or(label.as_str());
        self.commands.get(name)
    }

    /// Game labels a command answers to: its name plus aliases.
    pub fn game_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.commands.keys().map(|n| n.to_string()).collect();
        labels.extend(self.aliases.keys().cloned());
        labels.sort();
        labels
    }

    /// Slash-command definitions to register with the chat network.
    pub fn chat_definitions(&self) -> Vec<ChatCommandDefinition> {
        let mut definitions: Vec<_> = self
            .commands
            .values()
            .map(|c| c.schema().chat_definition())
            .collect();
        definitions.sort_by_key(|d| d.name);
        definitions
    }

    /// Usage lines for a game label.
    pub fn game_usage(&self, label: &str) -> Option<Vec<String>> {
        self.resolve(label).map(|c| c.schema().game_usage(label))
    }

    /// Handle `/label raw_args` from the game surface.
    pub async fn dispatch_game(
        &self,
        sender: Arc<dyn GameSender>,
        label: &str,
        raw_args: &str,
    ) -> CommandResult {
        let Some(command) = self.resolve(label).cloned() else {
            let err = CommandError::UnknownCommand(label.to_string());
            sender.send_message(&err.user_message(&self.messages));
            crate::metrics::record_command_error(label, err.error_code());
            return Err(err);
        };
        let schema = command.schema();

        let values: Vec<&str> = raw_args.split_whitespace().collect();
        let gated = match schema.game_form(values.len()) {
            None => Err(CommandError::Usage(schema.game_usage(label).join(" | "))),
            Some(form) if !form.permissions.iter().all(|p| sender.has_permission(*p)) => {
                Err(CommandError::Unauthorized)
            }
            Some(form) => Ok(form
                .options
                .iter()
                .zip(values)
                .map(|(option, value)| (option.name.to_string(), value.to_string()))
                .collect::<HashMap<_, _>>()),
        };

        let arguments = match gated {
            Ok(arguments) => arguments,
            Err(err) => {
                sender.send_message(&err.user_message(&self.messages));
                crate::metrics::record_command_error(schema.name, err.error_code());
                debug!(command = schema.name, error = %err, "Rejected by game command tree");
                return Err(err);
            }
        };

        let ctx = ExecutionContext::game(sender, label, arguments);
        self.run(command.as_ref(), &ctx).await
    }

    /// Handle a slash command from the chat surface.
    pub async fn dispatch_chat(
        &self,
        user: Arc<dyn ChatUser>,
        name: &str,
        options: HashMap<String, String>,
    ) -> CommandResult {
        // aliases are a game-surface concept
        let Some(command) = self.commands.get(name).cloned() else {
            let err = CommandError::UnknownCommand(name.to_string());
            user.send_message(&err.user_message(&self.messages));
            crate::metrics::record_command_error(name, err.error_code());
            return Err(err);
        };

        let schema = command.schema();
        let required = schema.chat_permissions(|option| {
            // same rule as ExecutionContext::argument
            options.get(option).is_some_and(|value| !value.is_empty())
        });
        if !required.iter().all(|p| user.has_permission(*p)) {
            let err = CommandError::Unauthorized;
            user.send_message(&err.user_message(&self.messages));
            crate::metrics::record_command_error(schema.name, err.error_code());
            debug!(command = schema.name, error = %err, "Rejected by chat permission check");
            return Err(err);
        }

        let ctx = ExecutionContext::chat(user, name, options);
        self.run(command.as_ref(), &ctx).await
    }

    /// [`Self::dispatch_game`] on the worker pool. The caller only enqueues.
    pub fn spawn_game(
        self: &Arc<Self>,
        sender: Arc<dyn GameSender>,
        label: String,
        raw_args: String,
    ) -> JoinHandle<CommandResult> {
        let registry = Arc::clone(self);
        tokio::spawn(async move { registry.dispatch_game(sender, &label, &raw_args).await })
    }

    /// [`Self::dispatch_chat`] on the worker pool. The caller only enqueues.
    pub fn spawn_chat(
        self: &Arc<Self>,
        user: Arc<dyn ChatUser>,
        name: String,
        options: HashMap<String, String>,
    ) -> JoinHandle<CommandResult> {
        let registry = Arc::clone(self);
        tokio::spawn(async move { registry.dispatch_chat(user, &name, options).await })
    }

    async fn run(&self, command: &dyn CombinedCommand, ctx: &ExecutionContext) -> CommandResult {
        let name = command.schema().name;
        let surface = ctx.surface();
        crate::metrics::record_dispatch(name, surface.as_str());

        let span = crate::telemetry::spans::command(name, surface.as_str(), ctx.invoker_name());
        let _timer = CommandTimer::new(name);

        let result = command.execute(ctx).instrument(span).await;

        if let Err(ref err) = result {
            crate::metrics::record_command_error(name, err.error_code());
            match err {
                CommandError::Link(e) => {
                    warn!(command = name, surface = surface.as_str(), error = %e, "Link operation failed")
                }
                _ => debug!(command = name, error = %err, "Command error"),
            }
            ctx.send(&err.user_message(&self.messages));
        }

        result
    }
}
