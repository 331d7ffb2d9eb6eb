//! `linked` command: report link status.
//!
//! Without a target it reports the invoker's own link (their game account on
//! the game surface, their chat account on the chat surface). With a target
//! it needs `linkbridge.command.linked.other`.

use super::core::{CombinedCommand, CommandSchema, ExecutionContext, OptionKind, OptionSpec};
use super::helpers::parse_user_reference;
use crate::config::MessagesConfig;
use crate::error::{CommandError, CommandResult};
use crate::linking::LinkProvider;
use crate::state::{Permission, PlayerDirectory};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Whose link to report.
enum Subject {
    Player(Uuid),
    User(u64),
}

pub struct LinkedCommand {
    schema: CommandSchema,
    provider: Arc<dyn LinkProvider>,
    players: Arc<dyn PlayerDirectory>,
    messages: Arc<MessagesConfig>,
}

impl LinkedCommand {
    pub fn new(
        provider: Arc<dyn LinkProvider>,
        players: Arc<dyn PlayerDirectory>,
        messages: Arc<MessagesConfig>,
    ) -> Self {
        Self {
            schema: CommandSchema {
                name: "linked",
                description: "Check link status",
                permission: Permission::Linked,
                options: vec![
                    OptionSpec::optional(
                        "target",
                        OptionKind::String,
                        "A player name, UUID, or chat user",
                    )
                    .with_permission(Permission::LinkedOther),
                ],
                bare_game_invocation: false,
            },
            provider,
            players,
            messages,
        }
    }

    fn resolve_target(&self, value: &str) -> Result<Subject, CommandError> {
        if let Ok(id) = Uuid::parse_str(value) {
            return Ok(Subject::Player(id));
        }
        if let Some(player) = self.players.find_by_name(value) {
            return Ok(Subject::Player(player.id));
        }
        if let Some(user_id) = parse_user_reference(value) {
            return Ok(Subject::User(user_id));
        }
        Err(CommandError::ArgumentResolution {
            argument: "player",
            value: value.to_string(),
        })
    }

    fn player_label(&self, id: Uuid) -> String {
        self.players
            .find_by_id(&id)
            .map(|p| p.name)
            .unwrap_or_else(|| id.to_string())
    }
}

#[async_trait]
impl CombinedCommand for LinkedCommand {
    fn schema(&self) -> &CommandSchema {
        &self.schema
    }

    async fn execute(&self, ctx: &ExecutionContext) -> CommandResult {
        let (target, subject) = match ctx.argument("target") {
            Some(value) => {
                if !ctx.has_permission(Permission::LinkedOther) {
                    return Err(CommandError::Unauthorized);
                }
                (value.to_string(), self.resolve_target(value)?)
            }
            None => {
                let subject = match (ctx.player_id(), ctx.chat_user_id()) {
                    (Some(player_id), _) => Subject::Player(player_id),
                    (None, Some(user_id)) => Subject::User(user_id),
                    (None, None) => return Err(CommandError::MissingTarget),
                };
                (ctx.invoker_name().to_string(), subject)
            }
        };

        let counterpart = match subject {
            Subject::Player(player_id) => self
                .provider
                .query_chat_account(player_id, true)
                .await?
                .map(|user_id| user_id.to_string()),
            Subject::User(user_id) => self
                .provider
                .query_game_account(user_id)
                .await?
                .map(|player_id| self.player_label(player_id)),
        };

        let reply = match counterpart {
            Some(account) => self
                .messages
                .status_linked
                .replace("%target%", &target)
                .replace("%user%", &account),
            None => self.messages.status_unlinked.replace("%target%", &target),
        };
        ctx.send(&reply);
        Ok(())
    }
}
