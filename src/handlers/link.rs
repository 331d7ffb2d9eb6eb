//! `link` command.
//!
//! - `/link` (game, players only): start the self-service linking flow.
//! - `/link <player> <user>` (game) or `/link player:<p> user:<u>` (chat):
//!   link someone else. Needs `linkbridge.command.link.other` and a
//!   provider that is also a [`crate::linking::LinkStore`].

use super::core::{CombinedCommand, CommandSchema, ExecutionContext, OptionKind, OptionSpec};
use super::helpers::{lookup_player, lookup_user};
use crate::config::MessagesConfig;
use crate::error::{CommandError, CommandResult, LinkError};
use crate::linking::{LinkFlow, LinkProvider};
use crate::state::{Permission, PlayerDirectory};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub struct LinkCommand {
    schema: CommandSchema,
    provider: Arc<dyn LinkProvider>,
    flow: Arc<LinkFlow>,
    players: Arc<dyn PlayerDirectory>,
    messages: Arc<MessagesConfig>,
}

impl LinkCommand {
    pub fn new(
        provider: Arc<dyn LinkProvider>,
        flow: Arc<LinkFlow>,
        players: Arc<dyn PlayerDirectory>,
        messages: Arc<MessagesConfig>,
    ) -> Self {
        Self {
            schema: CommandSchema {
                name: "link",
                description: "Link players",
                permission: Permission::Link,
                options: vec![
                    OptionSpec::required("player", OptionKind::Player, "The player to link"),
                    OptionSpec::required("user", OptionKind::User, "The user to link")
                        .with_permission(Permission::LinkOther),
                ],
                bare_game_invocation: true,
            },
            provider,
            flow,
            players,
            messages,
        }
    }

    async fn link_other(&self, ctx: &ExecutionContext, player_arg: &str, user_arg: &str) -> CommandResult {
        let Some(store) = self.provider.as_store() else {
            return Err(LinkError::LinkingUnavailable.into());
        };

        let player_id = lookup_player(self.provider.as_ref(), self.players.as_ref(), player_arg).await?;
        let user_id = lookup_user(self.provider.as_ref(), self.players.as_ref(), user_arg).await?;

        let render = |template: &str| {
            template
                .replace("%player%", player_arg)
                .replace("%user%", user_arg)
        };

        match self.provider.query_chat_account(player_id, false).await? {
            Some(existing) if existing == user_id => {
                ctx.send(&render(&self.messages.pair_already_linked));
                return Ok(());
            }
            Some(existing) => {
                debug!(player = %player_id, existing, requested = user_id, "player already linked elsewhere");
                return Err(LinkError::Conflict {
                    player: player_id,
                    user: user_id,
                }
                .into());
            }
            None => {}
        }

        store.create_link(player_id, user_id).await?;
        ctx.send(&render(&self.messages.link_created));
        Ok(())
    }
}

#[async_trait]
impl CombinedCommand for LinkCommand {
    fn schema(&self) -> &CommandSchema {
        &self.schema
    }

    async fn execute(&self, ctx: &ExecutionContext) -> CommandResult {
        let player_arg = ctx.argument("player");
        let user_arg = ctx.argument("user");

        if player_arg.is_none() {
            // Self-service linking is a game-side flow for in-game players.
            return match ctx {
                ExecutionContext::Game(game) => match game.sender.player_id() {
                    Some(player_id) => {
                        self.flow
                            .start(game.sender.as_ref(), player_id, &game.label)
                            .await;
                        Ok(())
                    }
                    None => Err(CommandError::MissingTarget),
                },
                ExecutionContext::Chat(_) => Err(CommandError::MissingTarget),
            };
        }

        // The chat network's own permission layer may be looser than the game tree.
        if !ctx.has_permission(Permission::LinkOther) {
            return Err(CommandError::Unauthorized);
        }

        match (player_arg, user_arg) {
            (Some(player), Some(user)) => self.link_other(ctx, player, user).await,
            _ => Err(CommandError::MissingTarget),
        }
    }
}
