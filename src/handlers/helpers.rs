//! Argument resolution shared by combined commands.
//!
//! A player argument may be a UUID, the name of an online player, or a chat
//! account reference whose link points at a player. A user argument may be a
//! raw snowflake, a chat mention (`<@id>` / `<@!id>`), or a player reference
//! whose link points at a chat account.

use crate::error::CommandError;
use crate::linking::LinkProvider;
use crate::state::PlayerDirectory;
use uuid::Uuid;

/// Parse a chat account reference: `123`, `<@123>` or `<@!123>`.
pub fn parse_user_reference(value: &str) -> Option<u64> {
    let id = value
        .strip_prefix("<@")
        .and_then(|rest| rest.strip_suffix('>'))
        .map(|inner| inner.strip_prefix('!').unwrap_or(inner))
        .unwrap_or(value);
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    id.parse().ok()
}

/// Resolve a game account without consulting links.
fn direct_player(players: &dyn PlayerDirectory, value: &str) -> Option<Uuid> {
    Uuid::parse_str(value)
        .ok()
        .or_else(|| players.find_by_name(value).map(|p| p.id))
}

/// Resolve a player argument to a game account.
pub async fn lookup_player(
    provider: &dyn LinkProvider,
    players: &dyn PlayerDirectory,
    value: &str,
) -> Result<Uuid, CommandError> {
    if let Some(id) = direct_player(players, value) {
        return Ok(id);
    }
    if let Some(user_id) = parse_user_reference(value)
        && let Some(player_id) = provider.query_game_account(user_id).await?
    {
        return Ok(player_id);
    }
    Err(CommandError::ArgumentResolution {
        argument: "player",
        value: value.to_string(),
    })
}

/// Resolve a user argument to a chat account.
pub async fn lookup_user(
    provider: &dyn LinkProvider,
    players: &dyn PlayerDirectory,
    value: &str,
) -> Result<u64, CommandError> {
    if let Some(user_id) = parse_user_reference(value) {
        return Ok(user_id);
    }
    if let Some(player_id) = direct_player(players, value)
        && let Some(user_id) = provider.query_chat_account(player_id, false).await?
    {
        return Ok(user_id);
    }
    Err(CommandError::ArgumentResolution {
        argument: "user",
        value: value.to_string(),
    })
}
