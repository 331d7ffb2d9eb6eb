//! User-facing message strings.
//!
//! Placeholders (`%player%`, `%user%`, `%code%`, `%url%`, `%label%`,
//! `%target%`, `%command%`, `%minutes%`) are replaced literally by the caller.

use serde::Deserialize;

/// Messages sent back to the invoking surface.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    pub already_linked: String,
    pub please_wait: String,
    pub checking_link_status: String,
    pub unable_to_link: String,
    pub now_linked: String,
    pub no_permission: String,
    pub player_not_found: String,
    pub user_not_found: String,
    pub linking_unavailable: String,
    pub link_conflict: String,
    pub link_created: String,
    pub pair_already_linked: String,
    pub specify_player_and_user: String,
    pub unknown_command: String,
    pub linking_code: String,
    pub linking_url: String,
    pub linking_code_expiry: String,
    pub status_linked: String,
    pub status_unlinked: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            already_linked: "You are already linked.".into(),
            please_wait: "Please wait before running that command again.".into(),
            checking_link_status: "Checking your link status...".into(),
            unable_to_link: "Unable to link at this time, please try again later.".into(),
            now_linked: "You are now linked!".into(),
            no_permission: "You do not have permission to do that.".into(),
            player_not_found: "Player %player% could not be found.".into(),
            user_not_found: "User %user% could not be found.".into(),
            linking_unavailable: "Linking is not available on this server.".into(),
            link_conflict: "That account is already linked to someone else.".into(),
            link_created: "Linked %player% to %user%.".into(),
            pair_already_linked: "%player% is already linked to %user%.".into(),
            specify_player_and_user: "Please specify a player and a user to link.".into(),
            unknown_command: "Unknown command: %command%".into(),
            linking_code: "Your linking code is %code%. Enter it on the chat server to finish linking.".into(),
            linking_url: "Or visit %url%".into(),
            linking_code_expiry: "The code expires in %minutes% minutes.".into(),
            status_linked: "%target% is linked to %user%.".into(),
            status_unlinked: "%target% is not linked.".into(),
        }
    }
}
