//! Unified error handling for linkbridge.
//!
//! Three layers:
//! - [`BackendError`]: raw persistence faults from a [`crate::linking::LinkBackend`].
//! - [`LinkError`]: what Link Provider / Link Store callers see.
//! - [`CommandError`]: what a combined command returns; the registry turns it
//!   into a reply on the invoking surface.

use crate::config::MessagesConfig;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Backend Errors (persistence)
// ============================================================================

/// Faults raised by a persistence backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

// ============================================================================
// Link Errors (provider / store operations)
// ============================================================================

/// Errors surfaced by Link Provider and Link Store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// The authoritative lookup could not complete. Recoverable.
    #[error("link lookup failed: {0}")]
    LookupFailure(String),

    /// One side of the requested pair is already linked to a different counterpart.
    #[error("player {player} or user {user} is already linked elsewhere")]
    Conflict { player: Uuid, user: u64 },

    /// The active provider does not support self-service linking.
    #[error("linking is not available with the current provider")]
    LinkingUnavailable,
}

impl LinkError {
    /// Static error code for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::LookupFailure(_) => "lookup_failure",
            Self::Conflict { .. } => "link_conflict",
            Self::LinkingUnavailable => "linking_unavailable",
        }
    }
}

impl From<BackendError> for LinkError {
    fn from(err: BackendError) -> Self {
        LinkError::LookupFailure(err.to_string())
    }
}

/// Result type for provider / store operations.
pub type LinkResult<T> = Result<T, LinkError>;

// ============================================================================
// Command Errors (combined command execution)
// ============================================================================

/// Errors a combined command may return.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("permission denied")]
    Unauthorized,

    /// An argument named a player or user that could not be resolved.
    #[error("could not resolve {argument} from {value:?}")]
    ArgumentResolution {
        argument: &'static str,
        value: String,
    },

    /// A console invoked a self-targeted form.
    #[error("no target specified")]
    MissingTarget,

    #[error("usage: {0}")]
    Usage(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error(transparent)]
    Link(#[from] LinkError),
}

impl CommandError {
    /// Static error code for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::ArgumentResolution { .. } => "argument_resolution",
            Self::MissingTarget => "missing_target",
            Self::Usage(_) => "usage",
            Self::UnknownCommand(_) => "unknown_command",
            Self::Link(e) => e.error_code(),
        }
    }

    /// Render the user-facing reply for this error.
    pub fn user_message(&self, messages: &MessagesConfig) -> String {
        match self {
            Self::Unauthorized => messages.no_permission.clone(),
            Self::ArgumentResolution { argument: "player", value } => {
                messages.player_not_found.replace("%player%", value)
            }
            Self::ArgumentResolution { value, .. } => messages.user_not_found.replace("%user%", value),
            Self::MissingTarget => messages.specify_player_and_user.clone(),
            Self::Usage(usage) => format!("Usage: {}", usage),
            Self::UnknownCommand(name) => messages.unknown_command.replace("%command%", name),
            Self::Link(LinkError::LookupFailure(_)) => messages.unable_to_link.clone(),
            Self::Link(LinkError::Conflict { .. }) => messages.link_conflict.clone(),
            Self::Link(LinkError::LinkingUnavailable) => messages.linking_unavailable.clone(),
        }
    }
}

/// Result type for combined commands.
pub type CommandResult = Result<(), CommandError>;
