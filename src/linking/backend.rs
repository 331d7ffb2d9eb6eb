//! Persistence backend contract for links and linking codes.

use crate::error::BackendError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Result of an atomic link insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Created,
    /// The exact pair already existed; nothing was written.
    AlreadyExists,
    /// One side is linked to a different counterpart; nothing was written.
    Conflict,
}

/// A pending self-service linking code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkingCode {
    pub code: String,
    pub player_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl LinkingCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Raw get/put operations over the authoritative link records.
///
/// `insert_link` must decide and write in one atomic step so that the
/// bijective invariant holds even across processes sharing the backend.
#[async_trait]
pub trait LinkBackend: Send + Sync {
    async fn get_user(&self, player_id: Uuid) -> Result<Option<u64>, BackendError>;

    async fn get_player(&self, user_id: u64) -> Result<Option<Uuid>, BackendError>;

    async fn insert_link(&self, player_id: Uuid, user_id: u64)
    -> Result<InsertOutcome, BackendError>;

    /// Delete the link for `player_id`, returning the chat account it held.
    async fn remove_link(&self, player_id: Uuid) -> Result<Option<u64>, BackendError>;

    async fn link_count(&self) -> Result<u64, BackendError>;

    /// Store `code`, replacing any earlier code of the same player.
    ///
    /// Returns `false` when the code string is held by another player's
    /// unexpired code.
    async fn put_linking_code(&self, code: &LinkingCode) -> Result<bool, BackendError>;

    /// The live (unexpired) code of `player_id`, if any.
    async fn linking_code_for(
        &self,
        player_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<LinkingCode>, BackendError>;

    /// Consume `code`. Expired or unknown codes yield `None`.
    async fn take_linking_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, BackendError>;

    /// Delete expired codes. Returns how many were removed.
    async fn prune_expired_codes(&self, now: DateTime<Utc>) -> Result<u64, BackendError>;
}
