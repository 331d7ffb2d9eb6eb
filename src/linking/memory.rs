//! In-process link backend.
//!
//! Used for `backend = "memory"` and in tests. Every operation runs inside
//! one short `parking_lot` critical section, which makes `insert_link`
//! trivially atomic.

use super::Link;
use super::backend::{InsertOutcome, LinkBackend, LinkingCode};
use crate::error::BackendError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
    by_player: HashMap<Uuid, u64>,
    by_user: HashMap<u64, Uuid>,
    /// Keyed by code string.
    codes: HashMap<String, LinkingCode>,
}

/// Link backend held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every link, for invariant checks.
    pub fn links(&self) -> Vec<Link> {
        let state = self.state.lock();
        state
            .by_player
            .iter()
            .map(|(player_id, user_id)| Link {
                player_id: *player_id,
                user_id: *user_id,
            })
            .collect()
    }
}

#[async_trait]
impl LinkBackend for MemoryBackend {
    async fn get_user(&self, player_id: Uuid) -> Result<Option<u64>, BackendError> {
        Ok(self.state.lock().by_player.get(&player_id).copied())
    }

    async fn get_player(&self, user_id: u64) -> Result<Option<Uuid>, BackendError> {
        Ok(self.state.lock().by_user.get(&user_id).copied())
    }

    async fn insert_link(
        &self,
        player_id: Uuid,
        user_id: u64,
    ) -> Result<InsertOutcome, BackendError> {
        let mut state = self.state.lock();
        match (
            state.by_player.get(&player_id).copied(),
            state.by_user.get(&user_id).copied(),
        ) {
            (Some(existing), _) if existing == user_id => Ok(InsertOutcome::AlreadyExists),
            (Some(_), _) | (None, Some(_)) => Ok(InsertOutcome::Conflict),
            (None, None) => {
                state.by_player.insert(player_id, user_id);
                state.by_user.insert(user_id, player_id);
                Ok(InsertOutcome::Created)
            }
        }
    }

    async fn remove_link(&self, player_id: Uuid) -> Result<Option<u64>, BackendError> {
        let mut state = self.state.lock();
        let removed = state.by_player.remove(&player_id);
        if let Some(user_id) = removed {
            state.by_user.remove(&user_id);
        }
        Ok(removed)
    }

    async fn link_count(&self) -> Result<u64, BackendError> {
        Ok(self.state.lock().by_player.len() as u64)
    }

    async fn put_linking_code(&self, code: &LinkingCode) -> Result<bool, BackendError> {
        let mut state = self.state.lock();
        if let Some(existing) = state.codes.get(&code.code)
            && existing.player_id != code.player_id
            && !existing.is_expired(Utc::now())
        {
            return Ok(false);
        }
        state.codes.retain(|_, c| c.player_id != code.player_id);
        state.codes.insert(code.code.clone(), code.clone());
        Ok(true)
    }

    async fn linking_code_for(
        &self,
        player_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<LinkingCode>, BackendError> {
        let state = self.state.lock();
        Ok(state
            .codes
            .values()
            .find(|c| c.player_id == player_id && !c.is_expired(now))
            .cloned())
    }

    async fn take_linking_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, BackendError> {
        let mut state = self.state.lock();
        Ok(state
            .codes
            .remove(code)
            .filter(|c| !c.is_expired(now))
            .map(|c| c.player_id))
    }

    async fn prune_expired_codes(&self, now: DateTime<Utc>) -> Result<u64, BackendError> {
        let mut state = self.state.lock();
        let before = state.codes.len();
        state.codes.retain(|_, c| !c.is_expired(now));
        Ok((before - state.codes.len()) as u64)
    }
}
