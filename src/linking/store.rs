//! Read-write Link Store over a persistence backend.

use super::backend::{InsertOutcome, LinkBackend, LinkingCode};
use super::cache::LinkCache;
use super::locks::KeyedLocks;
use super::{LinkProvider, LinkStore, LinkingInstructions};
use crate::error::{LinkError, LinkResult};
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Attempts at drawing an unused code before giving up.
const CODE_ATTEMPTS: usize = 8;

/// Self-service linking code parameters.
#[derive(Debug, Clone)]
pub struct CodeSettings {
    /// How long an issued code can be redeemed.
    pub expiry: Duration,
    /// Digits per code.
    pub length: usize,
    /// Optional web page included in the instructions.
    pub url: Option<String>,
}

impl Default for CodeSettings {
    fn default() -> Self {
        Self {
            expiry: Duration::from_secs(300),
            length: 6,
            url: None,
        }
    }
}

/// Link Store with a read-through cache and code-based linking.
///
/// `create_link` is serialized per game account and then per chat account
/// (always in that order), and the backend decides the insert atomically,
/// so two racing calls for the same key produce exactly one winner.
pub struct CachedLinkStore {
    backend: Arc<dyn LinkBackend>,
    cache: LinkCache,
    player_locks: KeyedLocks<Uuid>,
    user_locks: KeyedLocks<u64>,
    codes: CodeSettings,
}

impl CachedLinkStore {
    pub fn new(backend: Arc<dyn LinkBackend>, codes: CodeSettings) -> Self {
        Self {
            backend,
            cache: LinkCache::new(),
            player_locks: KeyedLocks::new(),
            user_locks: KeyedLocks::new(),
            codes,
        }
    }

    pub fn backend(&self) -> &Arc<dyn LinkBackend> {
        &self.backend
    }

    pub fn cache(&self) -> &LinkCache {
        &self.cache
    }

    /// Complete a self-service link from the chat side.
    ///
    /// Consumes `code` and links its player to `user_id`. Returns `Ok(None)`
    /// for unknown or expired codes.
    pub async fn redeem_code(&self, code: &str, user_id: u64) -> LinkResult<Option<Uuid>> {
        let code = code.trim();
        let Some(player_id) = self.backend.take_linking_code(code, Utc::now()).await? else {
            debug!(user = user_id, "unknown or expired linking code");
            return Ok(None);
        };

        self.create_link(player_id, user_id).await?;
        info!(player = %player_id, user = user_id, "linking code redeemed");
        Ok(Some(player_id))
    }

    /// Drop expired linking codes. Returns how many were removed.
    pub async fn prune_expired_codes(&self) -> LinkResult<u64> {
        Ok(self.backend.prune_expired_codes(Utc::now()).await?)
    }

    fn generate_code(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.codes.length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }

    fn instructions_for(&self, code: LinkingCode) -> LinkingInstructions {
        LinkingInstructions {
            code: Some(code.code),
            url: self.codes.url.clone(),
            expires_at: Some(code.expires_at),
        }
    }
}

#[async_trait]
impl LinkProvider for CachedLinkStore {
    async fn query_game_account(&self, user_id: u64) -> LinkResult<Option<Uuid>> {
        self.cache
            .query_game_account(self.backend.as_ref(), user_id)
            .await
    }

    async fn query_chat_account(
        &self,
        player_id: Uuid,
        can_cause_side_effects: bool,
    ) -> LinkResult<Option<u64>> {
        self.cache
            .query_chat_account(self.backend.as_ref(), player_id, can_cause_side_effects)
            .await
    }

    fn cached_chat_account(&self, player_id: &Uuid) -> Option<u64> {
        self.cache.chat_account(player_id)
    }

    async fn linking_instructions(
        &self,
        player_id: Uuid,
        player_name: &str,
        _label: &str,
    ) -> LinkResult<LinkingInstructions> {
        let now = Utc::now();
        if let Some(existing) = self.backend.linking_code_for(player_id, now).await? {
            debug!(player = %player_id, "reusing live linking code");
            return Ok(self.instructions_for(existing));
        }

        let expiry = chrono::Duration::from_std(self.codes.expiry)
            .map_err(|e| LinkError::LookupFailure(format!("invalid code expiry: {}", e)))?;

        for _ in 0..CODE_ATTEMPTS {
            let code = LinkingCode {
                code: self.generate_code(),
                player_id,
                expires_at: now + expiry,
            };
            if self.backend.put_linking_code(&code).await? {
                info!(player = %player_id, name = %player_name, "linking code issued");
                return Ok(self.instructions_for(code));
            }
        }

        warn!(player = %player_id, "could not draw an unused linking code");
        Err(LinkError::LookupFailure(
            "linking code space exhausted".to_string(),
        ))
    }

    fn as_store(&self) -> Option<&dyn LinkStore> {
        Some(self)
    }
}

#[async_trait]
impl LinkStore for CachedLinkStore {
    async fn create_link(&self, player_id: Uuid, user_id: u64) -> LinkResult<()> {
        let player_guard = self.player_locks.lock(&player_id).await;
        let user_guard = self.user_locks.lock(&user_id).await;

        let outcome = self.backend.insert_link(player_id, user_id).await;

        drop(user_guard);
        drop(player_guard);
        self.user_locks.release(&user_id);
        self.player_locks.release(&player_id);

        match outcome? {
            InsertOutcome::Created => {
                self.cache.insert(player_id, user_id);
                crate::metrics::record_link_created();
                info!(player = %player_id, user = user_id, "link created");
                Ok(())
            }
            InsertOutcome::AlreadyExists => {
                self.cache.insert(player_id, user_id);
                debug!(player = %player_id, user = user_id, "link already present");
                Ok(())
            }
            InsertOutcome::Conflict => {
                crate::metrics::record_link_conflict();
                warn!(player = %player_id, user = user_id, "link refused: one side already linked");
                Err(LinkError::Conflict {
                    player: player_id,
                    user: user_id,
                })
            }
        }
    }

    async fn remove_link(&self, player_id: Uuid) -> LinkResult<Option<u64>> {
        let player_guard = self.player_locks.lock(&player_id).await;
        let removed = self.backend.remove_link(player_id).await;
        drop(player_guard);
        self.player_locks.release(&player_id);

        let removed = removed?;
        self.cache.evict_player(&player_id);
        if let Some(user_id) = removed {
            self.cache.evict_user(&user_id);
            info!(player = %player_id, user = user_id, "link removed");
        }
        Ok(removed)
    }
}
