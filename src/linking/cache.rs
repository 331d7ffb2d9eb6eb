//! Read-through cache in front of a [`LinkBackend`].

use super::backend::LinkBackend;
use crate::error::LinkResult;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
struct Entry<T> {
    value: T,
    stored_at: Instant,
}

impl<T> Entry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }
}

/// Bidirectional positive cache of known links.
///
/// Only confirmed links are cached; a miss always falls through to the
/// backend. Both maps are sharded, so concurrent command invocations never
/// need caller-side locking.
///
/// Read-through fills race with evictions: a backend read that started
/// before a link was removed can finish after it. Every eviction bumps a
/// generation counter, and a fill that observes a newer generation than the
/// one it started under is rolled back.
#[derive(Debug, Default)]
pub struct LinkCache {
    by_player: DashMap<Uuid, Entry<u64>>,
    by_user: DashMap<u64, Entry<Uuid>>,
    generation: AtomicU64,
    /// Entries older than this are treated as misses. `None` keeps them
    /// until evicted.
    ttl: Option<Duration>,
}

impl LinkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache whose entries expire, for views of a backend written elsewhere.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::default()
        }
    }

    fn fresh<T>(&self, entry: &Entry<T>) -> bool {
        self.ttl
            .is_none_or(|ttl| entry.stored_at.elapsed() < ttl)
    }

    pub fn chat_account(&self, player_id: &Uuid) -> Option<u64> {
        let found = self.by_player.get(player_id).map(|e| (e.value, self.fresh(e.value())));
        match found {
            Some((user_id, true)) => Some(user_id),
            Some((_, false)) => {
                self.by_player.remove_if(player_id, |_, e| !self.fresh(e));
                None
            }
            None => None,
        }
    }

    pub fn game_account(&self, user_id: &u64) -> Option<Uuid> {
        let found = self.by_user.get(user_id).map(|e| (e.value, self.fresh(e.value())));
        match found {
            Some((player_id, true)) => Some(player_id),
            Some((_, false)) => {
                self.by_user.remove_if(user_id, |_, e| !self.fresh(e));
                None
            }
            None => None,
        }
    }

    /// Record a confirmed link, evicting stale counterparts.
    pub fn insert(&self, player_id: Uuid, user_id: u64) {
        if let Some(previous) = self.by_player.insert(player_id, Entry::new(user_id))
            && previous.value != user_id
        {
            self.by_user
                .remove_if(&previous.value, |_, e| e.value == player_id);
        }
        if let Some(previous) = self.by_user.insert(user_id, Entry::new(player_id))
            && previous.value != player_id
        {
            self.by_player
                .remove_if(&previous.value, |_, e| e.value == user_id);
        }
    }

    /// Current eviction generation. Capture before a backend read.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Fill from a backend read that started at generation `seen`.
    ///
    /// Returns `false` if an eviction happened since and the fill was dropped.
    pub fn fill(&self, seen: u64, player_id: Uuid, user_id: u64) -> bool {
        self.insert(player_id, user_id);
        // Checked after the insert: an eviction either bumped the generation
        // before this load (we roll back) or removes our entry after it.
        if self.generation() == seen {
            return true;
        }
        debug!(player = %player_id, user = user_id, "dropping fill that raced an eviction");
        self.by_player.remove_if(&player_id, |_, e| e.value == user_id);
        self.by_user.remove_if(&user_id, |_, e| e.value == player_id);
        false
    }

    pub fn evict_player(&self, player_id: &Uuid) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some((_, entry)) = self.by_player.remove(player_id) {
            self.by_user.remove_if(&entry.value, |_, e| e.value == *player_id);
        }
    }

    pub fn evict_user(&self, user_id: &u64) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some((_, entry)) = self.by_user.remove(user_id) {
            self.by_player.remove_if(&entry.value, |_, e| e.value == *user_id);
        }
    }

    pub fn len(&self) -> usize {
        self.by_player.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_player.is_empty()
    }

    /// Chat -> game resolution: cache first, backend on miss.
    pub async fn query_game_account(
        &self,
        backend: &dyn LinkBackend,
        user_id: u64,
    ) -> LinkResult<Option<Uuid>> {
        if let Some(player_id) = self.game_account(&user_id) {
            return Ok(Some(player_id));
        }

        let seen = self.generation();
        let found = backend.get_player(user_id).await?;
        if let Some(player_id) = found {
            self.fill(seen, player_id, user_id);
        }
        Ok(found)
    }

    /// Game -> chat resolution.
    ///
    /// A passive query answers from cache when it can. An active query
    /// (`refresh`) always asks the backend and replaces the cached view,
    /// including dropping a link that no longer exists.
    pub async fn query_chat_account(
        &self,
        backend: &dyn LinkBackend,
        player_id: Uuid,
        refresh: bool,
    ) -> LinkResult<Option<u64>> {
        if !refresh && let Some(user_id) = self.chat_account(&player_id) {
            return Ok(Some(user_id));
        }

        let seen = self.generation();
        let found = backend.get_user(player_id).await?;
        match found {
            Some(user_id) => {
                self.fill(seen, player_id, user_id);
            }
            None if refresh => {
                debug!(player = %player_id, "refresh found no link, evicting cache entry");
                self.evict_player(&player_id);
            }
            None => {}
        }
        Ok(found)
    }
}
