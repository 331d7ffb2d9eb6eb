//! Read-only Link Provider.

use super::backend::LinkBackend;
use super::cache::LinkCache;
use super::{LinkProvider, LinkingInstructions};
use crate::error::{LinkError, LinkResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// How long an observed link is trusted before the backend is asked again.
const DEFAULT_MIRROR_CACHE_TTL: Duration = Duration::from_secs(60);

/// Resolves links from a backend it does not own.
///
/// Offers no self-service linking and no store capability; links are
/// created elsewhere and only observed here. The owning writer never tells
/// this provider about removals, so cached links expire after a TTL.
pub struct MirrorLinkProvider {
    backend: Arc<dyn LinkBackend>,
    cache: LinkCache,
}

impl MirrorLinkProvider {
    pub fn new(backend: Arc<dyn LinkBackend>) -> Self {
        Self::with_cache_ttl(backend, DEFAULT_MIRROR_CACHE_TTL)
    }

    pub fn with_cache_ttl(backend: Arc<dyn LinkBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            cache: LinkCache::with_ttl(ttl),
        }
    }
}

#[async_trait]
impl LinkProvider for MirrorLinkProvider {
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
        _player_id: Uuid,
        _player_name: &str,
        _label: &str,
    ) -> LinkResult<LinkingInstructions> {
        Err(LinkError::LinkingUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linking::MemoryBackend;

    #[tokio::test]
    async fn test_mirror_is_read_only() {
        let backend = Arc::new(MemoryBackend::new());
        let player = Uuid::new_v4();
        backend.insert_link(player, 77).await.unwrap();

        let mirror = MirrorLinkProvider::new(backend);
        assert!(mirror.as_store().is_none());
        assert_eq!(mirror.query_game_account(77).await.unwrap(), Some(player));
        assert_eq!(mirror.cached_chat_account(&player), Some(77));
        assert_eq!(
            mirror.linking_instructions(player, "Alex", "link").await,
            Err(LinkError::LinkingUnavailable)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_removal_by_owner_is_seen_after_ttl() {
        let backend = Arc::new(MemoryBackend::new());
        let player = Uuid::new_v4();
        backend.insert_link(player, 12).await.unwrap();

        let mirror = MirrorLinkProvider::with_cache_ttl(backend.clone(), Duration::from_secs(10));
        assert_eq!(mirror.query_chat_account(player, false).await.unwrap(), Some(12));

        // removed by the owning writer, behind the mirror's back
        backend.remove_link(player).await.unwrap();
        assert_eq!(mirror.cached_chat_account(&player), Some(12));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(mirror.cached_chat_account(&player), None);
        assert_eq!(mirror.query_chat_account(player, false).await.unwrap(), None);
        assert_eq!(mirror.query_game_account(12).await.unwrap(), None);
    }
}
