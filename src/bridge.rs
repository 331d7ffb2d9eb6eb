//! The assembled bridge.
//!
//! [`Bridge`] is the embedding entry point: a platform adapter builds one
//! from its [`Config`], forwards player joins and quits to
//! [`Bridge::players`], and hands incoming commands from either surface to
//! [`Bridge::registry`]. The `linkbridged` binary builds the same thing and
//! only runs its maintenance.

use crate::config::{BackendKind, Config};
use crate::db::{Database, DbError};
use crate::handlers::{self, CommandRegistry};
use crate::linking::{
    CachedLinkStore, CodeSettings, LinkBackend, LinkFlow, LinkProvider, MemoryBackend,
    MirrorLinkProvider,
};
use crate::security::ExpiringRateLimiter;
use crate::state::{PlayerDirectory, PlayerRegistry};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct Bridge {
    pub backend: Arc<dyn LinkBackend>,
    pub provider: Arc<dyn LinkProvider>,
    /// Typed handle on the provider when it is a read-write store.
    pub store: Option<Arc<CachedLinkStore>>,
    pub limiter: Arc<ExpiringRateLimiter<Uuid>>,
    pub flow: Arc<LinkFlow>,
    pub players: Arc<PlayerRegistry>,
    pub registry: Arc<CommandRegistry>,
}

impl Bridge {
    /// Open the configured backend and wire everything on top of it.
    pub async fn open(config: &Config) -> Result<Self, DbError> {
        let backend: Arc<dyn LinkBackend> = match config.database.backend {
            BackendKind::Sqlite => Arc::new(Database::new(&config.database.path).await?),
            BackendKind::Memory => {
                warn!("Using in-memory backend; links are lost on shutdown");
                Arc::new(MemoryBackend::new())
            }
        };
        Ok(Self::with_backend(config, backend))
    }

    pub fn with_backend(config: &Config, backend: Arc<dyn LinkBackend>) -> Self {
        let linking = &config.linking;
        let store = if linking.read_only {
            info!("Link provider is read-only");
            None
        } else {
            Some(Arc::new(CachedLinkStore::new(
                Arc::clone(&backend),
                CodeSettings {
                    expiry: linking.code_expiry(),
                    length: linking.code_length,
                    url: linking.link_url.clone(),
                },
            )))
        };
        let provider: Arc<dyn LinkProvider> = match &store {
            Some(store) => Arc::clone(store) as Arc<dyn LinkProvider>,
            None => Arc::new(MirrorLinkProvider::with_cache_ttl(
                Arc::clone(&backend),
                linking.mirror_cache_ttl(),
            )),
        };

        let messages = Arc::new(config.messages.clone());
        let limiter = Arc::new(ExpiringRateLimiter::new(linking.code_rate_limit()));
        let flow = Arc::new(LinkFlow::new(
            Arc::clone(&provider),
            Arc::clone(&limiter),
            Arc::clone(&messages),
        ));
        let players = Arc::new(PlayerRegistry::new());
        let registry = Arc::new(handlers::build_registry(
            Arc::clone(&provider),
            Arc::clone(&flow),
            Arc::clone(&players) as Arc<dyn PlayerDirectory>,
            messages,
            &config.commands.link_aliases,
        ));

        Self {
            backend,
            provider,
            store,
            limiter,
            flow,
            players,
            registry,
        }
    }

    /// Drop expired cooldowns and linking codes.
    ///
    /// Returns `(cooldowns, codes)` removed. A failed code sweep is logged
    /// and counted as zero.
    pub async fn prune_expired(&self) -> (usize, u64) {
        let cooldowns = self.limiter.prune_expired();
        let codes = match &self.store {
            Some(store) => store.prune_expired_codes().await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to prune linking codes");
                0
            }),
            None => 0,
        };
        (cooldowns, codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MessagesConfig;
    use crate::state::{GameSender, Permission};
    use parking_lot::Mutex;

    struct Player {
        id: Uuid,
        inbox: Mutex<Vec<String>>,
    }

    impl GameSender for Player {
        fn name(&self) -> &str {
            "Steve"
        }

        fn player_id(&self) -> Option<Uuid> {
            Some(self.id)
        }

        fn has_permission(&self, _permission: Permission) -> bool {
            true
        }

        fn send_message(&self, message: &str) {
            self.inbox.lock().push(message.to_string());
        }
    }

    fn memory_config() -> Config {
        let mut config = Config::default();
        config.database.backend = BackendKind::Memory;
        config
    }

    #[tokio::test]
    async fn test_open_wires_registry() {
        let bridge = Bridge::open(&memory_config()).await.unwrap();

        assert!(bridge.store.is_some());
        assert!(bridge.provider.as_store().is_some());
        assert_eq!(bridge.registry.game_labels(), vec!["discord", "link", "linked"]);
    }

    #[tokio::test]
    async fn test_read_only_uses_mirror() {
        let mut config = memory_config();
        config.linking.read_only = true;
        let bridge = Bridge::with_backend(&config, Arc::new(MemoryBackend::new()));

        assert!(bridge.store.is_none());
        assert!(bridge.provider.as_store().is_none());
    }

    #[tokio::test]
    async fn test_game_command_reaches_flow() {
        let bridge = Bridge::open(&memory_config()).await.unwrap();
        let player = Arc::new(Player {
            id: Uuid::new_v4(),
            inbox: Mutex::new(Vec::new()),
        });
        bridge.players.join(player.id, "Steve");

        bridge
            .registry
            .dispatch_game(player.clone(), "discord", "")
            .await
            .unwrap();

        assert!(bridge.limiter.is_limited(&player.id));
        assert_eq!(
            player.inbox.lock()[0],
            MessagesConfig::default().checking_link_status
        );
        assert_eq!(bridge.prune_expired().await, (0, 0));
    }
}
