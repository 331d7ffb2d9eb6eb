//! Cross-platform identity linking.
//!
//! A link pairs one game account (`Uuid`) with one chat-network account
//! (`u64`). The relation is bijective: neither side may appear in two links.
//!
//! ## Capability tiers
//!
//! - [`LinkProvider`]: resolves identities in both directions and may offer
//!   self-service linking instructions. Read-only mirrors stop here.
//! - [`LinkStore`]: a provider that owns persistence and can create links.
//!   Callers discover it through [`LinkProvider::as_store`], never by downcast.
//!
//! Implementations:
//! - [`CachedLinkStore`]: read-write store over any [`LinkBackend`], with
//!   code-based linking.
//! - [`MirrorLinkProvider`]: read-only view of a backend.

mod backend;
mod cache;
pub mod flow;
mod locks;
mod memory;
mod mirror;
mod store;

pub use backend::{InsertOutcome, LinkBackend, LinkingCode};
pub use cache::LinkCache;
pub use flow::{LinkFlow, LinkFlowState};
pub use locks::KeyedLocks;
pub use memory::MemoryBackend;
pub use mirror::MirrorLinkProvider;
pub use store::{CachedLinkStore, CodeSettings};

use crate::config::MessagesConfig;
use crate::error::LinkResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A persisted game account <-> chat account pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub player_id: Uuid,
    pub user_id: u64,
}

/// Steps a player must complete to finish linking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkingInstructions {
    /// Code to enter on the chat network.
    pub code: Option<String>,
    /// Web page that completes the flow.
    pub url: Option<String>,
    /// When the code stops being redeemable.
    pub expires_at: Option<DateTime<Utc>>,
}

impl LinkingInstructions {
    /// Render the instructions as chat lines, one step per line.
    pub fn render(&self, messages: &MessagesConfig, label: &str) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(code) = &self.code {
            lines.push(
                messages
                    .linking_code
                    .replace("%code%", code)
                    .replace("%label%", label),
            );
        }
        if let Some(url) = &self.url {
            let line = messages.linking_url.replace("%url%", url);
            lines.push(match &self.code {
                Some(code) => line.replace("%code%", code),
                None => line,
            });
        }
        if let Some(expires_at) = self.expires_at {
            let minutes = (expires_at - Utc::now()).num_minutes().max(1);
            lines.push(
                messages
                    .linking_code_expiry
                    .replace("%minutes%", &minutes.to_string()),
            );
        }
        lines
    }
}

/// Read-capable identity resolver between the two account spaces.
#[async_trait]
pub trait LinkProvider: Send + Sync {
    /// Resolve a chat account to its linked game account.
    ///
    /// `Ok(None)` means no link exists; `Err(LookupFailure)` means the
    /// authoritative lookup could not complete.
    async fn query_game_account(&self, user_id: u64) -> LinkResult<Option<Uuid>>;

    /// Resolve a game account to its linked chat account.
    ///
    /// With `can_cause_side_effects` the provider may refresh its view from
    /// the authoritative source instead of answering from cache.
    /// Providers without a refresh path ignore the flag.
    async fn query_chat_account(
        &self,
        player_id: Uuid,
        can_cause_side_effects: bool,
    ) -> LinkResult<Option<u64>>;

    /// Cache-only lookup. Never blocks, never performs I/O.
    fn cached_chat_account(&self, player_id: &Uuid) -> Option<u64>;

    /// Produce the steps `player_id` must complete to link.
    ///
    /// Fails with `LinkingUnavailable` when the provider has no self-service flow.
    async fn linking_instructions(
        &self,
        player_id: Uuid,
        player_name: &str,
        label: &str,
    ) -> LinkResult<LinkingInstructions>;

    /// Capability query for the read-write tier.
    fn as_store(&self) -> Option<&dyn LinkStore> {
        None
    }
}

/// A [`LinkProvider`] that owns persistence and can mutate links.
#[async_trait]
pub trait LinkStore: LinkProvider {
    /// Persist `player_id <-> user_id`.
    ///
    /// Atomic and idempotent: the exact existing pair is a no-op; if either
    /// side is linked to a different counterpart this fails with
    /// `LinkError::Conflict` and nothing is written.
    async fn create_link(&self, player_id: Uuid, user_id: u64) -> LinkResult<()>;

    /// Remove the link for `player_id`, returning the unlinked chat account.
    async fn remove_link(&self, player_id: Uuid) -> LinkResult<Option<u64>>;
}
