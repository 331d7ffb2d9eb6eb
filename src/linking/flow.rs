//! Linking flow controller.
//!
//! Drives one player-initiated linking attempt:
//!
//! ```text
//! Unlinked -> CheckingStatus -> AlreadyLinked | AwaitingProof | Linked | Failed
//! ```
//!
//! The controller never polls. Each attempt starts fresh from `Unlinked`;
//! confirmation of an outstanding code arrives through the store's own
//! out-of-band path (e.g. [`crate::linking::CachedLinkStore::redeem_code`]).
//! The rate limiter's cooldown is the only deduplication between attempts.

use super::LinkProvider;
use crate::config::MessagesConfig;
use crate::security::ExpiringRateLimiter;
use crate::state::GameSender;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, warn};
use uuid::Uuid;

/// Where a linking attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkFlowState {
    /// No attempt in progress. Also where a refused (rate-limited) attempt stays.
    Unlinked,
    /// Active query against the provider is running.
    CheckingStatus,
    /// Instructions were delivered; waiting on the player to complete them.
    AwaitingProof,
    /// A cached link existed before the attempt began.
    AlreadyLinked,
    /// The active query found a link completed out-of-band.
    Linked,
    /// The provider could not answer or could not produce instructions.
    Failed,
}

impl LinkFlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AlreadyLinked | Self::Linked | Self::Failed)
    }

    /// Static label for metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unlinked => "unlinked",
            Self::CheckingStatus => "checking_status",
            Self::AwaitingProof => "awaiting_proof",
            Self::AlreadyLinked => "already_linked",
            Self::Linked => "linked",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for LinkFlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestrates linking attempts against a provider and a cooldown limiter.
pub struct LinkFlow {
    provider: Arc<dyn LinkProvider>,
    limiter: Arc<ExpiringRateLimiter<Uuid>>,
    messages: Arc<MessagesConfig>,
}

impl LinkFlow {
    pub fn new(
        provider: Arc<dyn LinkProvider>,
        limiter: Arc<ExpiringRateLimiter<Uuid>>,
        messages: Arc<MessagesConfig>,
    ) -> Self {
        Self {
            provider,
            limiter,
            messages,
        }
    }

    pub fn provider(&self) -> &Arc<dyn LinkProvider> {
        &self.provider
    }

    pub fn limiter(&self) -> &Arc<ExpiringRateLimiter<Uuid>> {
        &self.limiter
    }

    /// Run one attempt on the worker pool.
    ///
    /// The caller only enqueues; replies are sent from the worker, so
    /// `player.send_message` must be safe off the surface thread.
    pub fn spawn(
        self: &Arc<Self>,
        player: Arc<dyn GameSender>,
        player_id: Uuid,
        label: String,
    ) -> JoinHandle<LinkFlowState> {
        let flow = Arc::clone(self);
        tokio::spawn(async move { flow.start(player.as_ref(), player_id, &label).await })
    }

    /// Run one attempt for `player_id` and return the state it ended in.
    pub async fn start(&self, player: &dyn GameSender, player_id: Uuid, label: &str) -> LinkFlowState {
        let span = crate::telemetry::spans::link_flow(&player_id);
        let state = self.run(player, player_id, label).instrument(span).await;
        crate::metrics::record_link_flow(state.as_str());
        state
    }

    async fn run(&self, player: &dyn GameSender, player_id: Uuid, label: &str) -> LinkFlowState {
        // A cached link answers without touching the limiter.
        if self.provider.cached_chat_account(&player_id).is_some() {
            player.send_message(&self.messages.already_linked);
            return LinkFlowState::AlreadyLinked;
        }
        // Checks the cooldown and starts a new one in a single step. A refused
        // attempt leaves the running window as it was.
        if !self.limiter.try_acquire(player_id) {
            crate::metrics::record_rate_limited();
            player.send_message(&self.messages.please_wait);
            return LinkFlowState::Unlinked;
        }

        debug!(state = %LinkFlowState::CheckingStatus, "linking attempt started");
        player.send_message(&self.messages.checking_link_status);

        match self.provider.query_chat_account(player_id, true).await {
            Err(e) => {
                warn!(error = %e, "link status query failed");
                player.send_message(&self.messages.unable_to_link);
                return LinkFlowState::Failed;
            }
            Ok(Some(user_id)) => {
                info!(user = user_id, "link completed out-of-band");
                player.send_message(&self.messages.now_linked);
                return LinkFlowState::Linked;
            }
            Ok(None) => {}
        }

        match self
            .provider
            .linking_instructions(player_id, player.name(), label)
            .await
        {
            Ok(instructions) => {
                for line in instructions.render(&self.messages, label) {
                    player.send_message(&line);
                }
                debug!(state = %LinkFlowState::AwaitingProof, "linking instructions delivered");
                LinkFlowState::AwaitingProof
            }
            Err(e) => {
                warn!(error = %e, "could not produce linking instructions");
                player.send_message(&self.messages.unable_to_link);
                LinkFlowState::Failed
            }
        }
    }
}
