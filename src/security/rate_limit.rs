//! Cooldown rate limiting for linking attempts.
//!
//! # Architecture
//!
//! Each key gets its own `governor` limiter with a quota of one cell per
//! window, kept in a sharded `DashMap` so unrelated keys never contend on
//! the same lock. A refused check leaves governor's state untouched, which
//! is what keeps a limited key's window from being extended.
//!
//! Time comes from [`TokioClock`], which follows the paused clock in tests.

use dashmap::DashMap;
use governor::clock::Clock;
use governor::middleware::NoOpMiddleware;
use governor::state::InMemoryState;
use governor::state::direct::NotKeyed;
use governor::{Quota, RateLimiter};
use std::fmt::Debug;
use std::hash::Hash;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;

/// Governor clock reading `tokio::time::Instant`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now().into_std()
    }
}

type Cooldown =
    RateLimiter<NotKeyed, InMemoryState, TokioClock, NoOpMiddleware<std::time::Instant>>;

/// Per-key cooldown limiter.
pub struct ExpiringRateLimiter<K: Eq + Hash> {
    /// Key -> its cooldown.
    entries: DashMap<K, Cooldown>,
    quota: Quota,
    window: Duration,
}

impl<K> ExpiringRateLimiter<K>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Create a limiter allowing one attempt per key per `window`.
    pub fn new(window: Duration) -> Self {
        // A zero window never limits.
        let quota =
            Quota::with_period(window).unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX));
        Self {
            entries: DashMap::new(),
            quota,
            window,
        }
    }

    /// The cooldown window.
    pub fn window(&self) -> Duration {
        self.window
    }

    fn cooldown(&self) -> Cooldown {
        RateLimiter::direct_with_clock(self.quota, &TokioClock)
    }

    /// Take the key's slot if its window is over, starting a new one.
    ///
    /// Check and mark happen under one shard lock, so two concurrent
    /// attempts for the same key cannot both pass.
    pub fn try_acquire(&self, key: K) -> bool {
        let allowed = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| self.cooldown())
            .check()
            .is_ok();
        if !allowed {
            debug!(key = ?key, "linking attempt inside cooldown window");
        }
        allowed
    }

    /// Whether `key` was marked used less than one window ago.
    ///
    /// Does not refresh the entry.
    pub fn is_limited(&self, key: &K) -> bool {
        // A passing check means the window is over. The slot it consumed
        // goes away with the entry, which is the same as never marked.
        let expired = self
            .entries
            .remove_if(key, |_, cooldown| cooldown.check().is_ok());
        expired.is_none() && self.entries.contains_key(key)
    }

    /// Start (or restart) the cooldown window for `key`.
    pub fn mark_used(&self, key: K) {
        let cooldown = self.cooldown();
        let _ = cooldown.check();
        self.entries.insert(key, cooldown);
    }

    /// Drop every expired entry. Returns how many were removed.
    ///
    /// Call periodically from a maintenance task.
    pub fn prune_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, cooldown| cooldown.check().is_err());
        before.saturating_sub(self.entries.len())
    }

    /// Number of tracked keys, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash> Debug for ExpiringRateLimiter<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringRateLimiter")
            .field("window", &self.window)
            .field("keys", &self.entries.len())
            .finish()
    }
}
