//! Instrumented link backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use linkbridge::error::BackendError;
use linkbridge::linking::{InsertOutcome, LinkBackend, LinkingCode, MemoryBackend};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;
use uuid::Uuid;

/// Wraps a [`MemoryBackend`] and counts lookups and inserts.
///
/// `insert_link` yields before delegating so concurrent callers interleave.
#[derive(Default)]
pub struct CountingBackend {
    pub inner: MemoryBackend,
    user_lookups: AtomicUsize,
    inserts: AtomicUsize,
}

#[allow(dead_code)]
impl CountingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the game -> chat direction hit the backend.
    pub fn user_lookups(&self) -> usize {
        self.user_lookups.load(Ordering::SeqCst)
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkBackend for CountingBackend {
    async fn get_user(&self, player_id: Uuid) -> Result<Option<u64>, BackendError> {
        self.user_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_user(player_id).await
    }

    async fn get_player(&self, user_id: u64) -> Result<Option<Uuid>, BackendError> {
        self.inner.get_player(user_id).await
    }

    async fn insert_link(
        &self,
        player_id: Uuid,
        user_id: u64,
    ) -> Result<InsertOutcome, BackendError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.inner.insert_link(player_id, user_id).await
    }

    async fn remove_link(&self, player_id: Uuid) -> Result<Option<u64>, BackendError> {
        self.inner.remove_link(player_id).await
    }

    async fn link_count(&self) -> Result<u64, BackendError> {
        self.inner.link_count().await
    }

    async fn put_linking_code(&self, code: &LinkingCode) -> Result<bool, BackendError> {
        self.inner.put_linking_code(code).await
    }

    async fn linking_code_for(
        &self,
        player_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<LinkingCode>, BackendError> {
        self.inner.linking_code_for(player_id, now).await
    }

    async fn take_linking_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, BackendError> {
        self.inner.take_linking_code(code, now).await
    }

    async fn prune_expired_codes(&self, now: DateTime<Utc>) -> Result<u64, BackendError> {
        self.inner.prune_expired_codes(now).await
    }
}

/// Wraps a [`MemoryBackend`] and can hold one `get_user` call after it has
/// read its answer, until the test releases it.
#[derive(Default)]
pub struct GatedBackend {
    pub inner: MemoryBackend,
    armed: AtomicBool,
    reached: Notify,
    release: Notify,
}

#[allow(dead_code)]
impl GatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold the next `get_user` call.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Wait until the held call has read from storage.
    pub async fn held(&self) {
        self.reached.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl LinkBackend for GatedBackend {
    async fn get_user(&self, player_id: Uuid) -> Result<Option<u64>, BackendError> {
        let found = self.inner.get_user(player_id).await?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.reached.notify_one();
            self.release.notified().await;
        }
        Ok(found)
    }

    async fn get_player(&self, user_id: u64) -> Result<Option<Uuid>, BackendError> {
        self.inner.get_player(user_id).await
    }

    async fn insert_link(
        &self,
        player_id: Uuid,
        user_id: u64,
    ) -> Result<InsertOutcome, BackendError> {
        self.inner.insert_link(player_id, user_id).await
    }

    async fn remove_link(&self, player_id: Uuid) -> Result<Option<u64>, BackendError> {
        self.inner.remove_link(player_id).await
    }

    async fn link_count(&self) -> Result<u64, BackendError> {
        self.inner.link_count().await
    }

    async fn put_linking_code(&self, code: &LinkingCode) -> Result<bool, BackendError> {
        self.inner.put_linking_code(code).await
    }

    async fn linking_code_for(
        &self,
        player_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<LinkingCode>, BackendError> {
        self.inner.linking_code_for(player_id, now).await
    }

    async fn take_linking_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, BackendError> {
        self.inner.take_linking_code(code, now).await
    }

    async fn prune_expired_codes(&self, now: DateTime<Utc>) -> Result<u64, BackendError> {
        self.inner.prune_expired_codes(now).await
    }
}

/// A backend whose every operation fails, as if the database were down.
#[derive(Default)]
pub struct FailingBackend;

fn down<T>() -> Result<T, BackendError> {
    Err(BackendError::Unavailable("database is down".to_string()))
}

#[async_trait]
impl LinkBackend for FailingBackend {
    async fn get_user(&self, _player_id: Uuid) -> Result<Option<u64>, BackendError> {
        down()
    }

    async fn get_player(&self, _user_id: u64) -> Result<Option<Uuid>, BackendError> {
        down()
    }

    async fn insert_link(
        &self,
        _player_id: Uuid,
        _user_id: u64,
    ) -> Result<InsertOutcome, BackendError> {
        down()
    }

    async fn remove_link(&self, _player_id: Uuid) -> Result<Option<u64>, BackendError> {
        down()
    }

    async fn link_count(&self) -> Result<u64, BackendError> {
        down()
    }

    async fn put_linking_code(&self, _code: &LinkingCode) -> Result<bool, BackendError> {
        down()
    }

    async fn linking_code_for(
        &self,
        _player_id: Uuid,
        _now: DateTime<Utc>,
    ) -> Result<Option<LinkingCode>, BackendError> {
        down()
    }

    async fn take_linking_code(
        &self,
        _code: &str,
        _now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, BackendError> {
        down()
    }

    async fn prune_expired_codes(&self, _now: DateTime<Utc>) -> Result<u64, BackendError> {
        down()
    }
}
