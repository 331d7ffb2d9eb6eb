//! Linking flow scenarios driven with simulated time.

mod common;

use common::{CountingBackend, FailingBackend, GatedBackend, RecordingPlayer};
use linkbridge::config::MessagesConfig;
use linkbridge::linking::{
    CachedLinkStore, CodeSettings, LinkBackend, LinkFlow, LinkFlowState, LinkProvider, LinkStore,
};
use linkbridge::security::ExpiringRateLimiter;
use std::sync::Arc;
use std::time::Duration;

const COOLDOWN: Duration = Duration::from_secs(5);

struct Harness {
    backend: Arc<CountingBackend>,
    store: Arc<CachedLinkStore>,
    flow: LinkFlow,
    messages: MessagesConfig,
}

fn harness() -> Harness {
    let backend = Arc::new(CountingBackend::new());
    let store = Arc::new(CachedLinkStore::new(
        backend.clone(),
        CodeSettings::default(),
    ));
    let flow = LinkFlow::new(
        store.clone(),
        Arc::new(ExpiringRateLimiter::new(COOLDOWN)),
        Arc::new(MessagesConfig::default()),
    );
    Harness {
        backend,
        store,
        flow,
        messages: MessagesConfig::default(),
    }
}

#[tokio::test(start_paused = true)]
async fn cooldown_then_instructions_redelivered() {
    let h = harness();
    let player = RecordingPlayer::new("Steve");

    // First attempt: limiter records the player, active query finds nothing.
    let state = h.flow.start(&player, player.id, "link").await;
    assert_eq!(state, LinkFlowState::AwaitingProof);
    assert_eq!(h.backend.user_lookups(), 1);
    assert!(h.flow.limiter().is_limited(&player.id));

    let first = player.take_messages();
    assert_eq!(first[0], h.messages.checking_link_status);
    let first_code_line = first[1].clone();

    // Second attempt inside the window: cooldown message, no query.
    tokio::time::advance(Duration::from_secs(2)).await;
    let state = h.flow.start(&player, player.id, "link").await;
    assert_eq!(state, LinkFlowState::Unlinked);
    assert_eq!(player.take_messages(), vec![h.messages.please_wait.clone()]);
    assert_eq!(h.backend.user_lookups(), 1);

    // After the window: re-query, still unlinked, instructions again.
    tokio::time::advance(Duration::from_secs(4)).await;
    let state = h.flow.start(&player, player.id, "link").await;
    assert_eq!(state, LinkFlowState::AwaitingProof);
    assert_eq!(h.backend.user_lookups(), 2);

    let third = player.take_messages();
    assert_eq!(third[0], h.messages.checking_link_status);
    // the live code is reused rather than reissued
    assert_eq!(third[1], first_code_line);
}

#[tokio::test(start_paused = true)]
async fn limited_attempt_does_not_refresh_window() {
    let h = harness();
    let player = RecordingPlayer::new("Alex");

    h.flow.start(&player, player.id, "link").await;
    tokio::time::advance(Duration::from_secs(3)).await;
    assert_eq!(
        h.flow.start(&player, player.id, "link").await,
        LinkFlowState::Unlinked
    );

    // Five seconds after the first attempt, not after the refused one.
    tokio::time::advance(Duration::from_millis(2_100)).await;
    assert!(!h.flow.limiter().is_limited(&player.id));
    assert_eq!(
        h.flow.start(&player, player.id, "link").await,
        LinkFlowState::AwaitingProof
    );
}

#[tokio::test(start_paused = true)]
async fn cached_link_skips_query_and_limiter() {
    let h = harness();
    let player = RecordingPlayer::new("Steve");
    h.store.create_link(player.id, 1234).await.unwrap();

    let state = h.flow.start(&player, player.id, "link").await;

    assert_eq!(state, LinkFlowState::AlreadyLinked);
    assert!(state.is_terminal());
    assert_eq!(h.backend.user_lookups(), 0);
    assert!(h.flow.limiter().is_empty());
    assert_eq!(player.take_messages(), vec![h.messages.already_linked.clone()]);
}

#[tokio::test(start_paused = true)]
async fn code_redeemed_on_chat_side_completes_link() {
    let h = harness();
    let player = RecordingPlayer::new("Steve");

    h.flow.start(&player, player.id, "link").await;
    let code = h
        .backend
        .linking_code_for(player.id, chrono::Utc::now())
        .await
        .unwrap()
        .expect("code issued");

    assert_eq!(
        h.store.redeem_code(&code.code, 8080).await.unwrap(),
        Some(player.id)
    );

    // Outside the cooldown the next attempt finds the link in cache.
    tokio::time::advance(COOLDOWN * 2).await;
    assert_eq!(
        h.flow.start(&player, player.id, "link").await,
        LinkFlowState::AlreadyLinked
    );
}

#[tokio::test(start_paused = true)]
async fn link_completed_out_of_band_is_reported() {
    let h = harness();
    let player = RecordingPlayer::new("Steve");
    h.backend.inner.insert_link(player.id, 99).await.unwrap();

    assert_eq!(h.store.cached_chat_account(&player.id), None);
    assert_eq!(
        h.flow.start(&player, player.id, "link").await,
        LinkFlowState::Linked
    );
    assert_eq!(
        player.take_messages(),
        vec![
            h.messages.checking_link_status.clone(),
            h.messages.now_linked.clone()
        ]
    );
    assert_eq!(h.store.cached_chat_account(&player.id), Some(99));
}

#[tokio::test(start_paused = true)]
async fn backend_outage_fails_without_state() {
    let store = Arc::new(CachedLinkStore::new(
        Arc::new(FailingBackend),
        CodeSettings::default(),
    ));
    let flow = LinkFlow::new(
        store.clone(),
        Arc::new(ExpiringRateLimiter::new(COOLDOWN)),
        Arc::new(MessagesConfig::default()),
    );
    let player = RecordingPlayer::new("Steve");

    assert_eq!(
        flow.start(&player, player.id, "link").await,
        LinkFlowState::Failed
    );
    assert_eq!(
        player.take_messages().last().cloned(),
        Some(MessagesConfig::default().unable_to_link)
    );
    assert_eq!(store.cached_chat_account(&player.id), None);
}

#[tokio::test(start_paused = true)]
async fn simultaneous_attempts_pass_the_cooldown_once() {
    let h = harness();
    let flow = Arc::new(h.flow);
    let player = Arc::new(RecordingPlayer::new("Steve"));

    let first = flow.spawn(player.clone(), player.id, "link".to_string());
    let second = flow.spawn(player.clone(), player.id, "link".to_string());
    let mut states = [first.await.unwrap(), second.await.unwrap()];
    states.sort_by_key(|s| s.as_str());

    assert_eq!(states, [LinkFlowState::AwaitingProof, LinkFlowState::Unlinked]);
    assert_eq!(h.backend.user_lookups(), 1);
}

#[tokio::test(start_paused = true)]
async fn lookup_racing_removal_does_not_pin_stale_link() {
    let backend = Arc::new(GatedBackend::new());
    let store = Arc::new(CachedLinkStore::new(backend.clone(), CodeSettings::default()));
    let player = RecordingPlayer::new("Steve");
    let id = player.id;
    backend.inner.insert_link(id, 7).await.unwrap();

    // A passive lookup reads the link, then stalls before filling the cache.
    backend.arm();
    let reader = {
        let store = store.clone();
        tokio::spawn(async move { store.query_chat_account(id, false).await })
    };
    backend.held().await;

    assert_eq!(store.remove_link(id).await.unwrap(), Some(7));
    backend.release();

    // The lookup answers with what it read, but must not cache it.
    assert_eq!(reader.await.unwrap().unwrap(), Some(7));
    assert_eq!(store.cached_chat_account(&id), None);

    let flow = LinkFlow::new(
        store.clone(),
        Arc::new(ExpiringRateLimiter::new(COOLDOWN)),
        Arc::new(MessagesConfig::default()),
    );
    assert_eq!(
        flow.start(&player, id, "link").await,
        LinkFlowState::AwaitingProof
    );
}
