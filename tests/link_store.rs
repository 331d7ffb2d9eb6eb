//! Link Store invariants under concurrency, on both backends.

mod common;

use common::CountingBackend;
use futures_util::future::join_all;
use linkbridge::db::Database;
use linkbridge::error::LinkError;
use linkbridge::linking::{
    CachedLinkStore, CodeSettings, LinkBackend, LinkProvider, LinkStore, MemoryBackend,
    MirrorLinkProvider,
};
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

fn store_over(backend: Arc<dyn LinkBackend>) -> Arc<CachedLinkStore> {
    Arc::new(CachedLinkStore::new(backend, CodeSettings::default()))
}

async fn race_same_player(store: Arc<CachedLinkStore>) {
    let player = Uuid::new_v4();

    let a = {
        let store = store.clone();
        tokio::spawn(async move { store.create_link(player, 1).await })
    };
    let b = {
        let store = store.clone();
        tokio::spawn(async move { store.create_link(player, 2).await })
    };
    let results = [a.await.unwrap(), b.await.unwrap()];

    let wins = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(LinkError::Conflict { .. })))
        .count();
    assert_eq!((wins, conflicts), (1, 1), "results: {results:?}");

    let winner = store.query_chat_account(player, true).await.unwrap();
    assert!(matches!(winner, Some(1) | Some(2)));
    let loser = if winner == Some(1) { 2 } else { 1 };
    assert_eq!(store.query_game_account(loser).await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_conflicting_links_memory() {
    for _ in 0..20 {
        race_same_player(store_over(Arc::new(CountingBackend::new()))).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_conflicting_links_sqlite() {
    let db = Database::new(":memory:").await.unwrap();
    race_same_player(store_over(Arc::new(db))).await;
}

/// A file-backed database, so writers use the full connection pool.
async fn file_database() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("links.db");
    let db = Database::new(path.to_str().unwrap()).await.unwrap();
    (dir, db)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_conflicting_links_sqlite_file() {
    for _ in 0..5 {
        let (_dir, db) = file_database().await;
        race_same_player(store_over(Arc::new(db))).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unrelated_links_all_succeed_sqlite_file() {
    let (_dir, db) = file_database().await;
    let db = Arc::new(db);
    let store = store_over(db.clone());

    let results = join_all((0..200u64).map(|user| {
        let store = store.clone();
        tokio::spawn(async move { store.create_link(Uuid::new_v4(), user).await })
    }))
    .await;

    let failures: Vec<_> = results
        .into_iter()
        .map(|r| r.unwrap())
        .filter_map(Result::err)
        .collect();
    assert!(failures.is_empty(), "{} failed, first: {:?}", failures.len(), failures.first());
    assert_eq!(db.link_count().await.unwrap(), 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_code_issue_and_removal_sqlite_file() {
    let (_dir, db) = file_database().await;
    let store = store_over(Arc::new(db));

    let issued = join_all((0..50).map(|_| {
        let store = store.clone();
        tokio::spawn(async move {
            let player = Uuid::new_v4();
            let instructions = store.linking_instructions(player, "Steve", "link").await.unwrap();
            assert!(instructions.code.is_some());
            store.remove_link(player).await
        })
    }))
    .await;

    for result in issued {
        assert_eq!(result.unwrap(), Ok(None));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn bijective_after_random_concurrent_links() {
    let backend = Arc::new(MemoryBackend::new());
    let store = store_over(backend.clone());
    let players: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();

    let calls: Vec<_> = {
        let mut rng = rand::thread_rng();
        (0..200)
            .map(|_| (players[rng.gen_range(0..players.len())], rng.gen_range(0..8u64)))
            .collect()
    };

    let results = join_all(calls.into_iter().map(|(player, user)| {
        let store = store.clone();
        tokio::spawn(async move { store.create_link(player, user).await })
    }))
    .await;

    for result in results {
        match result.unwrap() {
            Ok(()) | Err(LinkError::Conflict { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    let links = backend.links();
    let distinct_players: HashSet<_> = links.iter().map(|l| l.player_id).collect();
    let distinct_users: HashSet<_> = links.iter().map(|l| l.user_id).collect();
    assert_eq!(distinct_players.len(), links.len());
    assert_eq!(distinct_users.len(), links.len());

    for link in links {
        assert_eq!(store.cached_chat_account(&link.player_id), Some(link.user_id));
        assert_eq!(
            store.query_game_account(link.user_id).await.unwrap(),
            Some(link.player_id)
        );
    }
}

#[tokio::test]
async fn repeated_identical_link_is_noop() {
    let backend = Arc::new(CountingBackend::new());
    let store = store_over(backend.clone());
    let player = Uuid::new_v4();

    store.create_link(player, 7).await.unwrap();
    store.create_link(player, 7).await.unwrap();

    assert_eq!(backend.link_count().await.unwrap(), 1);
    assert_eq!(backend.inserts(), 2);
}

#[tokio::test]
async fn remove_link_frees_both_sides() {
    let store = store_over(Arc::new(MemoryBackend::new()));
    let player = Uuid::new_v4();
    store.create_link(player, 7).await.unwrap();

    assert_eq!(store.remove_link(player).await.unwrap(), Some(7));
    assert_eq!(store.cached_chat_account(&player), None);
    assert_eq!(store.query_game_account(7).await.unwrap(), None);

    store.create_link(Uuid::new_v4(), 7).await.unwrap();
}

#[tokio::test]
async fn store_capability_is_discoverable() {
    let backend: Arc<dyn LinkBackend> = Arc::new(MemoryBackend::new());
    let store: Arc<dyn LinkProvider> = store_over(backend.clone());
    let mirror: Arc<dyn LinkProvider> = Arc::new(MirrorLinkProvider::new(backend));

    assert!(store.as_store().is_some());
    assert!(mirror.as_store().is_none());

    let player = Uuid::new_v4();
    store.as_store().unwrap().create_link(player, 3).await.unwrap();
    assert_eq!(mirror.query_chat_account(player, false).await.unwrap(), Some(3));
    assert_eq!(
        mirror.linking_instructions(player, "Steve", "link").await,
        Err(LinkError::LinkingUnavailable)
    );
}
