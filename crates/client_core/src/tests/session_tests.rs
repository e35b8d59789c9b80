use std::time::Duration;

use shared::domain::ArtworkId;
use storage::MemoryKeyValueStore;

use super::*;
use crate::{
    error::SelectionError,
    selection::SelectionSet,
    test_support::{ids, CountingStore, Failure, ScriptedProvider},
};

fn config(page_size: u32, universe_page_size: u32) -> SessionConfig {
    SessionConfig {
        page_size,
        universe_page_size,
        ..SessionConfig::default()
    }
}

#[tokio::test]
async fn two_page_scenario_tracks_all_selected() {
    let provider = Arc::new(ScriptedProvider::from_pages(vec![vec![10, 11], vec![12, 13]]));
    let store = Arc::new(MemoryKeyValueStore::new());
    let mut session = Session::start(config(2, 2), provider, store)
        .await
        .expect("session");

    let status = session.wait_for_universe().await;
    assert_eq!(status, EnumerationStatus::Complete);
    assert_eq!(session.selection().universe(), ids(&[10, 11, 12, 13]).as_slice());

    session.selection_mut().toggle(ArtworkId(11), true).await;
    assert!(!session.selection().all_selected());

    for id in [10, 12, 13] {
        session.selection_mut().toggle(ArtworkId(id), true).await;
    }
    assert!(session.selection().all_selected());
    assert!(session.view().header_checked);
}

#[tokio::test]
async fn start_restores_selection_and_shows_first_page() {
    let provider = Arc::new(ScriptedProvider::catalog(12));
    let store = CountingStore::seeded(DEFAULT_SELECTION_KEY, r#"{"2":true}"#).await;
    let session = Session::start(config(5, 100), provider.clone(), store.clone())
        .await
        .expect("session");

    let view = session.view();
    assert_eq!(view.current_page, 1);
    assert_eq!(view.total_records, 12);
    assert_eq!((view.first, view.last), (1, 5));
    assert_eq!(view.selected_count, 1);
    assert!(view.rows[1].checked);
    assert!(!view.rows[0].checked);
    assert_eq!(store.writes().await, 0);
}

#[tokio::test]
async fn select_all_after_full_enumeration_covers_every_page() {
    let provider = Arc::new(ScriptedProvider::catalog(30));
    let store = Arc::new(MemoryKeyValueStore::new());
    let mut session = Session::start(config(5, 10), provider, store.clone())
        .await
        .expect("session");

    session.wait_for_universe().await;
    session.selection_mut().select_all(true).await;
    session.pagination_mut().go_to(6, 5).await.expect("last page");

    let view = session.view();
    assert!(view.header_checked);
    assert!(view.rows.iter().all(|row| row.checked));
    assert_eq!(view.selected_count, 30);
    assert_eq!((view.first, view.last), (26, 30));

    let persisted = store
        .get(DEFAULT_SELECTION_KEY)
        .await
        .expect("get")
        .expect("persisted");
    let restored: SelectionSet = serde_json::from_str(&persisted).expect("decode");
    assert_eq!(restored.checked_count(), 30);
}

#[tokio::test]
async fn failed_first_page_still_starts_session() {
    let provider = Arc::new(ScriptedProvider::catalog(10).failing_on(1, Failure::Unavailable));
    let store = Arc::new(MemoryKeyValueStore::new());
    let mut session = Session::start(config(5, 100), provider, store)
        .await
        .expect("session");

    assert!(session.view().rows.is_empty());
    let status = session.wait_for_universe().await;
    assert!(matches!(status, EnumerationStatus::Aborted { .. }));
    assert!(session.selection().universe().is_empty());
}

#[tokio::test]
async fn failed_page_change_keeps_view_on_shown_rows() {
    let provider = Arc::new(ScriptedProvider::catalog(20).failing_on(2, Failure::Unavailable));
    let store = Arc::new(MemoryKeyValueStore::new());
    let mut session = Session::start(config(5, 100), provider, store)
        .await
        .expect("session");

    session
        .pagination_mut()
        .go_to(2, 5)
        .await
        .expect_err("page 2 fails");

    let view = session.view();
    assert_eq!(view.current_page, 1);
    assert_eq!((view.first, view.last), (1, 5));
    assert_eq!(view.total_pages, 4);
    assert_eq!(view.rows[0].artwork.id, ArtworkId(1));
}

#[tokio::test]
async fn corrupt_selection_fails_start() {
    let provider = Arc::new(ScriptedProvider::catalog(10));
    let store = CountingStore::seeded(DEFAULT_SELECTION_KEY, "[1, 2").await;

    let err = Session::start(SessionConfig::default(), provider, store)
        .await
        .err()
        .expect("must fail");

    assert!(matches!(
        err.downcast_ref::<SelectionError>(),
        Some(SelectionError::CorruptState { .. })
    ));
}

#[tokio::test]
async fn restart_rebuilds_universe_from_scratch() {
    let provider = Arc::new(ScriptedProvider::from_pages(vec![vec![1, 2], vec![3]]));
    let store = Arc::new(MemoryKeyValueStore::new());
    let mut session = Session::start(config(2, 2), provider.clone(), store)
        .await
        .expect("session");
    session.wait_for_universe().await;

    session.restart_universe().await;
    session.wait_for_universe().await;

    assert_eq!(session.selection().universe(), ids(&[1, 2, 3]).as_slice());
    let universe_pages: Vec<u32> = provider
        .requests()
        .await
        .iter()
        .filter(|r| r.limit == 2)
        .map(|r| r.page)
        .collect();
    assert_eq!(universe_pages.iter().filter(|page| **page == 1).count(), 3);
}

#[tokio::test]
async fn sync_picks_up_partial_universe() {
    let provider = Arc::new(ScriptedProvider::catalog(40).with_delay(Duration::from_millis(15)));
    let store = Arc::new(MemoryKeyValueStore::new());
    let mut session = Session::start(config(10, 10), provider, store)
        .await
        .expect("session");

    let mut updates = session.universe().updates();
    while let Some(snapshot) = futures::StreamExt::next(&mut updates).await {
        if !snapshot.ids.is_empty() {
            break;
        }
    }
    let status = session.sync_universe().await;
    let known = session.selection().universe().len();

    assert!(known >= 10);
    if status == EnumerationStatus::Running {
        assert!(!session.selection().is_universe_complete());
    }

    session.wait_for_universe().await;
    assert_eq!(session.selection().universe().len(), 40);
    assert!(session.view().universe_complete);
}
