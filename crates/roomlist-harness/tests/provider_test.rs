//! End-to-end provider scenarios against the simulated source.
//!
//! Each test runs a real provider (executor thread, command pump, viewport
//! task) on a multi-threaded runtime and drives it through the simulated
//! source, with short real-time debounces.

#![allow(clippy::unwrap_used)]

use std::{sync::Arc, time::Duration};

use roomlist_app::{ProviderConfig, ProviderError, RoomSummaryProvider, SourceError};
use roomlist_core::{
    EditOperation, FilterConfig, FilterSpec, ProviderState, RawEntry, RoomFilter, RoomId,
    SourceCommand, SourceLoadingState, Summary, ViewportConfig, compose_filter,
};
use roomlist_harness::{InvariantRegistry, ProviderSnapshot, SimRoom, SimSource, StateHistory};

type Provider = RoomSummaryProvider<SimSource, SimSource>;

const DEBOUNCE: Duration = Duration::from_millis(40);
const WAIT: Duration = Duration::from_secs(3);

fn config(page_size: u32) -> ProviderConfig {
    ProviderConfig {
        name: "test".to_owned(),
        page_size,
        enrichment_timeout: Duration::from_millis(200),
        viewport: ViewportConfig { debounce: DEBOUNCE, ..ViewportConfig::default() },
        ..ProviderConfig::default()
    }
}

fn provider(source: &Arc<SimSource>, page_size: u32) -> Provider {
    RoomSummaryProvider::new(Arc::clone(source), Arc::clone(source), config(page_size)).unwrap()
}

fn room(n: u32) -> SimRoom {
    SimRoom::new(format!("!r{n}:sim"), &format!("Room {n}"))
}

fn id(n: u32) -> RoomId {
    RoomId::new(format!("!r{n}:sim"))
}

async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    tokio::time::timeout(WAIT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .is_ok()
}

async fn wait_for_list(provider: &Provider, predicate: impl FnMut(&Vec<Summary>) -> bool) -> Vec<Summary> {
    let mut list = provider.room_list().subscribe();
    tokio::time::timeout(WAIT, list.wait_for(predicate)).await.unwrap().unwrap()
}

fn page_commands(source: &SimSource) -> Vec<SourceCommand> {
    source
        .commands()
        .into_iter()
        .filter(|c| matches!(c, SourceCommand::AddOnePage | SourceCommand::ResetToOnePage))
        .collect()
}

async fn filter_installed(source: &SimSource) {
    assert!(eventually(|| source.commands().iter().any(|c| matches!(c, SourceCommand::SetFilter(_)))).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn enrichment_failure_degrades_single_entry() {
    let source = Arc::new(SimSource::new());
    let mut provider = provider(&source, 10);
    provider.subscribe_if_necessary().await.unwrap();
    filter_installed(&source).await;

    for (n, recency) in [(1, 30), (2, 20), (3, 10)] {
        let mut room = room(n);
        room.recency = recency;
        source.seed_room(room);
    }
    source.fail_enrichment(id(2));

    source.set_loading_state(SourceLoadingState::Loaded { maximum: Some(3) });
    source.push_batch(vec![EditOperation::Append(vec![
        RawEntry::Room(id(1)),
        RawEntry::Room(id(2)),
        RawEntry::Room(id(3)),
    ])]);

    let list = wait_for_list(&provider, |list| list.len() == 3).await;
    let ids: Vec<_> = list.iter().map(|s| s.id.clone()).collect();
    assert_eq!(ids, vec![id(1), id(2), id(3)]);
    assert!(!list[0].is_degraded);
    assert_eq!(list[0].name, "Room 1");
    assert!(list[1].is_degraded);
    assert_eq!(list[1].name, "!r2:sim");
    assert!(!list[2].is_degraded);

    let mut state = provider.state().subscribe();
    let loaded = tokio::time::timeout(WAIT, state.wait_for(ProviderState::is_loaded)).await.unwrap();
    assert_eq!(loaded, Some(ProviderState::Loaded { total: 3 }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn initial_snapshot_then_live_updates() {
    let source = Arc::new(SimSource::new());
    for n in 0..5 {
        source.add_room(room(n));
    }
    let mut provider = provider(&source, 10);
    let history = StateHistory::record(&provider.state());
    source.set_loading_state(SourceLoadingState::Loaded { maximum: None });
    provider.subscribe_if_necessary().await.unwrap();

    wait_for_list(&provider, |list| list.len() == 5).await;
    source.add_room(room(9));
    let list = wait_for_list(&provider, |list| list.len() == 6).await;
    assert_eq!(list[0].id, id(9));

    source.remove_room(&id(0));
    wait_for_list(&provider, |list| list.len() == 5).await;

    assert!(eventually(|| provider.room_list().get().len() == source.window_ids().len()).await);
    let snapshot = ProviderSnapshot::capture(&provider, &history).with_source(&source);
    InvariantRegistry::standard().assert_all(&snapshot, "after live updates");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn viewport_pages_once_per_decision() {
    let source = Arc::new(SimSource::new());
    for n in 0..50 {
        source.add_room(room(n));
    }
    let mut provider = provider(&source, 50);
    provider.subscribe_if_necessary().await.unwrap();
    wait_for_list(&provider, |list| list.len() == 50).await;
    filter_installed(&source).await;
    source.clear_commands();

    // Bottom of the list, reported repeatedly within one debounce window.
    for _ in 0..3 {
        provider.update_visible_range(40..50);
    }
    assert!(eventually(|| !page_commands(&source).is_empty()).await);
    tokio::time::sleep(DEBOUNCE * 3).await;
    assert_eq!(page_commands(&source), vec![SourceCommand::AddOnePage]);
    assert_eq!(provider.requested_pages(), 2);

    provider.update_visible_range(0..5);
    assert!(eventually(|| page_commands(&source).len() == 2).await);

    // Same range and length again: nothing new.
    for _ in 0..3 {
        provider.update_visible_range(0..5);
        tokio::time::sleep(DEBOUNCE * 2).await;
    }
    assert_eq!(page_commands(&source), vec![
        SourceCommand::AddOnePage,
        SourceCommand::ResetToOnePage
    ]);
    assert_eq!(source.pages(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn resubscribe_restarts_paging_from_one_page() {
    let source = Arc::new(SimSource::new());
    for n in 0..50 {
        source.add_room(room(n));
    }
    let mut provider = provider(&source, 50);
    provider.subscribe_if_necessary().await.unwrap();
    wait_for_list(&provider, |list| list.len() == 50).await;
    filter_installed(&source).await;
    source.clear_commands();

    provider.update_visible_range(40..50);
    assert!(eventually(|| page_commands(&source) == vec![SourceCommand::AddOnePage]).await);
    assert_eq!(provider.requested_pages(), 2);
    assert_eq!(source.pages(), 2);

    provider.resubscribe().await.unwrap();
    assert_eq!(provider.requested_pages(), 1);
    assert_eq!(source.pages(), 1);
    wait_for_list(&provider, |list| list.len() == 50).await;
    source.clear_commands();

    // Same range as before the resubscribe, evaluated afresh.
    provider.update_visible_range(40..50);
    assert!(eventually(|| page_commands(&source) == vec![SourceCommand::AddOnePage]).await);
    assert_eq!(provider.requested_pages(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_range_sends_nothing() {
    let source = Arc::new(SimSource::new());
    for n in 0..5 {
        source.add_room(room(n));
    }
    let mut provider = provider(&source, 10);
    provider.subscribe_if_necessary().await.unwrap();
    wait_for_list(&provider, |list| list.len() == 5).await;
    source.clear_commands();

    provider.update_visible_range(3..3);
    tokio::time::sleep(DEBOUNCE * 4).await;
    assert!(page_commands(&source).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn filter_replacement_narrows_and_restores() {
    let source = Arc::new(SimSource::new());
    for n in 0..6 {
        let mut room = room(n);
        room.info.is_favourite = n % 2 == 0;
        source.add_room(room);
    }
    let mut provider = provider(&source, 10);
    provider.subscribe_if_necessary().await.unwrap();
    wait_for_list(&provider, |list| list.len() == 6).await;

    let favourites = FilterSpec::ComposedFilters([RoomFilter::Favourites].into_iter().collect());
    provider.set_filter(favourites.clone());
    let list = wait_for_list(&provider, |list| list.len() == 3).await;
    assert!(list.iter().all(|s| s.is_favourite));
    assert_eq!(provider.current_filter(), favourites);

    provider.set_filter(FilterSpec::SearchQuery("room 4".to_owned()));
    let list = wait_for_list(&provider, |list| list.len() == 1).await;
    assert_eq!(list[0].id, id(4));

    provider.set_filter(FilterSpec::ExcludeAll);
    wait_for_list(&provider, Vec::is_empty).await;

    provider.set_filter(FilterSpec::default());
    wait_for_list(&provider, |list| list.len() == 6).await;
    assert_eq!(source.filter(), compose_filter(&FilterSpec::default(), &FilterConfig::default()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn last_filter_wins_under_rapid_changes() {
    let source = Arc::new(SimSource::new());
    for n in 0..4 {
        source.add_room(room(n));
    }
    let mut provider = provider(&source, 10);
    provider.subscribe_if_necessary().await.unwrap();

    for n in 0..4 {
        provider.set_filter(FilterSpec::SearchQuery(format!("room {n}")));
    }
    let expected = compose_filter(&FilterSpec::SearchQuery("room 3".to_owned()), &FilterConfig::default());
    assert!(eventually(|| source.filter() == expected).await);

    let list = wait_for_list(&provider, |list| list.len() == 1).await;
    assert_eq!(list[0].id, id(3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pop_on_empty_faults_and_resubscribe_recovers() {
    let source = Arc::new(SimSource::new());
    let mut provider = provider(&source, 10);
    provider.subscribe_if_necessary().await.unwrap();
    filter_installed(&source).await;

    source.push_batch(vec![EditOperation::Append(vec![RawEntry::Room(id(1)), RawEntry::Room(id(2))])]);
    wait_for_list(&provider, |list| list.len() == 2).await;

    source.push_batch(vec![
        EditOperation::PopFront,
        EditOperation::PopFront,
        EditOperation::PopFront,
        EditOperation::Append(vec![RawEntry::Room(id(3))]),
    ]);
    assert!(eventually(|| provider.has_faulted()).await);
    assert!(provider.room_list().get().is_empty());
    // The diff subscription is released without waiting for another batch.
    assert!(eventually(|| !source.has_entries_subscriber()).await);

    // Later batches are never applied.
    source.push_batch(vec![EditOperation::Append(vec![RawEntry::Room(id(4))])]);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(provider.room_list().get().is_empty());

    source.add_room(room(7));
    provider.resubscribe().await.unwrap();
    assert!(!provider.has_faulted());
    let list = wait_for_list(&provider, |list| list.len() == 1).await;
    assert_eq!(list[0].id, id(7));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn resubscribe_starts_from_fresh_snapshot() {
    let source = Arc::new(SimSource::new());
    for n in 0..3 {
        source.add_room(room(n));
    }
    let mut provider = provider(&source, 10);
    source.set_loading_state(SourceLoadingState::Loaded { maximum: Some(3) });
    provider.subscribe_if_necessary().await.unwrap();
    wait_for_list(&provider, |list| list.len() == 3).await;

    source.set_loading_state(SourceLoadingState::NotLoaded);
    provider.resubscribe().await.unwrap();
    assert!(provider.is_subscribed());
    assert_eq!(provider.state().get(), ProviderState::NotLoaded);

    let history = StateHistory::record(&provider.state());
    source.remove_room(&id(0));
    source.set_loading_state(SourceLoadingState::Loaded { maximum: Some(2) });
    wait_for_list(&provider, |list| list.len() == 2).await;
    assert!(eventually(|| provider.state().get() == ProviderState::Loaded { total: 2 }).await);

    let snapshot = ProviderSnapshot::capture(&provider, &history).with_source(&source);
    InvariantRegistry::standard().assert_all(&snapshot, "after resubscribe");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn loading_state_never_regresses() {
    let source = Arc::new(SimSource::new());
    source.add_room(room(1));
    let mut provider = provider(&source, 10);
    provider.subscribe_if_necessary().await.unwrap();

    source.set_loading_state(SourceLoadingState::Loaded { maximum: None });
    assert!(eventually(|| provider.state().get() == ProviderState::Loaded { total: 1 }).await);

    source.set_loading_state(SourceLoadingState::NotLoaded);
    source.set_loading_state(SourceLoadingState::Loaded { maximum: Some(9) });
    assert!(eventually(|| provider.state().get() == ProviderState::Loaded { total: 9 }).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn subscription_failure_leaves_provider_unloaded() {
    let source = Arc::new(SimSource::new());
    source.add_room(room(1));
    source.fail_subscriptions(Some(SourceError::Unavailable("offline".to_owned())));

    let mut provider = provider(&source, 10);
    let err = provider.subscribe_if_necessary().await.unwrap_err();
    assert!(matches!(err, ProviderError::Subscribe(SourceError::Unavailable(_))));
    assert!(!provider.is_subscribed());
    assert_eq!(provider.state().get(), ProviderState::NotLoaded);
    assert!(provider.room_list().get().is_empty());

    source.fail_subscriptions(None);
    provider.subscribe_if_necessary().await.unwrap();
    wait_for_list(&provider, |list| list.len() == 1).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn subscribe_is_idempotent() {
    let source = Arc::new(SimSource::new());
    source.add_room(room(1));
    let mut provider = provider(&source, 10);
    provider.subscribe_if_necessary().await.unwrap();
    provider.subscribe_if_necessary().await.unwrap();

    let list = wait_for_list(&provider, |list| list.len() == 1).await;
    assert_eq!(list.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rebuild_reenriches_degraded_entries() {
    let source = Arc::new(SimSource::new());
    source.add_room(room(1));
    source.fail_enrichment(id(1));
    let mut provider = provider(&source, 10);
    provider.subscribe_if_necessary().await.unwrap();

    let list = wait_for_list(&provider, |list| list.len() == 1).await;
    assert!(list[0].is_degraded);

    source.clear_enrichment_failures();
    provider.rebuild_summaries();
    let list = wait_for_list(&provider, |list| list.first().is_some_and(|s| !s.is_degraded)).await;
    assert_eq!(list[0].name, "Room 1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_enrichment_times_out_to_degraded() {
    let source = Arc::new(SimSource::new());
    source.add_room(room(1));
    source.set_enrichment_delay(Duration::from_millis(500));
    let mut provider = provider(&source, 10);
    provider.subscribe_if_necessary().await.unwrap();

    let list = wait_for_list(&provider, |list| list.len() == 1).await;
    assert!(list[0].is_degraded);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_detaches_from_source() {
    let source = Arc::new(SimSource::new());
    source.add_room(room(1));
    let mut provider = provider(&source, 10);
    provider.subscribe_if_necessary().await.unwrap();
    wait_for_list(&provider, |list| list.len() == 1).await;

    provider.shutdown().await;
    assert!(!provider.is_subscribed());

    source.add_room(room(2));
    assert!(!source.has_entries_subscriber());
    assert_eq!(provider.room_list().get().len(), 1);
}
