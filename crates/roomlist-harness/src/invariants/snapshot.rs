//! Observable state snapshots for invariant checking.
//!
//! Invariants run on snapshots rather than live observables, so one check
//! sees one consistent moment.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use roomlist_app::{EnrichmentGateway, Observable, RoomListSource, RoomSummaryProvider};
use roomlist_core::{ProviderState, RawEntry, RoomId, Summary};
use tokio::task::JoinHandle;

use crate::sim_source::SimSource;

/// Snapshot of one provider plus, optionally, the source's ground truth.
#[derive(Debug, Clone, Default)]
pub struct ProviderSnapshot {
    /// Materialized list.
    pub list: Vec<Summary>,
    /// Current loading state.
    pub state: ProviderState,
    /// Every loading state observed, oldest first.
    pub state_history: Vec<ProviderState>,
    /// Diff processing stopped on a fatal error.
    pub faulted: bool,
    /// Window the source last served. `None` when unknown.
    pub source_window: Option<Vec<RawEntry>>,
    /// Rooms the source knows.
    pub known_rooms: HashSet<RoomId>,
    /// Rooms whose enrichment was ever made to fail.
    pub failed_rooms: HashSet<RoomId>,
}

impl ProviderSnapshot {
    /// Empty list, not loaded, no source.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Capture a provider's observables.
    pub fn capture<S, G>(provider: &RoomSummaryProvider<S, G>, history: &StateHistory) -> Self
    where
        S: RoomListSource,
        G: EnrichmentGateway,
    {
        Self {
            list: provider.room_list().get(),
            state: provider.state().get(),
            state_history: history.states(),
            faulted: provider.has_faulted(),
            ..Self::default()
        }
    }

    /// Attach the simulated source's ground truth.
    pub fn with_source(mut self, source: &SimSource) -> Self {
        self.source_window = Some(source.window());
        self.known_rooms = source.rooms().into_iter().map(|room| room.info.id).collect();
        self.failed_rooms = source.injected_failures();
        self
    }

    /// Identifiers in list order.
    pub fn list_ids(&self) -> Vec<RoomId> {
        self.list.iter().map(|summary| summary.id.clone()).collect()
    }
}

/// Records every loading state a provider publishes.
pub struct StateHistory {
    states: Arc<Mutex<Vec<ProviderState>>>,
    task: JoinHandle<()>,
}

impl StateHistory {
    /// Start recording. Must run inside a tokio runtime.
    pub fn record(state: &Observable<ProviderState>) -> Self {
        let mut subscriber = state.subscribe();
        let states = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&states);
        let task = tokio::spawn(async move {
            while let Some(next) = subscriber.next().await {
                sink.lock().unwrap_or_else(PoisonError::into_inner).push(next);
            }
        });
        Self { states, task }
    }

    /// States recorded so far.
    pub fn states(&self) -> Vec<ProviderState> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Forget recorded states, e.g. after a resubscribe.
    pub fn clear(&self) {
        self.states.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Drop for StateHistory {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot() {
        let snapshot = ProviderSnapshot::empty();
        assert!(snapshot.list.is_empty());
        assert_eq!(snapshot.state, ProviderState::NotLoaded);
        assert!(snapshot.source_window.is_none());
    }
}
