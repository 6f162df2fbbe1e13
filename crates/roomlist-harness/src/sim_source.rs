//! Simulated sync engine.
//!
//! [`SimSource`] plays both external collaborators: it owns a catalog of
//! rooms, serves the filtered and paginated window as a list subscription,
//! and answers enrichment lookups from the same catalog. Catalog mutations
//! and commands recompute the window and push the diff to the subscriber,
//! the way a real sliding-sync engine would.
//!
//! Failures are injectable per room (enrichment) and globally (subscribe).

use std::{
    cmp::Reverse,
    collections::{BTreeMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use roomlist_app::{
    EnrichmentGateway, EntriesSubscription, LoadingStateSubscription, RoomListSource, SourceError,
};
use roomlist_core::{
    EditOperation, EnrichmentError, LatestEvent, RawEntry, RoomId, RoomInfo, SourceCommand,
    SourceFilter, SourceLoadingState,
};
use tokio::sync::mpsc;

use crate::{diff::diff_windows, model::ModelList, sim_filter};

/// A room known to the simulated engine.
#[derive(Debug, Clone)]
pub struct SimRoom {
    /// Descriptive fields served by the gateway.
    pub info: RoomInfo,
    /// Latest event served by the gateway.
    pub latest_event: Option<LatestEvent>,
    /// Ordering key; higher sorts first.
    pub recency: u64,
    /// Child room previewing a space. Spaces without one are listed as
    /// plain rooms.
    pub space_preview: Option<RoomId>,
}

impl SimRoom {
    /// Joined group room with a display name.
    pub fn new(id: impl Into<RoomId>, name: &str) -> Self {
        Self {
            info: RoomInfo {
                id: id.into(),
                display_name: Some(name.to_owned()),
                active_members_count: 2,
                ..RoomInfo::default()
            },
            latest_event: None,
            recency: 0,
            space_preview: None,
        }
    }

    /// Room identifier.
    pub fn id(&self) -> &RoomId {
        &self.info.id
    }

    /// Display name, falling back to the identifier.
    pub fn name(&self) -> &str {
        self.info.display_name.as_deref().unwrap_or(self.info.id.as_str())
    }

    /// Entry the source lists for this room.
    pub fn raw_entry(&self) -> RawEntry {
        match &self.space_preview {
            Some(preview) if self.info.is_space => {
                RawEntry::Space { space: self.info.id.clone(), preview: preview.clone() }
            },
            _ => RawEntry::Room(self.info.id.clone()),
        }
    }
}

struct SimState {
    rooms: BTreeMap<RoomId, SimRoom>,
    next_recency: u64,

    filter: SourceFilter,
    page_size: u32,
    pages: u32,
    scope: Vec<RoomId>,
    window: Vec<RawEntry>,
    entries_tx: Option<mpsc::UnboundedSender<Vec<EditOperation<RawEntry>>>>,

    loading: SourceLoadingState,
    loading_tx: Option<mpsc::UnboundedSender<SourceLoadingState>>,

    commands: Vec<SourceCommand>,
    subscribe_failure: Option<SourceError>,
    failing_rooms: HashSet<RoomId>,
    injected_failures: HashSet<RoomId>,
    enrichment_delay: Duration,
    enrichment_calls: u64,
}

impl SimState {
    fn compute_window(&self) -> Vec<RawEntry> {
        let mut visible: Vec<&SimRoom> = self
            .rooms
            .values()
            .filter(|room| sim_filter::matches(&self.filter, room, &self.rooms))
            .collect();
        visible.sort_by(|a, b| (Reverse(a.recency), a.id()).cmp(&(Reverse(b.recency), b.id())));

        let limit = self.pages.max(1) as usize * self.page_size.max(1) as usize;
        visible.into_iter().take(limit).map(SimRoom::raw_entry).collect()
    }

    /// Recompute the window and push the diff, if anyone listens.
    fn refresh(&mut self) {
        let next = self.compute_window();
        let ops = diff_windows(&self.window, &next);
        self.window = next;
        if !ops.is_empty() {
            self.send_batch(ops);
        }
    }

    fn send_batch(&mut self, ops: Vec<EditOperation<RawEntry>>) {
        let Some(tx) = &self.entries_tx else {
            return;
        };
        tracing::trace!(ops = ops.len(), "sim source emitting batch");
        if tx.send(ops).is_err() {
            tracing::debug!("entries subscriber gone");
            self.entries_tx = None;
        }
    }

    fn bump(&mut self) -> u64 {
        self.next_recency += 1;
        self.next_recency
    }
}

/// Simulated list source and enrichment gateway over one room catalog.
pub struct SimSource {
    state: Mutex<SimState>,
}

impl Default for SimSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SimSource {
    /// Empty catalog, unfiltered, one page.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                rooms: BTreeMap::new(),
                next_recency: 0,
                filter: SourceFilter::All(Vec::new()),
                page_size: 1,
                pages: 1,
                scope: Vec::new(),
                window: Vec::new(),
                entries_tx: None,
                loading: SourceLoadingState::NotLoaded,
                loading_tx: None,
                commands: Vec::new(),
                subscribe_failure: None,
                failing_rooms: HashSet::new(),
                injected_failures: HashSet::new(),
                enrichment_delay: Duration::ZERO,
                enrichment_calls: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Catalog

    /// Add a room as the most recent one and push the resulting diff.
    pub fn add_room(&self, mut room: SimRoom) {
        let mut state = self.state();
        room.recency = state.bump();
        state.rooms.insert(room.id().clone(), room);
        state.refresh();
    }

    /// Register a room for enrichment without touching the window.
    ///
    /// Pair with [`push_batch`](Self::push_batch) to drive the list by hand.
    pub fn seed_room(&self, mut room: SimRoom) {
        let mut state = self.state();
        if room.recency == 0 {
            room.recency = state.bump();
        }
        state.rooms.insert(room.id().clone(), room);
    }

    /// Remove a room and push the resulting diff.
    pub fn remove_room(&self, id: &RoomId) {
        let mut state = self.state();
        if state.rooms.remove(id).is_some() {
            state.refresh();
        }
    }

    /// Mutate a room in place and push the resulting diff.
    ///
    /// Returns false if the room is unknown.
    pub fn update_room(&self, id: &RoomId, update: impl FnOnce(&mut SimRoom)) -> bool {
        let mut state = self.state();
        let Some(room) = state.rooms.get_mut(id) else {
            return false;
        };
        update(room);
        state.refresh();
        true
    }

    /// New message in a room: sets the latest event, counts it unread and
    /// moves the room to the top.
    pub fn post_message(&self, id: &RoomId, event: LatestEvent) -> bool {
        let mut state = self.state();
        let recency = state.bump();
        let Some(room) = state.rooms.get_mut(id) else {
            return false;
        };
        room.latest_event = Some(event);
        room.info.num_unread_messages += 1;
        room.recency = recency;
        state.refresh();
        true
    }

    /// Push a raw batch to the subscriber, bypassing the catalog.
    ///
    /// The window tracks the batch with plain list semantics so later
    /// catalog diffs start from what the subscriber saw.
    pub fn push_batch(&self, ops: Vec<EditOperation<RawEntry>>) {
        let mut state = self.state();
        let mut window = ModelList::new();
        window.apply(&EditOperation::Reset(state.window.clone()));
        for op in &ops {
            window.apply(op);
        }
        state.window = window.entries().to_vec();
        state.send_batch(ops);
    }

    /// Report a loading state.
    pub fn set_loading_state(&self, loading: SourceLoadingState) {
        let mut state = self.state();
        state.loading = loading;
        let closed = state.loading_tx.as_ref().is_some_and(|tx| tx.send(loading).is_err());
        if closed {
            state.loading_tx = None;
        }
    }

    // Failure injection

    /// Make enrichment of `id` fail.
    pub fn fail_enrichment(&self, id: impl Into<RoomId>) {
        let id = id.into();
        let mut state = self.state();
        state.injected_failures.insert(id.clone());
        state.failing_rooms.insert(id);
    }

    /// Make every enrichment lookup succeed again.
    pub fn clear_enrichment_failures(&self) {
        self.state().failing_rooms.clear();
    }

    /// Delay every enrichment lookup.
    pub fn set_enrichment_delay(&self, delay: Duration) {
        self.state().enrichment_delay = delay;
    }

    /// Make subscriptions fail with `error`, or succeed again with `None`.
    pub fn fail_subscriptions(&self, error: Option<SourceError>) {
        self.state().subscribe_failure = error;
    }

    // Inspection

    /// Identifiers in the current window.
    pub fn window_ids(&self) -> Vec<RoomId> {
        self.state().window.iter().map(|e| e.id().clone()).collect()
    }

    /// Current window.
    pub fn window(&self) -> Vec<RawEntry> {
        self.state().window.clone()
    }

    /// Every command received, in order.
    pub fn commands(&self) -> Vec<SourceCommand> {
        self.state().commands.clone()
    }

    /// Forget recorded commands.
    pub fn clear_commands(&self) {
        self.state().commands.clear();
    }

    /// Filter installed by the last `SetFilter`.
    pub fn filter(&self) -> SourceFilter {
        self.state().filter.clone()
    }

    /// Pages currently served.
    pub fn pages(&self) -> u32 {
        self.state().pages
    }

    /// Identifiers the last `SubscribeToIds` asked for.
    pub fn scope(&self) -> Vec<RoomId> {
        self.state().scope.clone()
    }

    /// True while an entries subscriber is attached.
    pub fn has_entries_subscriber(&self) -> bool {
        self.state().entries_tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Enrichment lookups served so far.
    pub fn enrichment_calls(&self) -> u64 {
        self.state().enrichment_calls
    }

    /// True if enrichment of `id` is set to fail.
    pub fn is_failing(&self, id: &RoomId) -> bool {
        self.state().failing_rooms.contains(id)
    }

    /// Every room whose enrichment was ever made to fail, cleared or not.
    pub fn injected_failures(&self) -> HashSet<RoomId> {
        self.state().injected_failures.clone()
    }

    /// Catalog snapshot.
    pub fn rooms(&self) -> Vec<SimRoom> {
        self.state().rooms.values().cloned().collect()
    }

    fn begin_lookup(&self) -> Duration {
        let mut state = self.state();
        state.enrichment_calls += 1;
        state.enrichment_delay
    }
}

impl RoomListSource for SimSource {
    async fn subscribe_entries(&self, page_size: u32) -> Result<EntriesSubscription, SourceError> {
        let mut state = self.state();
        if let Some(err) = state.subscribe_failure.clone() {
            return Err(err);
        }

        let (tx, updates) = mpsc::unbounded_channel();
        state.page_size = page_size;
        state.pages = 1;
        state.entries_tx = Some(tx);
        state.window = state.compute_window();
        tracing::debug!(page_size, entries = state.window.len(), "sim entries subscription");

        Ok(EntriesSubscription { initial: state.window.clone(), updates })
    }

    async fn subscribe_loading_state(&self) -> Result<LoadingStateSubscription, SourceError> {
        let mut state = self.state();
        if let Some(err) = state.subscribe_failure.clone() {
            return Err(err);
        }

        let (tx, updates) = mpsc::unbounded_channel();
        state.loading_tx = Some(tx);
        Ok(LoadingStateSubscription { initial: state.loading, updates })
    }

    async fn send_command(&self, command: SourceCommand) -> Result<(), SourceError> {
        let mut state = self.state();
        tracing::trace!(command = command.name(), "sim source command");
        state.commands.push(command.clone());

        match command {
            SourceCommand::SetFilter(filter) => state.filter = filter,
            SourceCommand::AddOnePage => state.pages += 1,
            SourceCommand::ResetToOnePage => state.pages = 1,
            SourceCommand::SubscribeToIds(ids) => {
                state.scope = ids;
                return Ok(());
            },
        }
        state.refresh();
        Ok(())
    }
}

impl EnrichmentGateway for SimSource {
    async fn room_info(&self, id: &RoomId) -> Result<RoomInfo, EnrichmentError> {
        let delay = self.begin_lookup();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let state = self.state();
        if state.failing_rooms.contains(id) {
            return Err(EnrichmentError::Unavailable(format!("injected failure for {id}")));
        }
        state.rooms.get(id).map(|room| room.info.clone()).ok_or_else(|| EnrichmentError::NotFound(id.to_string()))
    }

    async fn latest_event(&self, id: &RoomId) -> Result<Option<LatestEvent>, EnrichmentError> {
        let state = self.state();
        if state.failing_rooms.contains(id) {
            return Err(EnrichmentError::Unavailable(format!("injected failure for {id}")));
        }
        Ok(state.rooms.get(id).and_then(|room| room.latest_event.clone()))
    }
}
