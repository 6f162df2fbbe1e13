//! Seeded random sessions.
//!
//! A [`RandomSession`] generates a reproducible stream of [`SessionStep`]s:
//! catalog churn on the simulated source (new rooms, messages, tag changes,
//! departures), user actions on the provider (filters, scrolling, rebuilds)
//! and injected enrichment failures. Same seed, same steps.

use std::collections::BTreeSet;

use rand::{Rng, SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;
use roomlist_app::RoomSummaryProvider;
use roomlist_core::{
    EventSender, FilterSpec, LatestEvent, MessageContent, RoomFilter, RoomId, ViewportRange,
};

use crate::sim_source::{SimRoom, SimSource};

const NAMES: &[&str] = &[
    "General", "Random", "Engineering", "Design", "Café", "Support", "Releases", "Ops", "Alice",
    "Bob", "Carol", "Dave", "Standup", "Book Club",
];

const QUERIES: &[&str] = &["eng", "ca", "o", "book", "xyz", "al"];

const FILTERS: &[RoomFilter] = &[
    RoomFilter::Unreads,
    RoomFilter::People,
    RoomFilter::Rooms,
    RoomFilter::Favourites,
    RoomFilter::LowPriority,
    RoomFilter::Invites,
];

/// One step of a random session.
#[derive(Debug, Clone)]
pub enum SessionStep {
    /// New room appears.
    AddRoom(SimRoom),
    /// Room is gone (left or forgotten).
    RemoveRoom(RoomId),
    /// New message in a room.
    PostMessage(RoomId, LatestEvent),
    /// Room tags flipped.
    ToggleFavourite(RoomId),
    /// Unread counters reset.
    MarkRead(RoomId),
    /// Enrichment of a room starts failing.
    FailEnrichment(RoomId),
    /// User picked a filter.
    SetFilter(FilterSpec),
    /// User scrolled.
    Scroll(ViewportRange),
    /// Summaries rebuilt.
    Rebuild,
}

impl SessionStep {
    /// Apply the step to the source or the provider.
    pub fn apply(self, source: &SimSource, provider: &RoomSummaryProvider<SimSource, SimSource>) {
        tracing::debug!(step = ?self, "session step");
        match self {
            Self::AddRoom(room) => source.add_room(room),
            Self::RemoveRoom(id) => source.remove_room(&id),
            Self::PostMessage(id, event) => {
                source.post_message(&id, event);
            },
            Self::ToggleFavourite(id) => {
                source.update_room(&id, |room| room.info.is_favourite = !room.info.is_favourite);
            },
            Self::MarkRead(id) => {
                source.update_room(&id, |room| {
                    room.info.num_unread_messages = 0;
                    room.info.num_unread_mentions = 0;
                    room.info.is_marked_unread = false;
                });
            },
            Self::FailEnrichment(id) => source.fail_enrichment(id),
            Self::SetFilter(spec) => provider.set_filter(spec),
            Self::Scroll(range) => provider.update_visible_range(range),
            Self::Rebuild => provider.rebuild_summaries(),
        }
    }
}

/// Reproducible generator of session steps.
pub struct RandomSession {
    rng: ChaCha8Rng,
    next_room: u64,
    clock_ms: u64,
    failure_rate: f64,
}

impl RandomSession {
    /// Session seeded with `seed`, no injected failures.
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed), next_room: 0, clock_ms: 0, failure_rate: 0.0 }
    }

    /// Probability that a step injects an enrichment failure, clamped to
    /// `[0, 1]`.
    #[must_use]
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// A fresh random room.
    pub fn room(&mut self) -> SimRoom {
        self.next_room += 1;
        let name = NAMES.choose(&mut self.rng).copied().unwrap_or("Room");
        let mut room = SimRoom::new(format!("!room{}:sim", self.next_room), name);
        room.info.is_direct = self.rng.gen_bool(0.3);
        room.info.is_favourite = self.rng.gen_bool(0.2);
        room.info.is_low_priority = self.rng.gen_bool(0.1);
        room.info.num_unread_messages = self.rng.gen_range(0..3);
        room
    }

    /// Next step, given the source's current catalog.
    pub fn next_step(&mut self, source: &SimSource) -> SessionStep {
        let rooms = source.rooms();
        let pick = |rng: &mut ChaCha8Rng| rooms.choose(rng).map(|room| room.id().clone());

        if self.rng.gen_bool(self.failure_rate) {
            if let Some(id) = pick(&mut self.rng) {
                return SessionStep::FailEnrichment(id);
            }
        }

        let roll = self.rng.gen_range(0..100);
        let target = if rooms.len() < 3 { None } else { pick(&mut self.rng) };
        match (roll, target) {
            (0..30, Some(id)) => SessionStep::PostMessage(id, self.message()),
            (30..40, Some(id)) => SessionStep::ToggleFavourite(id),
            (40..48, Some(id)) => SessionStep::MarkRead(id),
            (48..53, Some(id)) => SessionStep::RemoveRoom(id),
            (53..63, _) => SessionStep::SetFilter(self.filter()),
            (63..78, _) => SessionStep::Scroll(self.range(rooms.len())),
            (78..81, _) => SessionStep::Rebuild,
            _ => SessionStep::AddRoom(self.room()),
        }
    }

    fn message(&mut self) -> LatestEvent {
        self.clock_ms += self.rng.gen_range(1_000..60_000);
        LatestEvent::Remote {
            timestamp_ms: self.clock_ms,
            sender: EventSender {
                user_id: format!("@user{}:sim", self.rng.gen_range(0..5)),
                display_name: None,
            },
            is_own: self.rng.gen_bool(0.2),
            content: MessageContent::Text { body: "hello".to_owned() },
        }
    }

    fn filter(&mut self) -> FilterSpec {
        match self.rng.gen_range(0..10) {
            0 => FilterSpec::ExcludeAll,
            1 | 2 => {
                let query = QUERIES.choose(&mut self.rng).copied().unwrap_or_default();
                FilterSpec::SearchQuery(query.to_owned())
            },
            3..=5 => FilterSpec::default(),
            _ => {
                let count = self.rng.gen_range(1..=2);
                let selected: BTreeSet<RoomFilter> =
                    FILTERS.choose_multiple(&mut self.rng, count).copied().collect();
                FilterSpec::ComposedFilters(selected)
            },
        }
    }

    fn range(&mut self, len: usize) -> ViewportRange {
        let len = len.max(1);
        let start = self.rng.gen_range(0..len);
        let end = (start + self.rng.gen_range(1..=10)).min(len + 5);
        ViewportRange::new(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_rooms() {
        let mut a = RandomSession::new(7);
        let mut b = RandomSession::new(7);
        for _ in 0..10 {
            let (ra, rb) = (a.room(), b.room());
            assert_eq!(ra.info, rb.info);
        }
    }

    #[test]
    fn empty_catalog_only_grows_or_acts_on_provider() {
        let source = SimSource::new();
        let mut session = RandomSession::new(1);
        for _ in 0..50 {
            let step = session.next_step(&source);
            assert!(!matches!(
                step,
                SessionStep::RemoveRoom(_)
                    | SessionStep::PostMessage(..)
                    | SessionStep::ToggleFavourite(_)
                    | SessionStep::MarkRead(_)
                    | SessionStep::FailEnrichment(_)
            ));
        }
    }
}
