//! Viewport throttling.
//!
//! The UI reports its visible range at scroll frequency. [`ViewportThrottler`]
//! keeps only the latest report and evaluates it at most once per debounce
//! window, deriving a paging command and, for providers that forward it, the
//! set of visible identifiers the source should keep detail subscriptions for.
//!
//! The throttler is a pure state machine over instants supplied by the
//! caller. The runtime drives it from a timer; tests drive it with synthetic
//! time.

use std::{ops::Range, time::Duration};

use crate::{command::SourceCommand, entry::RoomId, summary::Summary};

/// Half-open index range into the current list. `start >= end` is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportRange {
    /// First visible index.
    pub start: usize,
    /// One past the last visible index.
    pub end: usize,
}

impl ViewportRange {
    /// Range `start..end`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Nothing visible.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True if no index is visible.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl From<Range<usize>> for ViewportRange {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Viewport-related settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportConfig {
    /// Minimum time between two evaluations.
    pub debounce: Duration,
    /// Upper bound on the number of identifiers in one scope update.
    pub max_scope_width: usize,
    /// Derive and forward subscription scope updates.
    pub forward_visible_range: bool,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self { debounce: Duration::from_millis(500), max_scope_width: 40, forward_visible_range: false }
    }
}

/// Paging decision for one evaluated range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCommand {
    /// The range reaches the end of the list.
    AddOnePage,
    /// The range starts at the top.
    ResetToOnePage,
}

/// Commands derived from one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewportOutcome {
    /// Paging command, if any.
    pub page: Option<PageCommand>,
    /// New subscription scope, if it changed.
    pub scope: Option<Vec<RoomId>>,
}

impl ViewportOutcome {
    /// True if nothing needs to be sent.
    pub fn is_empty(&self) -> bool {
        self.page.is_none() && self.scope.is_none()
    }

    /// Source commands, paging first.
    pub fn into_commands(self) -> Vec<SourceCommand> {
        let page = self.page.map(|page| match page {
            PageCommand::AddOnePage => SourceCommand::AddOnePage,
            PageCommand::ResetToOnePage => SourceCommand::ResetToOnePage,
        });
        page.into_iter().chain(self.scope.map(SourceCommand::SubscribeToIds)).collect()
    }
}

/// Latest-wins throttler for visible range reports.
#[derive(Debug)]
pub struct ViewportThrottler<I> {
    config: ViewportConfig,
    pending: Option<ViewportRange>,
    /// When the current window opened. `None` when idle.
    window_opened: Option<I>,
    last_evaluated: Option<(ViewportRange, usize)>,
    last_scope: Option<Vec<RoomId>>,
}

impl<I> ViewportThrottler<I>
where
    I: Copy + Ord + std::ops::Sub<Output = Duration>,
{
    /// Create an idle throttler.
    pub fn new(config: ViewportConfig) -> Self {
        Self { config, pending: None, window_opened: None, last_evaluated: None, last_scope: None }
    }

    /// Record a report, replacing any pending one.
    ///
    /// The first report after an evaluation opens a new window; later
    /// reports only replace the value.
    pub fn record(&mut self, range: ViewportRange, now: I) {
        self.pending = Some(range);
        if self.window_opened.is_none() {
            self.window_opened = Some(now);
        }
    }

    /// Forget what was evaluated so far, for a list that starts over.
    ///
    /// A pending report and its window are kept.
    pub fn reset(&mut self) {
        self.last_evaluated = None;
        self.last_scope = None;
    }

    /// Time left until [`poll`](Self::poll) evaluates. `None` when idle.
    pub fn next_deadline(&self, now: I) -> Option<Duration> {
        self.window_opened.map(|opened| self.config.debounce.saturating_sub(elapsed(opened, now)))
    }

    /// Evaluate the latest report if its window has elapsed.
    ///
    /// `list` is the current materialized list; the paging decision compares
    /// against its length and the scope is read from it.
    pub fn poll(&mut self, now: I, list: &[Summary]) -> Option<ViewportOutcome> {
        let opened = self.window_opened?;
        if elapsed(opened, now) < self.config.debounce {
            return None;
        }

        self.window_opened = None;
        let range = self.pending.take()?;
        if range.is_empty() {
            return None;
        }

        let outcome = ViewportOutcome { page: self.page_command(range, list.len()), scope: self.scope(range, list) };
        if outcome.is_empty() { None } else { Some(outcome) }
    }

    fn page_command(&mut self, range: ViewportRange, len: usize) -> Option<PageCommand> {
        if self.last_evaluated == Some((range, len)) {
            return None;
        }
        self.last_evaluated = Some((range, len));

        if range.end >= len {
            Some(PageCommand::AddOnePage)
        } else if range.start == 0 {
            Some(PageCommand::ResetToOnePage)
        } else {
            None
        }
    }

    fn scope(&mut self, range: ViewportRange, list: &[Summary]) -> Option<Vec<RoomId>> {
        if !self.config.forward_visible_range {
            return None;
        }

        let end = range.end.min(list.len()).min(range.start.saturating_add(self.config.max_scope_width));
        let ids: Vec<RoomId> =
            list.get(range.start..end).unwrap_or_default().iter().map(|s| s.id.clone()).collect();

        if ids.is_empty() || self.last_scope.as_ref() == Some(&ids) {
            return None;
        }
        self.last_scope = Some(ids.clone());
        Some(ids)
    }
}

/// `now - earlier`, or zero if the clock was handed out of order.
fn elapsed<I>(earlier: I, now: I) -> Duration
where
    I: Copy + Ord + std::ops::Sub<Output = Duration>,
{
    if now > earlier { now - earlier } else { Duration::ZERO }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Instant;

    use proptest::prelude::*;

    use super::*;
    use crate::entry::RawEntry;

    const DEBOUNCE: Duration = Duration::from_millis(500);

    fn list(len: usize) -> Vec<Summary> {
        (0..len).map(|i| Summary::degraded(&RawEntry::Room(format!("!r{i}").into()))).collect()
    }

    fn throttler(forward: bool) -> ViewportThrottler<Instant> {
        ViewportThrottler::new(ViewportConfig {
            debounce: DEBOUNCE,
            max_scope_width: 4,
            forward_visible_range: forward,
        })
    }

    #[test]
    fn nothing_happens_before_the_window_elapses() {
        let start = Instant::now();
        let mut t = throttler(false);
        t.record((40..50).into(), start);

        assert_eq!(t.poll(start + Duration::from_millis(100), &list(50)), None);
        assert_eq!(t.next_deadline(start + Duration::from_millis(100)), Some(Duration::from_millis(400)));
    }

    #[test]
    fn range_reaching_the_end_adds_a_page() {
        let start = Instant::now();
        let mut t = throttler(false);
        t.record((40..50).into(), start);

        let outcome = t.poll(start + DEBOUNCE, &list(50)).unwrap();
        assert_eq!(outcome.page, Some(PageCommand::AddOnePage));
        assert_eq!(t.next_deadline(start + DEBOUNCE), None);
    }

    #[test]
    fn range_at_top_resets_paging() {
        let start = Instant::now();
        let mut t = throttler(false);
        t.record((40..50).into(), start);
        t.poll(start + DEBOUNCE, &list(50)).unwrap();

        let later = start + DEBOUNCE;
        t.record((0..5).into(), later);
        let outcome = t.poll(later + DEBOUNCE, &list(50)).unwrap();
        assert_eq!(outcome.page, Some(PageCommand::ResetToOnePage));
    }

    #[test]
    fn middle_of_list_does_nothing() {
        let start = Instant::now();
        let mut t = throttler(false);
        t.record((10..20).into(), start);
        assert_eq!(t.poll(start + DEBOUNCE, &list(50)), None);
    }

    #[test]
    fn latest_report_wins_within_a_window() {
        let start = Instant::now();
        let mut t = throttler(false);
        t.record((40..50).into(), start);
        t.record((10..20).into(), start + Duration::from_millis(10));
        t.record((0..5).into(), start + Duration::from_millis(20));

        let outcome = t.poll(start + DEBOUNCE, &list(50)).unwrap();
        assert_eq!(outcome.page, Some(PageCommand::ResetToOnePage));
    }

    #[test]
    fn repeated_identical_ranges_evaluate_once() {
        let start = Instant::now();
        let mut t = throttler(false);
        let items = list(50);
        let mut pages = 0;

        for window in 0..5u32 {
            let at = start + DEBOUNCE * window;
            t.record((40..50).into(), at);
            t.record((40..50).into(), at);
            if let Some(outcome) = t.poll(at + DEBOUNCE, &items) {
                pages += usize::from(outcome.page.is_some());
            }
        }

        assert_eq!(pages, 1);
    }

    #[test]
    fn reset_allows_the_same_range_again() {
        let start = Instant::now();
        let mut t = throttler(true);
        t.record((40..50).into(), start);
        assert!(t.poll(start + DEBOUNCE, &list(50)).is_some());

        let later = start + DEBOUNCE;
        t.record((40..50).into(), later);
        t.reset();
        let outcome = t.poll(later + DEBOUNCE, &list(50)).unwrap();
        assert_eq!(outcome.page, Some(PageCommand::AddOnePage));
        assert_eq!(outcome.scope.map(|ids| ids.len()), Some(4));
    }

    #[test]
    fn empty_range_is_ignored() {
        let start = Instant::now();
        let mut t = throttler(true);
        t.record(ViewportRange::empty(), start);
        assert_eq!(t.poll(start + DEBOUNCE, &list(10)), None);
    }

    #[test]
    fn scope_is_clamped_and_deduplicated() {
        let start = Instant::now();
        let mut t = throttler(true);
        let items = list(50);

        t.record((10..30).into(), start);
        let outcome = t.poll(start + DEBOUNCE, &items).unwrap();
        let scope = outcome.scope.unwrap();
        assert_eq!(scope.len(), 4);
        assert_eq!(scope[0].as_str(), "!r10");

        // Same visible ids again: no new scope.
        let later = start + DEBOUNCE;
        t.record((10..31).into(), later);
        assert_eq!(t.poll(later + DEBOUNCE, &items), None);
    }

    #[test]
    fn scope_is_not_derived_unless_forwarding() {
        let start = Instant::now();
        let mut t = throttler(false);
        t.record((0..5).into(), start);
        let outcome = t.poll(start + DEBOUNCE, &list(50)).unwrap();
        assert_eq!(outcome.scope, None);
        assert_eq!(outcome.into_commands(), vec![SourceCommand::ResetToOnePage]);
    }

    proptest! {
        #[test]
        fn only_the_last_report_is_evaluated(
            ranges in prop::collection::vec((0usize..60, 1usize..20), 1..20),
            len in 1usize..80,
        ) {
            let start = Instant::now();
            let items = list(len);
            let mut t = throttler(true);
            for (i, (s, w)) in ranges.iter().enumerate() {
                t.record(ViewportRange::new(*s, s + w), start + Duration::from_millis(i as u64));
            }
            let outcome = t.poll(start + DEBOUNCE * 2, &items);

            let (s, w) = ranges[ranges.len() - 1];
            let mut fresh = throttler(true);
            fresh.record(ViewportRange::new(s, s + w), start);
            prop_assert_eq!(outcome, fresh.poll(start + DEBOUNCE, &items));
        }
    }
}
