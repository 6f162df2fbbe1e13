//! Materialized list store.
//!
//! Owns the ordered sequence of entries and applies source operations one at
//! a time in arrival order. Each successful operation replaces the whole list
//! and is published once, so observers only ever see states between
//! operations.
//!
//! The store is pure: enrichment and publishing are injected as closures,
//! which lets the runtime run it on its serial executor and lets tests run it
//! directly.

use std::collections::HashSet;

use crate::{
    entry::{RawEntry, RoomId},
    error::ListError,
    operation::EditOperation,
    script::translate,
    summary::Summary,
};

/// A raw entry together with its built summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Entry as delivered by the source.
    pub raw: RawEntry,
    /// Projection shown to the UI.
    pub summary: Summary,
}

/// Outcome of one applied batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Operations that changed the list.
    pub applied: usize,
    /// Operations that applied but changed nothing (e.g. truncate past end).
    pub unchanged: usize,
    /// Operations skipped after a recoverable error.
    pub skipped: usize,
    /// Identifiers present more than once after the batch.
    pub duplicates: Vec<RoomId>,
}

/// Ordered, authoritative list of entries for one source subscription.
#[derive(Debug, Default)]
pub struct RoomListStore {
    entries: Vec<ListEntry>,
}

impl RoomListStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current entries.
    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    /// Summaries in list order.
    pub fn snapshot(&self) -> Vec<Summary> {
        self.entries.iter().map(|e| e.summary.clone()).collect()
    }

    /// Apply a batch of operations in order.
    ///
    /// For each operation: build summaries for carried entries, translate to
    /// an edit script against the current list, apply it, and publish the new
    /// snapshot if the list changed. Recoverable errors skip the operation and
    /// the batch continues.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`ListError`]. Operations before it stay
    /// applied and published; operations after it are not processed.
    pub fn apply_batch<B, P>(
        &mut self,
        operations: Vec<EditOperation<RawEntry>>,
        mut build: B,
        mut publish: P,
    ) -> Result<BatchReport, ListError>
    where
        B: FnMut(&RawEntry) -> Summary,
        P: FnMut(Vec<Summary>),
    {
        let mut report = BatchReport::default();

        for operation in operations {
            let name = operation.name();
            let operation = operation.map(|raw| {
                let summary = build(&raw);
                ListEntry { raw, summary }
            });

            match self.apply_one(operation) {
                Ok(true) => {
                    tracing::trace!(operation = name, len = self.entries.len(), "applied");
                    report.applied += 1;
                    publish(self.snapshot());
                },
                Ok(false) => {
                    tracing::trace!(operation = name, "no change");
                    report.unchanged += 1;
                },
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    tracing::warn!(operation = name, error = %err, "skipping operation");
                    report.skipped += 1;
                },
            }
        }

        report.duplicates = self.duplicate_ids();
        if !report.duplicates.is_empty() {
            tracing::error!(
                duplicates = ?report.duplicates,
                "room list contains duplicate identifiers"
            );
        }

        Ok(report)
    }

    /// Rebuild every summary from its raw entry and publish once.
    ///
    /// Positions are unchanged.
    pub fn rebuild<B, P>(&mut self, mut build: B, mut publish: P)
    where
        B: FnMut(&RawEntry) -> Summary,
        P: FnMut(Vec<Summary>),
    {
        if self.entries.is_empty() {
            return;
        }

        self.entries = self
            .entries
            .iter()
            .map(|entry| ListEntry { raw: entry.raw.clone(), summary: build(&entry.raw) })
            .collect();
        publish(self.snapshot());
    }

    /// Identifiers that occur more than once, in first-duplicate order.
    pub fn duplicate_ids(&self) -> Vec<RoomId> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        self.entries
            .iter()
            .map(|e| &e.summary.id)
            .filter(|id| !seen.insert(*id) && reported.insert(*id))
            .cloned()
            .collect()
    }

    /// Returns whether the list changed.
    fn apply_one(&mut self, operation: EditOperation<ListEntry>) -> Result<bool, ListError> {
        let script = translate(operation, &self.entries)?;
        if script.is_empty() {
            return Ok(false);
        }
        self.entries = script.apply(&self.entries)?;
        Ok(true)
    }
}
