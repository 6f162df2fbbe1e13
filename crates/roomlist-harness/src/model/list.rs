//! Reference list: plain `Vec` semantics for every operation.

use roomlist_core::{EditOperation, RawEntry, RoomId};

/// What the model did with one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    /// The list changed.
    Applied,
    /// Valid, but nothing changed.
    Unchanged,
    /// Out of bounds; the list is untouched.
    Skipped,
    /// Pop on an empty list.
    Fatal,
}

/// Reference implementation of the materialized list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelList {
    entries: Vec<RawEntry>,
    faulted: bool,
}

impl ModelList {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current entries.
    pub fn entries(&self) -> &[RawEntry] {
        &self.entries
    }

    /// Identifiers in list order.
    pub fn ids(&self) -> Vec<RoomId> {
        self.entries.iter().map(|e| e.id().clone()).collect()
    }

    /// True once a pop hit an empty list. Later operations are ignored.
    pub fn has_faulted(&self) -> bool {
        self.faulted
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: &EditOperation<RawEntry>) -> OperationResult {
        if self.faulted {
            return OperationResult::Fatal;
        }

        let before = self.entries.len();
        let entries = &mut self.entries;
        match op {
            EditOperation::Append(values) if values.is_empty() => OperationResult::Unchanged,
            EditOperation::Append(values) => {
                entries.extend(values.iter().cloned());
                OperationResult::Applied
            },
            EditOperation::Insert { index, value } => {
                if *index > before {
                    return OperationResult::Skipped;
                }
                entries.insert(*index, value.clone());
                OperationResult::Applied
            },
            EditOperation::Remove { index } => {
                if *index >= before {
                    return OperationResult::Skipped;
                }
                entries.remove(*index);
                OperationResult::Applied
            },
            EditOperation::Set { index, value } => match entries.get_mut(*index) {
                Some(slot) => {
                    *slot = value.clone();
                    OperationResult::Applied
                },
                None => OperationResult::Skipped,
            },
            EditOperation::PushFront(value) => {
                entries.insert(0, value.clone());
                OperationResult::Applied
            },
            EditOperation::PushBack(value) => {
                entries.push(value.clone());
                OperationResult::Applied
            },
            EditOperation::PopFront | EditOperation::PopBack if before == 0 => {
                self.faulted = true;
                OperationResult::Fatal
            },
            EditOperation::PopFront => {
                entries.remove(0);
                OperationResult::Applied
            },
            EditOperation::PopBack => {
                entries.pop();
                OperationResult::Applied
            },
            EditOperation::Reset(values) => {
                if before == 0 && values.is_empty() {
                    return OperationResult::Unchanged;
                }
                *entries = values.clone();
                OperationResult::Applied
            },
            EditOperation::Truncate { length } if *length >= before => OperationResult::Unchanged,
            EditOperation::Truncate { length } => {
                entries.truncate(*length);
                OperationResult::Applied
            },
            EditOperation::Clear if before == 0 => OperationResult::Unchanged,
            EditOperation::Clear => {
                entries.clear();
                OperationResult::Applied
            },
        }
    }
}
