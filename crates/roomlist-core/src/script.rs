//! Edit scripts and the operation translator.
//!
//! An [`EditScript`] is an ordered set of primitive insertions and removals,
//! applied atomically with collection-difference semantics:
//!
//! - removal offsets refer to the list *before* the script
//! - insertion offsets refer to the list *after* the script
//! - removals are applied from the highest offset down, then insertions from
//!   the lowest offset up
//!
//! [`translate`] derives a script from one [`EditOperation`] against the
//! current list. Every operation kind, including the ones with no direct
//! analog (reset, truncate, clear), becomes removals followed by insertions,
//! so a replace is never an in-place mutation.

use std::collections::BTreeSet;

use crate::{error::ListError, operation::EditOperation};

/// One primitive change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change<T> {
    /// Insert `element` so that it ends up at `offset`.
    Insert {
        /// Offset in the resulting list.
        offset: usize,
        /// Inserted element.
        element: T,
    },
    /// Remove `element`, found at `offset` in the original list.
    Remove {
        /// Offset in the original list.
        offset: usize,
        /// Removed element.
        element: T,
    },
}

/// Validated sequence of changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditScript<T> {
    /// Removals, sorted by ascending offset.
    removals: Vec<(usize, T)>,
    /// Insertions, sorted by ascending offset.
    insertions: Vec<(usize, T)>,
}

impl<T> Default for EditScript<T> {
    fn default() -> Self {
        Self { removals: Vec::new(), insertions: Vec::new() }
    }
}

impl<T: Clone> EditScript<T> {
    /// Build a script from changes.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::InvalidScript`] if two removals or two insertions
    /// share an offset.
    pub fn new(changes: Vec<Change<T>>) -> Result<Self, ListError> {
        let mut removals = Vec::new();
        let mut insertions = Vec::new();
        let mut removal_offsets = BTreeSet::new();
        let mut insertion_offsets = BTreeSet::new();

        for change in changes {
            match change {
                Change::Remove { offset, element } => {
                    if !removal_offsets.insert(offset) {
                        return Err(ListError::InvalidScript(format!(
                            "duplicate removal at offset {offset}"
                        )));
                    }
                    removals.push((offset, element));
                },
                Change::Insert { offset, element } => {
                    if !insertion_offsets.insert(offset) {
                        return Err(ListError::InvalidScript(format!(
                            "duplicate insertion at offset {offset}"
                        )));
                    }
                    insertions.push((offset, element));
                },
            }
        }

        removals.sort_by_key(|(offset, _)| *offset);
        insertions.sort_by_key(|(offset, _)| *offset);

        Ok(Self { removals, insertions })
    }

    /// Number of primitive changes.
    pub fn len(&self) -> usize {
        self.removals.len() + self.insertions.len()
    }

    /// True if the script changes nothing.
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.insertions.is_empty()
    }

    /// Removals as (offset, element), ascending.
    pub fn removals(&self) -> &[(usize, T)] {
        &self.removals
    }

    /// Insertions as (offset, element), ascending.
    pub fn insertions(&self) -> &[(usize, T)] {
        &self.insertions
    }

    /// Apply the script, producing a new list.
    ///
    /// The input is never modified; on error the caller keeps its list.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::IndexOutOfBounds`] if a removal offset is not in
    /// the original list or an insertion offset is past the end of the list
    /// being built.
    pub fn apply(&self, list: &[T]) -> Result<Vec<T>, ListError> {
        let mut result = list.to_vec();

        for (offset, _) in self.removals.iter().rev() {
            if *offset >= result.len() {
                return Err(ListError::IndexOutOfBounds {
                    operation: "apply_removal",
                    index: *offset,
                    len: list.len(),
                });
            }
            result.remove(*offset);
        }

        for (offset, element) in &self.insertions {
            if *offset > result.len() {
                return Err(ListError::IndexOutOfBounds {
                    operation: "apply_insertion",
                    index: *offset,
                    len: result.len(),
                });
            }
            result.insert(*offset, element.clone());
        }

        Ok(result)
    }
}

/// Derive the edit script for `operation` against `current`.
///
/// # Errors
///
/// - [`ListError::IndexOutOfBounds`] when `remove`/`set` reference a missing
///   element (recoverable)
/// - [`ListError::Underflow`] when `pop_front`/`pop_back` hit an empty list
///   (fatal)
pub fn translate<T: Clone>(
    operation: EditOperation<T>,
    current: &[T],
) -> Result<EditScript<T>, ListError> {
    let len = current.len();
    let name = operation.name();
    let element_at = |index: usize| {
        current
            .get(index)
            .cloned()
            .ok_or(ListError::IndexOutOfBounds { operation: name, index, len })
    };

    let changes = match operation {
        EditOperation::Append(values) => values
            .into_iter()
            .enumerate()
            .map(|(i, element)| Change::Insert { offset: len + i, element })
            .collect(),
        EditOperation::Insert { index, value } => {
            vec![Change::Insert { offset: index, element: value }]
        },
        EditOperation::Remove { index } => {
            vec![Change::Remove { offset: index, element: element_at(index)? }]
        },
        EditOperation::Set { index, value } => vec![
            Change::Remove { offset: index, element: element_at(index)? },
            Change::Insert { offset: index, element: value },
        ],
        EditOperation::PushFront(value) => vec![Change::Insert { offset: 0, element: value }],
        EditOperation::PushBack(value) => vec![Change::Insert { offset: len, element: value }],
        EditOperation::PopFront => {
            let element = current.first().cloned().ok_or(ListError::Underflow { operation: name })?;
            vec![Change::Remove { offset: 0, element }]
        },
        EditOperation::PopBack => {
            let element = current.last().cloned().ok_or(ListError::Underflow { operation: name })?;
            vec![Change::Remove { offset: len - 1, element }]
        },
        EditOperation::Reset(values) => remove_from(current, 0)
            .chain(
                values
                    .into_iter()
                    .enumerate()
                    .map(|(offset, element)| Change::Insert { offset, element }),
            )
            .collect(),
        EditOperation::Truncate { length } => remove_from(current, length).collect(),
        EditOperation::Clear => remove_from(current, 0).collect(),
    };

    EditScript::new(changes)
}

/// Removals for every element at or after `start`, in index order.
fn remove_from<T: Clone>(current: &[T], start: usize) -> impl Iterator<Item = Change<T>> + '_ {
    current
        .iter()
        .enumerate()
        .skip(start)
        .map(|(offset, element)| Change::Remove { offset, element: element.clone() })
}
