//! Coarse-grained list edit operations emitted by the source.
//!
//! Operations address positions in the list as it stands when the operation
//! is applied, so they only make sense in arrival order.

/// One list mutation instruction from the source.
///
/// Generic over the element so the same operation can carry raw entries (as
/// received) and built rows (after enrichment) without a second enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOperation<T> {
    /// Append values at the end.
    Append(Vec<T>),
    /// Insert one value at an index.
    Insert {
        /// Target index.
        index: usize,
        /// Inserted value.
        value: T,
    },
    /// Remove the value at an index.
    Remove {
        /// Target index.
        index: usize,
    },
    /// Replace the value at an index.
    Set {
        /// Target index.
        index: usize,
        /// New value.
        value: T,
    },
    /// Insert at the front.
    PushFront(T),
    /// Insert at the back.
    PushBack(T),
    /// Remove the first value.
    PopFront,
    /// Remove the last value.
    PopBack,
    /// Replace the whole list.
    Reset(Vec<T>),
    /// Keep only the first `length` values.
    Truncate {
        /// Length to truncate to.
        length: usize,
    },
    /// Remove everything.
    Clear,
}

impl<T> EditOperation<T> {
    /// Short operation name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Append(_) => "append",
            Self::Insert { .. } => "insert",
            Self::Remove { .. } => "remove",
            Self::Set { .. } => "set",
            Self::PushFront(_) => "push_front",
            Self::PushBack(_) => "push_back",
            Self::PopFront => "pop_front",
            Self::PopBack => "pop_back",
            Self::Reset(_) => "reset",
            Self::Truncate { .. } => "truncate",
            Self::Clear => "clear",
        }
    }

    /// Transform every carried value, keeping positions.
    ///
    /// Values are visited in index order, which keeps enrichment calls in
    /// the order the source listed the entries.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> EditOperation<U> {
        match self {
            Self::Append(values) => EditOperation::Append(values.into_iter().map(f).collect()),
            Self::Insert { index, value } => EditOperation::Insert { index, value: f(value) },
            Self::Remove { index } => EditOperation::Remove { index },
            Self::Set { index, value } => EditOperation::Set { index, value: f(value) },
            Self::PushFront(value) => EditOperation::PushFront(f(value)),
            Self::PushBack(value) => EditOperation::PushBack(f(value)),
            Self::PopFront => EditOperation::PopFront,
            Self::PopBack => EditOperation::PopBack,
            Self::Reset(values) => EditOperation::Reset(values.into_iter().map(f).collect()),
            Self::Truncate { length } => EditOperation::Truncate { length },
            Self::Clear => EditOperation::Clear,
        }
    }

    /// Values carried by this operation.
    pub fn values(&self) -> Vec<&T> {
        match self {
            Self::Append(values) | Self::Reset(values) => values.iter().collect(),
            Self::Insert { value, .. }
            | Self::Set { value, .. }
            | Self::PushFront(value)
            | Self::PushBack(value) => vec![value],
            Self::Remove { .. }
            | Self::PopFront
            | Self::PopBack
            | Self::Truncate { .. }
            | Self::Clear => Vec::new(),
        }
    }
}
