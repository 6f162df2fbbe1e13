//! Error types for the room list core.
//!
//! Two layers fail independently: list mutation ([`ListError`]) when an edit
//! script cannot be derived from or applied to the current list, and
//! enrichment ([`EnrichmentError`]) when the gateway cannot describe an entry.
//!
//! Neither ever reaches the UI. Mutation errors skip one operation, enrichment
//! errors degrade one summary. The single exception is [`ListError::Underflow`],
//! which means the source and the list have diverged beyond repair.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while translating or applying an edit operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    /// An operation referenced a position outside the current list.
    #[error("{operation}: index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds {
        /// Operation that produced the bad index
        operation: &'static str,
        /// Offending index
        index: usize,
        /// List length when the operation was translated or applied
        len: usize,
    },

    /// An edit script contained conflicting changes (e.g. two removals at
    /// the same offset).
    #[error("invalid edit script: {0}")]
    InvalidScript(String),

    /// `popFront`/`popBack` on an empty list.
    #[error("{operation} on empty list: source and list are desynchronized")]
    Underflow {
        /// Operation that underflowed
        operation: &'static str,
    },
}

impl ListError {
    /// Returns true if processing must stop.
    ///
    /// Out-of-bounds indices and inconsistent scripts can be produced by
    /// legitimate races in the source (a removal referencing an index a
    /// concurrent reset already invalidated) and only cost one stale
    /// operation. A pop on an empty list cannot be explained that way.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Underflow { .. })
    }
}

/// Errors returned by the enrichment gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentError {
    /// The gateway could not answer (engine shut down, lookup failed).
    #[error("enrichment unavailable: {0}")]
    Unavailable(String),

    /// The gateway does not know the requested room.
    #[error("room not found: {0}")]
    NotFound(String),

    /// The gateway did not answer within the per-call budget.
    #[error("enrichment timed out after {0:?}")]
    Timeout(Duration),

    /// The lookup task was dropped before producing a result.
    #[error("enrichment cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_underflow_is_fatal() {
        assert!(ListError::Underflow { operation: "pop_back" }.is_fatal());
        assert!(!ListError::IndexOutOfBounds { operation: "remove", index: 3, len: 2 }.is_fatal());
        assert!(!ListError::InvalidScript("duplicate removal".into()).is_fatal());
    }

    #[test]
    fn messages_carry_context() {
        let err = ListError::IndexOutOfBounds { operation: "set", index: 7, len: 4 };
        assert_eq!(err.to_string(), "set: index 7 out of bounds for list of length 4");

        let err = EnrichmentError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "enrichment timed out after 250ms");
    }
}
