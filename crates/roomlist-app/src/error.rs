//! Runtime error types.

use thiserror::Error;

/// Errors reported by the source when subscribing or sending commands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source cannot serve requests right now.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The source refused the request.
    #[error("source rejected request: {0}")]
    Rejected(String),

    /// The source has shut down.
    #[error("source closed")]
    Closed,
}

impl SourceError {
    /// Returns true if retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Errors returned by [`RoomSummaryProvider`](crate::RoomSummaryProvider).
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Constructed outside a tokio runtime.
    #[error("no tokio runtime available")]
    NoRuntime,

    /// Attaching to the source failed. The list stays `NotLoaded`.
    #[error("subscription failed: {0}")]
    Subscribe(#[from] SourceError),

    /// The diff executor thread could not be started.
    #[error("failed to spawn diff executor: {0}")]
    Spawn(#[from] std::io::Error),
}
