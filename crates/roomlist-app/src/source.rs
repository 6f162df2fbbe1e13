//! External collaborators: the list source and the enrichment gateway.
//!
//! Both are black boxes answering asynchronously. The source pushes edit
//! operations and loading signals through channels; dropping the receiving
//! half of a subscription cancels it.

use std::future::Future;

use roomlist_core::{
    EditOperation, EnrichmentError, LatestEvent, RawEntry, RoomId, RoomInfo, SourceCommand,
    SourceLoadingState,
};
use tokio::sync::mpsc;

use crate::error::SourceError;

/// Live entries subscription.
#[derive(Debug)]
pub struct EntriesSubscription {
    /// Entries at subscription time.
    pub initial: Vec<RawEntry>,
    /// Operation batches, in source order.
    pub updates: mpsc::UnboundedReceiver<Vec<EditOperation<RawEntry>>>,
}

/// Live loading-state subscription.
#[derive(Debug)]
pub struct LoadingStateSubscription {
    /// State at subscription time.
    pub initial: SourceLoadingState,
    /// Later state changes.
    pub updates: mpsc::UnboundedReceiver<SourceLoadingState>,
}

/// The sync engine's view of one room list.
pub trait RoomListSource: Send + Sync + 'static {
    /// Subscribe to list entries with windows of `page_size` entries.
    fn subscribe_entries(
        &self,
        page_size: u32,
    ) -> impl Future<Output = Result<EntriesSubscription, SourceError>> + Send;

    /// Subscribe to the loading state of the list.
    fn subscribe_loading_state(
        &self,
    ) -> impl Future<Output = Result<LoadingStateSubscription, SourceError>> + Send;

    /// Send a fire-and-forget command.
    fn send_command(
        &self,
        command: SourceCommand,
    ) -> impl Future<Output = Result<(), SourceError>> + Send;
}

/// Lookup service describing rooms.
pub trait EnrichmentGateway: Send + Sync + 'static {
    /// Descriptive fields of a room.
    fn room_info(&self, id: &RoomId)
    -> impl Future<Output = Result<RoomInfo, EnrichmentError>> + Send;

    /// Latest event of a room, if it has one.
    fn latest_event(
        &self,
        id: &RoomId,
    ) -> impl Future<Output = Result<Option<LatestEvent>, EnrichmentError>> + Send;
}
