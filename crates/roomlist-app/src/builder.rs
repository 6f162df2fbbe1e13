//! Summary builder: blocking bridge to the enrichment gateway.
//!
//! The diff executor is synchronous and strictly ordered, enrichment is
//! async. [`SummaryBuilder::build`] spawns the lookups onto the runtime and
//! parks the calling thread on a oneshot until they resolve or the per-call
//! timeout fires. It must only be called from a plain thread, never from
//! inside the runtime.

use std::{sync::Arc, time::Duration};

use roomlist_core::{EnrichmentError, RawEntry, RoomDetails, Summary};
use tokio::{runtime::Handle, sync::oneshot};

use crate::source::EnrichmentGateway;

/// Builds one [`Summary`] per raw entry, degrading on failure.
pub struct SummaryBuilder<G> {
    name: String,
    gateway: Arc<G>,
    handle: Handle,
    timeout: Duration,
}

impl<G: EnrichmentGateway> SummaryBuilder<G> {
    /// Create a builder spawning lookups on `handle`.
    pub fn new(name: impl Into<String>, gateway: Arc<G>, handle: Handle, timeout: Duration) -> Self {
        Self { name: name.into(), gateway, handle, timeout }
    }

    /// Build the summary for `raw`, blocking until enrichment finishes.
    ///
    /// Never fails: enrichment errors and timeouts yield
    /// [`Summary::degraded`].
    pub fn build(&self, raw: &RawEntry) -> Summary {
        match self.fetch(raw) {
            Ok(details) => Summary::assemble(raw, details),
            Err(err) => {
                tracing::warn!(
                    provider = %self.name,
                    entry = %raw.debug_identifier(),
                    error = %err,
                    "enrichment failed, using degraded summary"
                );
                Summary::degraded(raw)
            },
        }
    }

    fn fetch(&self, raw: &RawEntry) -> Result<RoomDetails, EnrichmentError> {
        let (tx, rx) = oneshot::channel();
        let gateway = Arc::clone(&self.gateway);
        let entry = raw.clone();
        let timeout = self.timeout;

        self.handle.spawn(async move {
            let result = tokio::time::timeout(timeout, fetch_details(gateway.as_ref(), &entry))
                .await
                .unwrap_or(Err(EnrichmentError::Timeout(timeout)));
            // Receiver gone means the executor stopped; nothing to report to.
            let _ = tx.send(result);
        });

        rx.blocking_recv().map_err(|_| EnrichmentError::Cancelled)?
    }
}

/// Look up everything a summary needs.
///
/// Only the main room lookup is required. A missing preview room or latest
/// event leaves those parts empty.
async fn fetch_details<G: EnrichmentGateway>(
    gateway: &G,
    raw: &RawEntry,
) -> Result<RoomDetails, EnrichmentError> {
    let main = gateway.room_info(raw.id()).await?;

    let preview = match raw {
        RawEntry::Room(_) => None,
        RawEntry::Space { preview, .. } => match gateway.room_info(preview).await {
            Ok(info) => Some(info),
            Err(err) => {
                tracing::debug!(room = %preview, error = %err, "preview room lookup failed");
                None
            },
        },
    };

    let latest_event = match gateway.latest_event(raw.preview_room()).await {
        Ok(event) => event,
        Err(err) => {
            tracing::debug!(room = %raw.preview_room(), error = %err, "latest event lookup failed");
            None
        },
    };

    Ok(RoomDetails { main, preview, latest_event })
}
