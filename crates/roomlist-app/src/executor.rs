//! Serial diff executor.
//!
//! One dedicated thread per subscription owns the [`RoomListStore`]. Every
//! input (initial snapshot, operation batches, loading signals, rebuild
//! requests) arrives through one FIFO channel and is processed to completion
//! before the next, so no two edit scripts are ever applied concurrently and
//! batches apply in receipt order.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use roomlist_core::{
    EditOperation, ProviderState, RawEntry, RoomListStore, SourceLoadingState, Summary,
};
use tokio::sync::mpsc;

use crate::{builder::SummaryBuilder, observable::Observable, source::EnrichmentGateway};

/// Work item for the executor.
#[derive(Debug)]
pub(crate) enum ExecutorInput {
    /// Entries at subscription time. Materialized as a reset.
    Initial(Vec<RawEntry>),
    /// One batch of operations from the source.
    Batch(Vec<EditOperation<RawEntry>>),
    /// Loading signal from the source.
    LoadingState(SourceLoadingState),
    /// Re-enrich every entry.
    Rebuild,
    /// Stop processing.
    Shutdown,
}

/// Outputs shared between the executor and the provider.
#[derive(Clone)]
pub(crate) struct ExecutorOutputs {
    pub room_list: Observable<Vec<Summary>>,
    pub state: Observable<ProviderState>,
    pub faulted: Arc<AtomicBool>,
}

pub(crate) struct DiffExecutor<G> {
    name: String,
    store: RoomListStore,
    builder: SummaryBuilder<G>,
    outputs: ExecutorOutputs,
}

impl<G: EnrichmentGateway> DiffExecutor<G> {
    pub(crate) fn new(name: String, builder: SummaryBuilder<G>, outputs: ExecutorOutputs) -> Self {
        Self { name, store: RoomListStore::new(), builder, outputs }
    }

    /// Start the executor on its own thread.
    pub(crate) fn spawn(
        self,
        inputs: mpsc::UnboundedReceiver<ExecutorInput>,
    ) -> std::io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("roomlist-{}", self.name))
            .spawn(move || self.run(inputs))
    }

    fn run(mut self, mut inputs: mpsc::UnboundedReceiver<ExecutorInput>) {
        tracing::info!(provider = %self.name, "diff executor started");

        while let Some(input) = inputs.blocking_recv() {
            let keep_going = match input {
                ExecutorInput::Initial(entries) => {
                    tracing::debug!(provider = %self.name, count = entries.len(), "initial entries");
                    self.process(vec![EditOperation::Reset(entries)])
                },
                ExecutorInput::Batch(operations) => self.process(operations),
                ExecutorInput::LoadingState(signal) => {
                    self.update_state(signal);
                    true
                },
                ExecutorInput::Rebuild => {
                    let _span =
                        tracing::info_span!("rebuild_summaries", provider = %self.name).entered();
                    let room_list = &self.outputs.room_list;
                    self.store.rebuild(|raw| self.builder.build(raw), |list| room_list.publish(list));
                    true
                },
                ExecutorInput::Shutdown => false,
            };

            if !keep_going {
                break;
            }
        }

        tracing::info!(provider = %self.name, "diff executor stopped");
    }

    /// Returns false after a fatal error.
    fn process(&mut self, operations: Vec<EditOperation<RawEntry>>) -> bool {
        let _span = tracing::info_span!("process_room_list_diffs", provider = %self.name).entered();
        tracing::debug!(count = operations.len(), current = self.store.len(), "received diffs");

        let room_list = &self.outputs.room_list;
        let builder = &self.builder;
        match self.store.apply_batch(operations, |raw| builder.build(raw), |list| room_list.publish(list)) {
            Ok(report) => {
                tracing::debug!(
                    applied = report.applied,
                    skipped = report.skipped,
                    len = self.store.len(),
                    "finished applying diffs"
                );
                true
            },
            Err(err) => {
                tracing::error!(
                    error = %err,
                    len = self.store.len(),
                    "source and room list desynchronized, stopping"
                );
                self.outputs.faulted.store(true, Ordering::Release);
                false
            },
        }
    }

    fn update_state(&self, signal: SourceLoadingState) {
        let current = self.outputs.state.get();
        if let Some(next) = current.advance(signal, self.store.len()) {
            tracing::info!(provider = %self.name, state = ?next, "loading state changed");
            self.outputs.state.publish(next);
        }
    }
}
