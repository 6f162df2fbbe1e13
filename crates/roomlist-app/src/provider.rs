//! Room summary provider.
//!
//! Wires the pieces together for one room list: a source subscription feeding
//! the serial diff executor, the command pump behind the filter controller,
//! and the viewport task. The UI only sees the two observables and the
//! fire-and-forget entry points.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use roomlist_core::{Environment, FilterSpec, ProviderState, Summary, ViewportRange};
use tokio::{
    runtime::Handle,
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{
    builder::SummaryBuilder,
    config::ProviderConfig,
    controller::FilterController,
    error::ProviderError,
    executor::{DiffExecutor, ExecutorInput, ExecutorOutputs},
    observable::Observable,
    source::{EnrichmentGateway, RoomListSource},
    system_env::SystemEnv,
    viewport::run_viewport,
};

/// State of one attached source subscription.
struct Session {
    inputs: mpsc::UnboundedSender<ExecutorInput>,
    executor: Option<thread::JoinHandle<()>>,
    forwarders: Vec<JoinHandle<()>>,
}

/// Observable, filterable, paginated list of room summaries.
///
/// # Lifecycle
///
/// Construct inside a tokio runtime, then [`subscribe_if_necessary`]. The
/// list and state observables live as long as the provider and survive
/// [`resubscribe`]. Dropping the provider stops its tasks; the executor
/// thread exits on its own once it sees the shutdown request.
///
/// [`subscribe_if_necessary`]: Self::subscribe_if_necessary
/// [`resubscribe`]: Self::resubscribe
pub struct RoomSummaryProvider<S, G> {
    config: ProviderConfig,
    source: Arc<S>,
    gateway: Arc<G>,
    handle: Handle,
    outputs: ExecutorOutputs,
    controller: Arc<FilterController>,
    visible_range: watch::Sender<ViewportRange>,
    viewport_resets: watch::Sender<u64>,
    session: Option<Session>,
    tasks: Vec<JoinHandle<()>>,
}

impl<S, G> RoomSummaryProvider<S, G>
where
    S: RoomListSource,
    G: EnrichmentGateway,
{
    /// Create a provider using the system clock.
    ///
    /// # Errors
    ///
    /// [`ProviderError::NoRuntime`] outside a tokio runtime.
    pub fn new(source: Arc<S>, gateway: Arc<G>, config: ProviderConfig) -> Result<Self, ProviderError> {
        Self::with_env(source, gateway, config, SystemEnv::new())
    }

    /// Create a provider with a custom environment for viewport timing.
    ///
    /// # Errors
    ///
    /// [`ProviderError::NoRuntime`] outside a tokio runtime.
    pub fn with_env<E: Environment>(
        source: Arc<S>,
        gateway: Arc<G>,
        config: ProviderConfig,
        env: E,
    ) -> Result<Self, ProviderError> {
        let handle = Handle::try_current().map_err(|_| ProviderError::NoRuntime)?;

        let outputs = ExecutorOutputs {
            room_list: Observable::new(Vec::new()),
            state: Observable::new(ProviderState::NotLoaded),
            faulted: Arc::new(AtomicBool::new(false)),
        };

        let (controller, pump) =
            FilterController::spawn(&config.name, config.filters, Arc::clone(&source), &handle);

        let (visible_range, ranges) = watch::channel(ViewportRange::empty());
        let (viewport_resets, resets) = watch::channel(0);
        let viewport = handle.spawn(run_viewport(
            env,
            config.viewport,
            ranges,
            resets,
            outputs.room_list.clone(),
            Arc::clone(&controller),
        ));

        Ok(Self {
            config,
            source,
            gateway,
            handle,
            outputs,
            controller,
            visible_range,
            viewport_resets,
            session: None,
            tasks: vec![pump, viewport],
        })
    }

    /// Provider name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Materialized list. Empty until the first entries arrive.
    pub fn room_list(&self) -> Observable<Vec<Summary>> {
        self.outputs.room_list.clone()
    }

    /// Loading state. `NotLoaded` until the source reports otherwise.
    pub fn state(&self) -> Observable<ProviderState> {
        self.outputs.state.clone()
    }

    /// True while a source subscription is attached.
    pub fn is_subscribed(&self) -> bool {
        self.session.is_some()
    }

    /// True if the source violated the list protocol and diff processing
    /// stopped. The list keeps its last good value until [`resubscribe`].
    ///
    /// [`resubscribe`]: Self::resubscribe
    pub fn has_faulted(&self) -> bool {
        self.outputs.faulted.load(Ordering::Acquire)
    }

    /// Attach to the source unless already attached.
    ///
    /// Installs the active filter, then subscribes to entries and loading
    /// state. The initial snapshot is materialized before any later batch.
    ///
    /// # Errors
    ///
    /// [`ProviderError::Subscribe`] if the source refuses; the state stays
    /// `NotLoaded` and nothing is retried.
    pub async fn subscribe_if_necessary(&mut self) -> Result<(), ProviderError> {
        if self.session.is_some() {
            tracing::debug!(provider = %self.config.name, "already subscribed");
            return Ok(());
        }

        self.controller.reinstall_filter();

        let entries = match self.source.subscribe_entries(self.config.page_size).await {
            Ok(subscription) => subscription,
            Err(err) => {
                tracing::error!(provider = %self.config.name, error = %err, "failed to subscribe to entries");
                return Err(err.into());
            },
        };
        let loading = match self.source.subscribe_loading_state().await {
            Ok(subscription) => subscription,
            Err(err) => {
                tracing::error!(provider = %self.config.name, error = %err, "failed to subscribe to loading state");
                return Err(err.into());
            },
        };

        let builder = SummaryBuilder::new(
            self.config.name.clone(),
            Arc::clone(&self.gateway),
            self.handle.clone(),
            self.config.enrichment_timeout,
        );
        let (inputs, rx) = mpsc::unbounded_channel();
        let executor =
            DiffExecutor::new(self.config.name.clone(), builder, self.outputs.clone()).spawn(rx)?;

        // Queued ahead of anything the forwarders relay.
        let _ = inputs.send(ExecutorInput::Initial(entries.initial));
        let _ = inputs.send(ExecutorInput::LoadingState(loading.initial));

        let forwarders = vec![
            self.handle.spawn(forward(entries.updates, inputs.clone(), ExecutorInput::Batch)),
            self.handle.spawn(forward(loading.updates, inputs.clone(), ExecutorInput::LoadingState)),
        ];

        self.session = Some(Session { inputs, executor: Some(executor), forwarders });
        tracing::info!(provider = %self.config.name, page_size = self.config.page_size, "subscribed");
        Ok(())
    }

    /// Tear the current subscription down and attach a fresh one.
    ///
    /// The old executor is joined before anything is reset, so no batch from
    /// the old subscription can reach the new list. The new session starts
    /// empty, `NotLoaded` and at one page, with no viewport decisions behind
    /// it.
    ///
    /// # Errors
    ///
    /// See [`subscribe_if_necessary`](Self::subscribe_if_necessary).
    pub async fn resubscribe(&mut self) -> Result<(), ProviderError> {
        self.teardown().await;

        self.outputs.faulted.store(false, Ordering::Release);
        self.outputs.room_list.publish(Vec::new());
        self.outputs.state.publish(ProviderState::NotLoaded);
        self.controller.forget_pages();
        self.viewport_resets.send_modify(|generation| *generation = generation.wrapping_add(1));

        self.subscribe_if_necessary().await
    }

    /// Detach from the source and stop all background tasks.
    pub async fn shutdown(&mut self) {
        self.teardown().await;
        for task in self.tasks.drain(..) {
            task.abort();
        }
        tracing::info!(provider = %self.config.name, "shut down");
    }

    /// Replace the active filter.
    pub fn set_filter(&self, spec: FilterSpec) {
        self.controller.set_filter(spec);
    }

    /// Active filter.
    pub fn current_filter(&self) -> FilterSpec {
        self.controller.current_filter().get()
    }

    /// Pages requested from the source since the last reset.
    pub fn requested_pages(&self) -> u32 {
        self.controller.requested_pages()
    }

    /// Report the range of the list currently visible.
    ///
    /// Cheap; call at scroll frequency. Only the latest report is kept.
    pub fn update_visible_range(&self, range: impl Into<ViewportRange>) {
        self.visible_range.send_replace(range.into());
    }

    /// Re-enrich every entry and republish the list once.
    pub fn rebuild_summaries(&self) {
        if let Some(session) = &self.session {
            if session.inputs.send(ExecutorInput::Rebuild).is_err() {
                tracing::warn!(provider = %self.config.name, "diff executor stopped, cannot rebuild");
            }
        }
    }

    async fn teardown(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        for forwarder in session.forwarders.drain(..) {
            forwarder.abort();
            // Completion means the source receivers are dropped.
            let _ = forwarder.await;
        }

        let _ = session.inputs.send(ExecutorInput::Shutdown);
        if let Some(executor) = session.executor.take() {
            match tokio::task::spawn_blocking(move || executor.join()).await {
                Ok(Ok(())) => {},
                Ok(Err(_)) => tracing::error!(provider = %self.config.name, "diff executor panicked"),
                Err(err) => tracing::warn!(provider = %self.config.name, error = %err, "failed to join diff executor"),
            }
        }

        tracing::info!(provider = %self.config.name, "unsubscribed");
    }
}

impl<S, G> Drop for RoomSummaryProvider<S, G> {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        if let Some(session) = &self.session {
            for forwarder in &session.forwarders {
                forwarder.abort();
            }
            let _ = session.inputs.send(ExecutorInput::Shutdown);
        }
    }
}

/// Relay source updates into the executor until either side closes.
///
/// Returning drops `updates`, which releases the source subscription.
async fn forward<T>(
    mut updates: mpsc::UnboundedReceiver<T>,
    inputs: mpsc::UnboundedSender<ExecutorInput>,
    wrap: fn(T) -> ExecutorInput,
) {
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(update) = update else {
                    break;
                };
                if inputs.send(wrap(update)).is_err() {
                    break;
                }
            },
            () = inputs.closed() => {
                tracing::debug!("diff executor stopped, releasing source subscription");
                break;
            },
        }
    }
}
