//! Filter and pagination controller.
//!
//! Commands for the source are funneled through one pump task so they reach
//! the source one at a time, in the order they were issued. A filter sent
//! later therefore always supersedes one sent earlier, however quickly the
//! UI changes its mind.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU32, Ordering},
};

use roomlist_core::{
    FilterConfig, FilterSpec, RoomId, SourceCommand, coalesce_commands, compose_filter,
};
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};

use crate::{observable::Observable, source::RoomListSource};

/// Owns the active filter and the requested window size.
#[derive(Debug)]
pub struct FilterController {
    config: FilterConfig,
    current: Observable<FilterSpec>,
    /// Held while publishing a filter and queueing its command, so the
    /// queue order matches the order of `current`.
    filter_lock: Mutex<()>,
    pages: AtomicU32,
    commands: mpsc::UnboundedSender<SourceCommand>,
}

impl FilterController {
    /// Create a controller and spawn its command pump on `handle`.
    pub fn spawn<S: RoomListSource>(
        name: &str,
        config: FilterConfig,
        source: Arc<S>,
        handle: &Handle,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let (commands, rx) = mpsc::unbounded_channel();
        let pump = handle.spawn(run_pump(name.to_owned(), source, rx));
        let controller = Arc::new(Self {
            config,
            current: Observable::new(FilterSpec::default()),
            filter_lock: Mutex::new(()),
            pages: AtomicU32::new(1),
            commands,
        });
        (controller, pump)
    }

    /// Replace the active filter.
    pub fn set_filter(&self, spec: FilterSpec) {
        tracing::debug!(filter = ?spec, "setting filter");
        let predicate = compose_filter(&spec, &self.config);
        let _guard = self.filter_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.current.publish(spec);
        self.send(SourceCommand::SetFilter(predicate));
    }

    /// Send the active filter again, e.g. after attaching a new subscription.
    pub fn reinstall_filter(&self) {
        let _guard = self.filter_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.send(SourceCommand::SetFilter(compose_filter(&self.current.get(), &self.config)));
    }

    /// Request one more page.
    pub fn add_page(&self) {
        let pages = self.pages.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        tracing::debug!(pages, "adding page");
        self.send(SourceCommand::AddOnePage);
    }

    /// Shrink back to a single page.
    pub fn reset_to_one_page(&self) {
        self.pages.store(1, Ordering::Relaxed);
        tracing::debug!("resetting to one page");
        self.send(SourceCommand::ResetToOnePage);
    }

    /// Forget requested pages without telling the source. For a fresh
    /// subscription, which starts at one page anyway.
    pub fn forget_pages(&self) {
        self.pages.store(1, Ordering::Relaxed);
    }

    /// Replace the set of entries with detail subscriptions.
    pub fn subscribe_to_ids(&self, ids: Vec<RoomId>) {
        tracing::trace!(count = ids.len(), "updating subscription scope");
        self.send(SourceCommand::SubscribeToIds(ids));
    }

    /// Active filter.
    pub fn current_filter(&self) -> Observable<FilterSpec> {
        self.current.clone()
    }

    /// Pages requested since the last reset.
    pub fn requested_pages(&self) -> u32 {
        self.pages.load(Ordering::Relaxed)
    }

    fn send(&self, command: SourceCommand) {
        if self.commands.send(command).is_err() {
            tracing::warn!("command pump stopped, dropping command");
        }
    }
}

/// Send queued commands to the source, one at a time.
async fn run_pump<S: RoomListSource>(
    name: String,
    source: Arc<S>,
    mut rx: mpsc::UnboundedReceiver<SourceCommand>,
) {
    while let Some(first) = rx.recv().await {
        let mut queued = vec![first];
        while let Ok(command) = rx.try_recv() {
            queued.push(command);
        }

        for command in coalesce_commands(queued) {
            let kind = command.name();
            if let Err(err) = source.send_command(command).await {
                tracing::warn!(provider = %name, command = kind, error = %err, "source command failed");
            }
        }
    }
    tracing::debug!(provider = %name, "command pump stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use roomlist_core::SourceFilter;

    use super::*;
    use crate::{
        error::SourceError,
        source::{EntriesSubscription, LoadingStateSubscription},
    };

    #[derive(Default)]
    struct RecordingSource {
        sent: Mutex<Vec<SourceCommand>>,
    }

    impl RoomListSource for RecordingSource {
        async fn subscribe_entries(&self, _page_size: u32) -> Result<EntriesSubscription, SourceError> {
            Err(SourceError::Closed)
        }

        async fn subscribe_loading_state(&self) -> Result<LoadingStateSubscription, SourceError> {
            Err(SourceError::Closed)
        }

        async fn send_command(&self, command: SourceCommand) -> Result<(), SourceError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.sent.lock().unwrap().push(command);
            Ok(())
        }
    }

    async fn settle(source: &RecordingSource, expected: usize) -> Vec<SourceCommand> {
        for _ in 0..200 {
            if source.sent.lock().unwrap().len() >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        source.sent.lock().unwrap().clone()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn latest_filter_is_the_one_left_active() {
        let source = Arc::new(RecordingSource::default());
        let (controller, _pump) = FilterController::spawn(
            "test",
            FilterConfig::default(),
            Arc::clone(&source),
            &Handle::current(),
        );

        controller.set_filter(FilterSpec::SearchQuery("abc".into()));
        controller.set_filter(FilterSpec::ExcludeAll);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let sent = source.sent.lock().unwrap().clone();
        assert_eq!(sent.last(), Some(&SourceCommand::SetFilter(SourceFilter::None)));
        assert_eq!(controller.current_filter().get(), FilterSpec::ExcludeAll);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_filters_leave_source_and_current_in_agreement() {
        let source = Arc::new(RecordingSource::default());
        let (controller, _pump) = FilterController::spawn(
            "test",
            FilterConfig::default(),
            Arc::clone(&source),
            &Handle::current(),
        );

        let setters: Vec<_> = (0..8)
            .map(|n| {
                let controller = Arc::clone(&controller);
                std::thread::spawn(move || {
                    for round in 0..20 {
                        controller.set_filter(FilterSpec::SearchQuery(format!("q{n}-{round}")));
                    }
                })
            })
            .collect();
        for setter in setters {
            setter.join().unwrap();
        }

        let current = controller.current_filter().get();
        let expected = SourceCommand::SetFilter(compose_filter(&current, &FilterConfig::default()));
        let mut agreed = false;
        for _ in 0..400 {
            if source.sent.lock().unwrap().last() == Some(&expected) {
                agreed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(agreed, "source was left with a filter other than {current:?}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn forgetting_pages_sends_nothing() {
        let source = Arc::new(RecordingSource::default());
        let (controller, _pump) = FilterController::spawn(
            "test",
            FilterConfig::default(),
            Arc::clone(&source),
            &Handle::current(),
        );

        controller.add_page();
        controller.forget_pages();
        assert_eq!(controller.requested_pages(), 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.sent.lock().unwrap().clone(), vec![SourceCommand::AddOnePage]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn paging_commands_are_sent_in_order() {
        let source = Arc::new(RecordingSource::default());
        let (controller, _pump) = FilterController::spawn(
            "test",
            FilterConfig::default(),
            Arc::clone(&source),
            &Handle::current(),
        );

        controller.add_page();
        controller.add_page();
        assert_eq!(controller.requested_pages(), 3);
        controller.reset_to_one_page();
        assert_eq!(controller.requested_pages(), 1);

        let sent = settle(&source, 3).await;
        assert_eq!(sent, vec![
            SourceCommand::AddOnePage,
            SourceCommand::AddOnePage,
            SourceCommand::ResetToOnePage,
        ]);
    }
}
