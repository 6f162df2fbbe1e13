//! Viewport task: drives the throttler from a latest-value slot and a timer.

use std::{future, sync::Arc, time::Duration};

use roomlist_core::{
    Environment, PageCommand, Summary, ViewportConfig, ViewportRange, ViewportThrottler,
};
use tokio::sync::watch;

use crate::{controller::FilterController, observable::Observable};

/// Evaluate visible range reports and forward the resulting commands.
///
/// A bump of `resets` means the list started over; the throttler forgets
/// what it already evaluated. Runs until either sender is dropped.
pub(crate) async fn run_viewport<E: Environment>(
    env: E,
    config: ViewportConfig,
    mut ranges: watch::Receiver<ViewportRange>,
    mut resets: watch::Receiver<u64>,
    room_list: Observable<Vec<Summary>>,
    controller: Arc<FilterController>,
) {
    let mut throttler = ViewportThrottler::new(config);

    loop {
        let wait = throttler.next_deadline(env.now());

        tokio::select! {
            // Resets are issued before the reports that follow them.
            biased;

            changed = resets.changed() => {
                if changed.is_err() {
                    break;
                }
                let generation = *resets.borrow_and_update();
                tracing::trace!(generation, "viewport reset");
                throttler.reset();
            },
            changed = ranges.changed() => {
                if changed.is_err() {
                    break;
                }
                let range = *ranges.borrow_and_update();
                tracing::trace!(start = range.start, end = range.end, "visible range reported");
                throttler.record(range, env.now());
            },
            () = sleep_or_wait_forever(&env, wait) => {
                let Some(outcome) = throttler.poll(env.now(), &room_list.get()) else {
                    continue;
                };
                match outcome.page {
                    Some(PageCommand::AddOnePage) => controller.add_page(),
                    Some(PageCommand::ResetToOnePage) => controller.reset_to_one_page(),
                    None => {},
                }
                if let Some(ids) = outcome.scope {
                    controller.subscribe_to_ids(ids);
                }
            },
        }
    }

    tracing::debug!("viewport task stopped");
}

async fn sleep_or_wait_forever<E: Environment>(env: &E, wait: Option<Duration>) {
    match wait {
        Some(duration) => env.sleep(duration).await,
        None => future::pending().await,
    }
}
