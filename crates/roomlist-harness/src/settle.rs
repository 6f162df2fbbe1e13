//! Waiting for a provider to catch up with the simulated source.

use std::time::Duration;

use roomlist_app::RoomSummaryProvider;
use roomlist_core::RoomId;

use crate::sim_source::SimSource;

const POLL: Duration = Duration::from_millis(10);

/// Wait until the provider's list holds exactly the source window and stays
/// that way for `quiet`.
///
/// Commands travel asynchronously, so a list that matches once may still be
/// about to change; the quiet period lets pending commands land. Returns
/// false if `timeout` elapses first.
pub async fn settle(
    provider: &RoomSummaryProvider<SimSource, SimSource>,
    source: &SimSource,
    quiet: Duration,
    timeout: Duration,
) -> bool {
    let converged = |ids: &[RoomId]| ids == source.window_ids().as_slice();
    let list_ids = || provider.room_list().get().into_iter().map(|s| s.id).collect::<Vec<_>>();

    let wait = async {
        loop {
            if converged(&list_ids()) {
                tokio::time::sleep(quiet).await;
                if converged(&list_ids()) {
                    return;
                }
            }
            tokio::time::sleep(POLL).await;
        }
    };

    let settled = tokio::time::timeout(timeout, wait).await.is_ok();
    if !settled {
        tracing::warn!(
            list = list_ids().len(),
            window = source.window_ids().len(),
            "provider did not settle"
        );
    }
    settled
}
