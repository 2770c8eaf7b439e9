//! Notice delivery that never fails the caller.

use crate::ports::{SubscriptionNotice, SubscriptionNotifier};

/// Sends `notice`, logging instead of propagating a failure.
///
/// The transition it describes is already persisted by the time this runs.
pub(super) async fn deliver(notifier: &dyn SubscriptionNotifier, notice: SubscriptionNotice) {
    let kind = notice.kind();
    let user_id = notice.user_id().clone();
    if let Err(e) = notifier.notify(notice).await {
        tracing::warn!(user_id = %user_id, notice = kind, error = %e, "Failed to deliver subscription notice");
    }
}
