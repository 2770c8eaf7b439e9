//! CancelPendingHandler - Command handler for abandoning an unpaid order.

use crate::domain::foundation::UserId;
use crate::domain::subscription::{SubscriptionError, SubscriptionStatus};

use super::record_store::RecordStore;

/// Command to drop the caller's pending order.
#[derive(Debug, Clone)]
pub struct CancelPendingCommand {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelPendingResult {
    /// Status after the call.
    pub status: SubscriptionStatus,
    /// False when there was no pending order to drop.
    pub cancelled: bool,
}

/// Handler for cancelling a pending order, whatever its age.
///
/// Any other status is left alone and reported back.
pub struct CancelPendingHandler {
    store: RecordStore,
}

impl CancelPendingHandler {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    pub async fn handle(&self, cmd: CancelPendingCommand) -> Result<CancelPendingResult, SubscriptionError> {
        let mutation = self
            .store
            .update(&cmd.user_id, |record, now| Ok(record.reclaim_pending(now)))
            .await?;

        if mutation.value {
            tracing::info!(user_id = %cmd.user_id, "Pending order cancelled by user");
        } else {
            tracing::debug!(user_id = %cmd.user_id, status = %mutation.record.status, "Nothing pending to cancel");
        }

        Ok(CancelPendingResult {
            status: mutation.record.status,
            cancelled: mutation.value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemorySubscriptionRepository, InMemoryUserDirectory};
    use crate::domain::foundation::Timestamp;
    use crate::domain::subscription::{PlanType, SubscriptionRecord};
    use crate::ports::FixedClock;
    use std::sync::Arc;

    fn t0() -> Timestamp {
        Timestamp::from_unix_secs(1_705_312_800).unwrap()
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    async fn fixture() -> (CancelPendingHandler, InMemorySubscriptionRepository) {
        let repo = InMemorySubscriptionRepository::new();
        let directory = InMemoryUserDirectory::new();
        directory.add_user(&user()).await;
        let store = RecordStore::new(
            Arc::new(repo.clone()),
            Arc::new(directory),
            Arc::new(FixedClock::new(t0())),
            3,
        );
        (CancelPendingHandler::new(store), repo)
    }

    #[tokio::test]
    async fn fresh_pending_is_reset() {
        let (handler, repo) = fixture().await;
        let mut record = SubscriptionRecord::new(user(), t0().add_minutes(-1));
        record.status = SubscriptionStatus::Pending;
        record.plan = Some(PlanType::Monthly);
        record.external_order_id = Some("order_1".to_string());
        repo.put(record).await;

        let result = handler.handle(CancelPendingCommand { user_id: user() }).await.unwrap();
        assert_eq!(result.status, SubscriptionStatus::None);
        assert!(result.cancelled);
        assert!(repo.get(&user()).await.unwrap().external_order_id.is_none());
    }

    #[tokio::test]
    async fn active_is_reported_untouched() {
        let (handler, repo) = fixture().await;
        let mut record = SubscriptionRecord::new(user(), t0());
        record.status = SubscriptionStatus::Active;
        record.end_date = Some(t0().add_days(20));
        repo.put(record.clone()).await;

        let result = handler.handle(CancelPendingCommand { user_id: user() }).await.unwrap();
        assert_eq!(
            result,
            CancelPendingResult {
                status: SubscriptionStatus::Active,
                cancelled: false
            }
        );
        assert_eq!(repo.get(&user()).await.unwrap(), record);
    }
}
