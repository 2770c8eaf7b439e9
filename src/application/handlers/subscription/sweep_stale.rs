//! SweepStaleHandler - reclaims abandoned orders and expires lapsed windows.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::subscription::{SubscriptionError, SubscriptionPolicy};
use crate::ports::{SubscriptionNotice, SubscriptionNotifier};

use super::notices::deliver;
use super::record_store::RecordStore;

/// Result of sweeping one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Reclaimed,
    Untouched,
}

/// Totals from a full sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub reclaimed: usize,
    pub expired: usize,
}

/// Handler for the periodic sweep.
///
/// Pending sweeps only ever touch `pending` records. Expiring lapsed trial
/// and paid windows is a separate pass.
pub struct SweepStaleHandler {
    store: RecordStore,
    notifier: Arc<dyn SubscriptionNotifier>,
    policy: SubscriptionPolicy,
}

impl SweepStaleHandler {
    pub fn new(
        store: RecordStore,
        notifier: Arc<dyn SubscriptionNotifier>,
        policy: SubscriptionPolicy,
    ) -> Self {
        Self {
            store,
            notifier,
            policy,
        }
    }

    /// Resets the user's record to `none` if it is a stale pending order.
    pub async fn sweep_one(&self, user_id: &UserId) -> Result<SweepOutcome, SubscriptionError> {
        let timeout = self.policy.pending_timeout_mins;
        let mutation = self
            .store
            .update_existing(user_id, |record, now| {
                Ok(record.is_stale_pending(timeout, now) && record.reclaim_pending(now))
            })
            .await?;

        match mutation {
            Some(m) if m.value => {
                tracing::info!(user_id = %user_id, "Reclaimed stale pending order");
                Ok(SweepOutcome::Reclaimed)
            }
            _ => Ok(SweepOutcome::Untouched),
        }
    }

    /// Reclaims every stale pending record. Returns how many were reset.
    ///
    /// A failure on one record is logged and the scan goes on.
    pub async fn sweep_all(&self) -> Result<usize, SubscriptionError> {
        let cutoff = self.store.now().add_minutes(-self.policy.pending_timeout_mins);
        let candidates = self.store.repository().find_stale_pending(cutoff).await?;

        let mut reclaimed = 0;
        for user_id in candidates {
            match self.sweep_one(&user_id).await {
                Ok(SweepOutcome::Reclaimed) => reclaimed += 1,
                Ok(SweepOutcome::Untouched) => {}
                Err(e) => {
                    tracing::warn!(user_id = %user_id, error = %e, "Sweep failed for record");
                }
            }
        }
        if reclaimed > 0 {
            tracing::info!(reclaimed, "Pending sweep finished");
        }
        Ok(reclaimed)
    }

    /// Moves trial and active records whose window has ended to `expired`.
    pub async fn expire_lapsed(&self) -> Result<usize, SubscriptionError> {
        let candidates = self.store.repository().find_lapsed(self.store.now()).await?;

        let mut expired = 0;
        for user_id in candidates {
            let result = self
                .store
                .update_existing(&user_id, |record, now| Ok(record.expire_if_lapsed(now)))
                .await;
            match result {
                Ok(Some(m)) if m.value => {
                    expired += 1;
                    tracing::info!(user_id = %user_id, "Subscription window lapsed, expired");
                    deliver(
                        self.notifier.as_ref(),
                        SubscriptionNotice::Expired {
                            user_id: user_id.clone(),
                        },
                    )
                    .await;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(user_id = %user_id, error = %e, "Expiry failed for record");
                }
            }
        }
        Ok(expired)
    }

    /// Runs both passes.
    pub async fn run(&self) -> Result<SweepReport, SubscriptionError> {
        Ok(SweepReport {
            reclaimed: self.sweep_all().await?,
            expired: self.expire_lapsed().await?,
        })
    }
}
