//! StartTrialHandler - Command handler for the one-time free trial.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::{SubscriptionError, SubscriptionPolicy, SubscriptionStatus};
use crate::ports::{SubscriptionNotice, SubscriptionNotifier};

use super::notices::deliver;
use super::record_store::RecordStore;

/// Command to start a user's trial.
#[derive(Debug, Clone)]
pub struct StartTrialCommand {
    pub user_id: UserId,
}

/// Result of a started trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTrialResult {
    pub trial_start_date: Timestamp,
    pub trial_end_date: Timestamp,
    pub days_left: i64,
}

/// Handler for starting trials.
///
/// A user gets exactly one trial, and only from `none`. No gateway call is
/// involved.
pub struct StartTrialHandler {
    store: RecordStore,
    notifier: Arc<dyn SubscriptionNotifier>,
    policy: SubscriptionPolicy,
}

impl StartTrialHandler {
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

    pub async fn handle(&self, cmd: StartTrialCommand) -> Result<StartTrialResult, SubscriptionError> {
        // trial used, then status, then directory lookup
        if let Some(existing) = self.store.find(&cmd.user_id).await? {
            if existing.has_used_trial() {
                return Err(SubscriptionError::TrialAlreadyUsed);
            }
            if existing.status != SubscriptionStatus::None {
                return Err(SubscriptionError::NotEligible(existing.status));
            }
        }

        let trial_days = self.policy.trial_days;
        let mutation = self
            .store
            .update(&cmd.user_id, |record, now| record.start_trial(trial_days, now))
            .await?;
        let record = mutation.record;

        let (Some(start), Some(end)) = (record.trial_start_date, record.trial_end_date) else {
            return Err(SubscriptionError::infrastructure("trial dates missing after start"));
        };

        tracing::info!(user_id = %cmd.user_id, trial_end = %end, "Trial started");
        deliver(
            self.notifier.as_ref(),
            SubscriptionNotice::TrialStarted {
                user_id: cmd.user_id.clone(),
                ends_at: end,
            },
        )
        .await;

        Ok(StartTrialResult {
            trial_start_date: start,
            trial_end_date: end,
            days_left: record.trial_days_left(self.store.now()),
        })
    }
}
