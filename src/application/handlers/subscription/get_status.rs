//! GetStatusHandler - Query handler for a user's subscription view.

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::{
    has_access, PlanType, SubscriptionError, SubscriptionPolicy, SubscriptionStatus,
};

use super::record_store::RecordStore;
use super::sweep_stale::SweepStaleHandler;

/// Query for the caller's own status.
#[derive(Debug, Clone)]
pub struct GetStatusQuery {
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialInfo {
    pub trial_start_date: Timestamp,
    pub trial_end_date: Option<Timestamp>,
    pub days_left: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionInfo {
    pub plan: PlanType,
    pub amount: Option<i64>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub next_billing_date: Option<Timestamp>,
    pub last_payment_date: Option<Timestamp>,
    pub days_left: i64,
}

/// The caller's subscription as clients see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetStatusResult {
    /// Lapsed trial and paid windows read as `expired`.
    pub status: SubscriptionStatus,
    pub trial_info: Option<TrialInfo>,
    pub subscription_info: Option<SubscriptionInfo>,
    pub has_access: bool,
}

/// Handler for status reads.
///
/// Reclaims the caller's own stale pending order first so the answer never
/// shows an order that can no longer be paid.
pub struct GetStatusHandler {
    store: RecordStore,
    sweeper: SweepStaleHandler,
    policy: SubscriptionPolicy,
}

impl GetStatusHandler {
    pub fn new(store: RecordStore, sweeper: SweepStaleHandler, policy: SubscriptionPolicy) -> Self {
        Self {
            store,
            sweeper,
            policy,
        }
    }

    pub async fn handle(&self, query: GetStatusQuery) -> Result<GetStatusResult, SubscriptionError> {
        if let Err(e) = self.sweeper.sweep_one(&query.user_id).await {
            // the read still answers from whatever is stored
            tracing::warn!(user_id = %query.user_id, error = %e, "Opportunistic sweep failed");
        }

        let record = self.store.load_or_create(&query.user_id).await?;
        let now = self.store.now();
        let status = record.effective_status(now);

        let trial_info = record.trial_start_date.map(|start| TrialInfo {
            trial_start_date: start,
            trial_end_date: record.trial_end_date,
            days_left: record.trial_days_left(now),
            is_active: status == SubscriptionStatus::Trial,
        });

        let subscription_info = record.plan.map(|plan| SubscriptionInfo {
            plan,
            amount: record.amount,
            start_date: record.start_date,
            end_date: record.end_date,
            next_billing_date: record.next_billing_date,
            last_payment_date: record.last_payment_date,
            days_left: record.days_left(now),
        });

        Ok(GetStatusResult {
            status,
            trial_info,
            subscription_info,
            has_access: has_access(&record, self.policy.free_access, now),
        })
    }
}
