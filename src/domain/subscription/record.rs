//! SubscriptionRecord aggregate.
//!
//! One record per user. Every mutation goes through a method here which
//! stamps `updated_at` only when something actually changed. Callers persist
//! the result with a compare-and-swap on the `updated_at` they read.

use serde::{Deserialize, Serialize};

use super::{PlanTerms, PlanType, SubscriptionError, SubscriptionStatus};
use crate::domain::foundation::{StateMachine, Timestamp, UserId};

/// Persisted per-user subscription state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub user_id: UserId,
    pub status: SubscriptionStatus,
    pub plan: Option<PlanType>,
    /// Minor currency units.
    pub amount: Option<i64>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub next_billing_date: Option<Timestamp>,
    pub last_payment_date: Option<Timestamp>,
    /// Never cleared once set.
    pub trial_start_date: Option<Timestamp>,
    pub trial_end_date: Option<Timestamp>,
    /// Write-once.
    pub external_customer_id: Option<String>,
    /// Write-once, cleared only by a pending reclaim.
    pub external_subscription_id: Option<String>,
    /// Gateway order issued for the current pending purchase.
    pub external_order_id: Option<String>,
    /// Last mutation; also the optimistic-concurrency token.
    pub updated_at: Timestamp,
}

/// Result of attaching a gateway subscription id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    Attached,
    AlreadyAttached,
    /// A different id is already stored and was kept.
    Conflicting,
}

impl SubscriptionRecord {
    /// Creates the record a user gets on first access.
    pub fn new(user_id: UserId, now: Timestamp) -> Self {
        Self {
            user_id,
            status: SubscriptionStatus::None,
            plan: None,
            amount: None,
            start_date: None,
            end_date: None,
            next_billing_date: None,
            last_payment_date: None,
            trial_start_date: None,
            trial_end_date: None,
            external_customer_id: None,
            external_subscription_id: None,
            external_order_id: None,
            updated_at: now,
        }
    }

    // ════════════════════════════════════════════════════════════════════
    // Queries
    // ════════════════════════════════════════════════════════════════════

    /// Status as readers should see it: a trial or paid window that has
    /// already ended reads as `expired` even before storage is corrected.
    pub fn effective_status(&self, now: Timestamp) -> SubscriptionStatus {
        if self.status.is_time_boxed() && !self.window_open(now) {
            SubscriptionStatus::Expired
        } else {
            self.status
        }
    }

    /// True while `end_date` lies in the future.
    pub fn window_open(&self, now: Timestamp) -> bool {
        self.end_date.map(|end| end.is_after(&now)).unwrap_or(false)
    }

    /// A pending record untouched for longer than `timeout_minutes`.
    pub fn is_stale_pending(&self, timeout_minutes: i64, now: Timestamp) -> bool {
        self.status == SubscriptionStatus::Pending
            && now.duration_since(&self.updated_at).num_seconds() > timeout_minutes * 60
    }

    /// Days left in the current window, rounded up.
    pub fn days_left(&self, now: Timestamp) -> i64 {
        self.end_date.map(|end| now.days_until(&end)).unwrap_or(0)
    }

    /// Days left in the trial window, rounded up.
    pub fn trial_days_left(&self, now: Timestamp) -> i64 {
        self.trial_end_date.map(|end| now.days_until(&end)).unwrap_or(0)
    }

    pub fn has_used_trial(&self) -> bool {
        self.trial_start_date.is_some()
    }

    // ════════════════════════════════════════════════════════════════════
    // User-driven transitions
    // ════════════════════════════════════════════════════════════════════

    /// Starts the one-time trial.
    ///
    /// # Errors
    ///
    /// - `TrialAlreadyUsed` if a trial was ever started
    /// - `NotEligible` if the status is anything but `none`
    pub fn start_trial(&mut self, trial_days: i64, now: Timestamp) -> Result<(), SubscriptionError> {
        if self.has_used_trial() {
            return Err(SubscriptionError::TrialAlreadyUsed);
        }
        let next = self
            .status
            .transition_to(SubscriptionStatus::Trial)
            .map_err(|_| SubscriptionError::NotEligible(self.status))?;

        let trial_end = now.add_days(trial_days);
        self.stamp(now, |r| {
            r.status = next;
            r.trial_start_date = Some(now);
            r.trial_end_date = Some(trial_end);
            r.start_date = Some(now);
            r.end_date = Some(trial_end);
        });
        Ok(())
    }

    /// Moves the record to `pending` for a freshly created gateway order.
    ///
    /// The customer id is write-once: if one is already stored it is kept
    /// and the argument is ignored.
    ///
    /// # Errors
    ///
    /// - `AlreadyActive` from `active`
    /// - `OrderPending` from `pending` (reclaim it first)
    pub fn begin_order(
        &mut self,
        plan: PlanType,
        terms: PlanTerms,
        customer_id: &str,
        order_id: &str,
        now: Timestamp,
    ) -> Result<(), SubscriptionError> {
        if !self.status.allows_new_order() {
            return Err(match self.status {
                SubscriptionStatus::Active => SubscriptionError::AlreadyActive,
                SubscriptionStatus::Pending => SubscriptionError::OrderPending,
                other => SubscriptionError::NotEligible(other),
            });
        }
        let next = self
            .status
            .transition_to(SubscriptionStatus::Pending)
            .map_err(|_| SubscriptionError::NotEligible(self.status))?;

        let end = now.add_months(terms.period_months);
        self.stamp(now, |r| {
            r.status = next;
            r.plan = Some(plan);
            r.amount = Some(terms.amount);
            r.start_date = Some(now);
            r.end_date = Some(end);
            r.next_billing_date = Some(end);
            r.external_order_id = Some(order_id.to_string());
            if r.external_customer_id.is_none() {
                r.external_customer_id = Some(customer_id.to_string());
            }
        });
        Ok(())
    }

    /// Resets a `pending` record to `none`, clearing the abandoned order.
    ///
    /// Returns false (and changes nothing) for any other status.
    pub fn reclaim_pending(&mut self, now: Timestamp) -> bool {
        if self.status.transition_to(SubscriptionStatus::None).is_err() {
            return false;
        }
        self.stamp(now, |r| {
            r.status = SubscriptionStatus::None;
            r.plan = None;
            r.amount = None;
            r.start_date = None;
            r.end_date = None;
            r.next_billing_date = None;
            r.external_subscription_id = None;
            r.external_order_id = None;
        })
    }

    /// Moves a lapsed trial or paid window to `expired`.
    pub fn expire_if_lapsed(&mut self, now: Timestamp) -> bool {
        if !self.status.is_time_boxed() || self.window_open(now) {
            return false;
        }
        match self.status.transition_to(SubscriptionStatus::Expired) {
            Ok(next) => self.stamp(now, |r| r.status = next),
            Err(_) => false,
        }
    }

    // ════════════════════════════════════════════════════════════════════
    // Payment-driven transitions (bypass the state machine)
    // ════════════════════════════════════════════════════════════════════

    /// Marks a verified payment: unconditionally `active`.
    ///
    /// The new end is `max(current end, now + period)` so re-verifying never
    /// shortens a longer window.
    pub fn activate(&mut self, period_months: u32, now: Timestamp) -> bool {
        let candidate = now.add_months(period_months);
        let end = match self.end_date {
            Some(current) if current.is_after(&candidate) => current,
            _ => candidate,
        };
        self.stamp(now, |r| {
            r.status = SubscriptionStatus::Active;
            r.start_date = Some(now);
            r.end_date = Some(end);
            r.next_billing_date = Some(end);
            r.last_payment_date = Some(now);
        })
    }

    /// Stores the gateway subscription id unless a different one is already set.
    pub fn attach_subscription(&mut self, subscription_id: &str, now: Timestamp) -> AttachOutcome {
        match self.external_subscription_id.as_deref() {
            Some(existing) if existing == subscription_id => AttachOutcome::AlreadyAttached,
            Some(_) => AttachOutcome::Conflicting,
            None => {
                self.stamp(now, |r| {
                    r.external_subscription_id = Some(subscription_id.to_string());
                });
                AttachOutcome::Attached
            }
        }
    }

    /// Applies a `charged` event.
    ///
    /// Pure overwrite from the event's own data, so repeated delivery of the
    /// same event is a no-op after the first.
    pub fn apply_charge(
        &mut self,
        paid_at: Option<Timestamp>,
        period_end: Option<Timestamp>,
        now: Timestamp,
    ) -> bool {
        self.stamp(now, |r| {
            r.status = SubscriptionStatus::Active;
            if let Some(paid_at) = paid_at {
                r.last_payment_date = Some(paid_at);
            }
            if let Some(end) = period_end {
                r.end_date = Some(end);
                r.next_billing_date = Some(end);
            }
        })
    }

    /// Applies a status asserted by the gateway (`cancelled`, `expired`).
    pub fn apply_gateway_status(&mut self, status: SubscriptionStatus, now: Timestamp) -> bool {
        self.stamp(now, |r| r.status = status)
    }

    /// Runs `change` and stamps `updated_at` if the record differs afterwards.
    ///
    /// The new stamp is strictly after the previous one so the CAS token
    /// always moves on a real write.
    fn stamp(&mut self, now: Timestamp, change: impl FnOnce(&mut Self)) -> bool {
        let before = self.clone();
        change(self);
        if *self == before {
            return false;
        }
        self.updated_at = now.succeeding(&before.updated_at);
        true
    }
}
