//! Subscription policy configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::subscription::PlanCatalog;

/// A week; orders older than this are abandoned by any measure.
const MAX_PENDING_TIMEOUT_MINS: i64 = 7 * 24 * 60;

/// Subscription policy, loaded once and shared by every handler
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionConfig {
    /// Grants access to everyone regardless of status
    #[serde(default)]
    pub free_access: bool,

    /// Length of the one-time trial
    #[serde(default = "default_trial_days")]
    pub trial_days: i64,

    /// Minutes a pending order may sit unpaid before it is reclaimed
    #[serde(default = "default_pending_timeout")]
    pub pending_timeout_mins: i64,

    /// Interval of the background sweep
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Compare-and-swap attempts before reporting a conflict
    #[serde(default = "default_max_cas_retries")]
    pub max_cas_retries: u32,

    /// Plan id -> price and period
    #[serde(default)]
    pub plans: PlanCatalog,
}

impl SubscriptionConfig {
    /// Get sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate subscription policy
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.trial_days <= 0 || self.trial_days > 365 {
            return Err(ValidationError::InvalidTrialDays);
        }
        if self.pending_timeout_mins <= 0 || self.pending_timeout_mins > MAX_PENDING_TIMEOUT_MINS {
            return Err(ValidationError::InvalidPendingTimeout);
        }
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::InvalidSweepInterval);
        }
        if self.max_cas_retries == 0 {
            return Err(ValidationError::InvalidRetryCount);
        }
        for terms in [self.plans.monthly, self.plans.yearly] {
            if terms.amount <= 0 || terms.period_months == 0 {
                return Err(ValidationError::InvalidPlanTerms);
            }
        }
        Ok(())
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            free_access: false,
            trial_days: default_trial_days(),
            pending_timeout_mins: default_pending_timeout(),
            sweep_interval_secs: default_sweep_interval(),
            max_cas_retries: default_max_cas_retries(),
            plans: PlanCatalog::default(),
        }
    }
}

fn default_trial_days() -> i64 {
    14
}

fn default_pending_timeout() -> i64 {
    30
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_max_cas_retries() -> u32 {
    3
}
