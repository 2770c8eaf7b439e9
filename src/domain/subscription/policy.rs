//! Subscription policy values shared by the handlers.

use super::{PlanCatalog, PlanTerms, PlanType};

/// Knobs read from configuration at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionPolicy {
    pub free_access: bool,
    pub trial_days: i64,
    pub pending_timeout_mins: i64,
    pub max_cas_retries: u32,
    /// ISO currency for new orders.
    pub currency: String,
    pub plans: PlanCatalog,
}

impl SubscriptionPolicy {
    pub fn terms(&self, plan: PlanType) -> PlanTerms {
        self.plans.terms(plan)
    }

    /// Receipt bucket width, equal to the pending timeout.
    pub fn pending_timeout_secs(&self) -> i64 {
        self.pending_timeout_mins.saturating_mul(60)
    }
}

impl Default for SubscriptionPolicy {
    fn default() -> Self {
        Self {
            free_access: false,
            trial_days: 14,
            pending_timeout_mins: 30,
            max_cas_retries: 3,
            currency: "INR".to_string(),
            plans: PlanCatalog::default(),
        }
    }
}
