//! Subscription notifier port.
//!
//! Emails and similar side effects are owned by another service. A notifier
//! failure never rolls back a transition that has already been persisted;
//! handlers log it and move on.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::PlanType;

/// Something worth telling the user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionNotice {
    TrialStarted { user_id: UserId, ends_at: Timestamp },
    Activated { user_id: UserId, plan: Option<PlanType>, ends_at: Option<Timestamp> },
    Cancelled { user_id: UserId },
    Expired { user_id: UserId },
}

impl SubscriptionNotice {
    pub fn user_id(&self) -> &UserId {
        match self {
            SubscriptionNotice::TrialStarted { user_id, .. }
            | SubscriptionNotice::Activated { user_id, .. }
            | SubscriptionNotice::Cancelled { user_id }
            | SubscriptionNotice::Expired { user_id } => user_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SubscriptionNotice::TrialStarted { .. } => "trial_started",
            SubscriptionNotice::Activated { .. } => "activated",
            SubscriptionNotice::Cancelled { .. } => "cancelled",
            SubscriptionNotice::Expired { .. } => "expired",
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

#[async_trait]
pub trait SubscriptionNotifier: Send + Sync {
    async fn notify(&self, notice: SubscriptionNotice) -> Result<(), NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_notifier_is_object_safe() {
        fn _accepts_dyn(_notifier: &dyn SubscriptionNotifier) {}
    }

    #[test]
    fn notice_exposes_user_and_kind() {
        let user_id = UserId::new("user-1").unwrap();
        let notice = SubscriptionNotice::Cancelled { user_id: user_id.clone() };
        assert_eq!(notice.user_id(), &user_id);
        assert_eq!(notice.kind(), "cancelled");
    }
}
