//! Notifier that writes notices to the structured log.
//!
//! Stands in for the email service until one is wired up; the log line
//! carries everything an email template would need.

use async_trait::async_trait;

use crate::ports::{NotifyError, SubscriptionNotice, SubscriptionNotifier};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SubscriptionNotifier for LogNotifier {
    async fn notify(&self, notice: SubscriptionNotice) -> Result<(), NotifyError> {
        match &notice {
            SubscriptionNotice::TrialStarted { user_id, ends_at } => {
                tracing::info!(user_id = %user_id, ends_at = %ends_at, "Notice: trial started");
            }
            SubscriptionNotice::Activated { user_id, plan, ends_at } => {
                tracing::info!(
                    user_id = %user_id,
                    plan = plan.map(|p| p.as_str()),
                    ends_at = ends_at.map(|t| t.to_string()),
                    "Notice: subscription activated"
                );
            }
            SubscriptionNotice::Cancelled { user_id } => {
                tracing::info!(user_id = %user_id, "Notice: subscription cancelled");
            }
            SubscriptionNotice::Expired { user_id } => {
                tracing::info!(user_id = %user_id, "Notice: subscription expired");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    #[tokio::test]
    async fn always_succeeds() {
        let notice = SubscriptionNotice::Expired {
            user_id: UserId::new("u1").unwrap(),
        };
        assert!(LogNotifier::new().notify(notice).await.is_ok());
    }
}
