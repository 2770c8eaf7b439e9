//! Notifier that keeps every notice in memory, for assertions.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::ports::{NotifyError, SubscriptionNotice, SubscriptionNotifier};

#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<SubscriptionNotice>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every call fails after recording the notice.
    pub fn failing() -> Self {
        let notifier = Self::new();
        notifier.failing.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn notices(&self) -> Vec<SubscriptionNotice> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    /// Notice kinds in delivery order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.notices().iter().map(|n| n.kind()).collect()
    }
}

#[async_trait]
impl SubscriptionNotifier for RecordingNotifier {
    async fn notify(&self, notice: SubscriptionNotice) -> Result<(), NotifyError> {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError("mail relay refused connection".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    fn cancelled() -> SubscriptionNotice {
        SubscriptionNotice::Cancelled {
            user_id: UserId::new("u1").unwrap(),
        }
    }

    #[tokio::test]
    async fn records_in_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify(cancelled()).await.unwrap();
        notifier
            .notify(SubscriptionNotice::Expired {
                user_id: UserId::new("u1").unwrap(),
            })
            .await
            .unwrap();
        assert_eq!(notifier.kinds(), vec!["cancelled", "expired"]);
    }

    #[tokio::test]
    async fn failing_still_records() {
        let notifier = RecordingNotifier::failing();
        assert!(notifier.notify(cancelled()).await.is_err());
        assert_eq!(notifier.notices().len(), 1);
    }
}
