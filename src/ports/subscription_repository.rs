//! Subscription repository port.
//!
//! Persists one [`SubscriptionRecord`] per user. Updates are compare-and-swap
//! on `updated_at`: the write only lands if the stored token still equals the
//! one the caller read, so a concurrent writer is never silently overwritten.
//!
//! # Example
//!
//! ```ignore
//! let mut record = repo.find_by_user(&user_id).await?.expect("exists");
//! let expected = record.updated_at;
//! record.start_trial(14, clock.now())?;
//! if !repo.compare_and_swap(&record, expected).await? {
//!     // someone else wrote first: re-read and try again
//! }
//! ```

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::subscription::SubscriptionRecord;

/// Repository port for subscription records.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find the record for a user.
    ///
    /// Returns `None` if the user has never touched the subsystem.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<SubscriptionRecord>, DomainError>;

    /// Find the record holding a gateway subscription id.
    async fn find_by_external_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError>;

    /// Insert a new record.
    ///
    /// Returns false if a record for the user already exists (nothing written).
    async fn insert(&self, record: &SubscriptionRecord) -> Result<bool, DomainError>;

    /// Replace the stored record if its `updated_at` equals `expected`.
    ///
    /// Returns false when the token no longer matches (or the row vanished);
    /// the caller should re-read and retry.
    async fn compare_and_swap(
        &self,
        record: &SubscriptionRecord,
        expected: Timestamp,
    ) -> Result<bool, DomainError>;

    /// Users whose record is `pending` and was last written before `cutoff`.
    async fn find_stale_pending(&self, cutoff: Timestamp) -> Result<Vec<UserId>, DomainError>;

    /// Users whose `trial` or `active` window ended at or before `now`.
    async fn find_lapsed(&self, now: Timestamp) -> Result<Vec<UserId>, DomainError>;
}
