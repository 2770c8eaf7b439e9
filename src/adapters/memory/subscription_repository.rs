//! In-memory subscription repository.
//!
//! Same compare-and-swap semantics as the Postgres adapter, backed by a
//! `tokio::sync::RwLock<HashMap>`. Used by tests and local development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::subscription::{SubscriptionRecord, SubscriptionStatus};
use crate::ports::SubscriptionRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriptionRepository {
    records: Arc<RwLock<HashMap<UserId, SubscriptionRecord>>>,
    forced_conflicts: Arc<AtomicU32>,
    fail_writes: Arc<RwLock<bool>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record as-is, bypassing CAS (test setup).
    pub async fn put(&self, record: SubscriptionRecord) {
        self.records
            .write()
            .await
            .insert(record.user_id.clone(), record);
    }

    /// Reads a record without going through the port.
    pub async fn get(&self, user_id: &UserId) -> Option<SubscriptionRecord> {
        self.records.read().await.get(user_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Makes the next `count` compare-and-swap calls report a lost race.
    pub fn force_cas_conflicts(&self, count: u32) {
        self.forced_conflicts.store(count, Ordering::SeqCst);
    }

    /// Makes every write fail with a database error until reset.
    pub async fn fail_writes(&self, fail: bool) {
        *self.fail_writes.write().await = fail;
    }

    async fn check_writable(&self) -> Result<(), DomainError> {
        if *self.fail_writes.read().await {
            return Err(DomainError::new(ErrorCode::DatabaseError, "injected write failure"));
        }
        Ok(())
    }

    /// Mirrors the unique index on `external_subscription_id`.
    fn check_unique_subscription(
        records: &HashMap<UserId, SubscriptionRecord>,
        record: &SubscriptionRecord,
    ) -> Result<(), DomainError> {
        let Some(id) = record.external_subscription_id.as_deref() else {
            return Ok(());
        };
        let taken = records.values().any(|other| {
            other.user_id != record.user_id && other.external_subscription_id.as_deref() == Some(id)
        });
        if taken {
            return Err(DomainError::new(
                ErrorCode::ConstraintViolated,
                "Gateway subscription id already belongs to another user",
            ));
        }
        Ok(())
    }

    fn take_forced_conflict(&self) -> bool {
        self.forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<SubscriptionRecord>, DomainError> {
        Ok(self.records.read().await.get(user_id).cloned())
    }

    async fn find_by_external_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|r| r.external_subscription_id.as_deref() == Some(subscription_id))
            .cloned())
    }

    async fn insert(&self, record: &SubscriptionRecord) -> Result<bool, DomainError> {
        self.check_writable().await?;
        let mut records = self.records.write().await;
        if records.contains_key(&record.user_id) {
            return Ok(false);
        }
        Self::check_unique_subscription(&records, record)?;
        records.insert(record.user_id.clone(), record.clone());
        Ok(true)
    }

    async fn compare_and_swap(
        &self,
        record: &SubscriptionRecord,
        expected: Timestamp,
    ) -> Result<bool, DomainError> {
        self.check_writable().await?;
        if self.take_forced_conflict() {
            return Ok(false);
        }
        let mut records = self.records.write().await;
        Self::check_unique_subscription(&records, record)?;
        match records.get_mut(&record.user_id) {
            Some(stored) if stored.updated_at == expected => {
                *stored = record.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_stale_pending(&self, cutoff: Timestamp) -> Result<Vec<UserId>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.status == SubscriptionStatus::Pending && r.updated_at.is_before(&cutoff))
            .map(|r| r.user_id.clone())
            .collect())
    }

    async fn find_lapsed(&self, now: Timestamp) -> Result<Vec<UserId>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.status.is_time_boxed() && !r.window_open(now))
            .map(|r| r.user_id.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> Timestamp {
        Timestamp::from_unix_secs(1_705_312_800).unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn insert_is_first_writer_wins() {
        let repo = InMemorySubscriptionRepository::new();
        let record = SubscriptionRecord::new(user("u1"), t0());
        assert!(repo.insert(&record).await.unwrap());
        assert!(!repo.insert(&record).await.unwrap());
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn cas_succeeds_only_with_current_token() {
        let repo = InMemorySubscriptionRepository::new();
        let original = SubscriptionRecord::new(user("u1"), t0());
        repo.insert(&original).await.unwrap();

        let mut updated = original.clone();
        updated.start_trial(14, t0().add_minutes(1)).unwrap();
        assert!(repo.compare_and_swap(&updated, original.updated_at).await.unwrap());

        // stale token now loses
        let mut racing = original.clone();
        racing.status = SubscriptionStatus::Expired;
        assert!(!repo.compare_and_swap(&racing, original.updated_at).await.unwrap());
        assert_eq!(repo.get(&user("u1")).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn cas_on_missing_row_fails() {
        let repo = InMemorySubscriptionRepository::new();
        let record = SubscriptionRecord::new(user("ghost"), t0());
        assert!(!repo.compare_and_swap(&record, t0()).await.unwrap());
    }

    #[tokio::test]
    async fn forced_conflicts_are_consumed() {
        let repo = InMemorySubscriptionRepository::new();
        let record = SubscriptionRecord::new(user("u1"), t0());
        repo.insert(&record).await.unwrap();
        repo.force_cas_conflicts(2);

        assert!(!repo.compare_and_swap(&record, t0()).await.unwrap());
        assert!(!repo.compare_and_swap(&record, t0()).await.unwrap());
        assert!(repo.compare_and_swap(&record, t0()).await.unwrap());
    }

    #[tokio::test]
    async fn injected_write_failure_surfaces_database_error() {
        let repo = InMemorySubscriptionRepository::new();
        repo.fail_writes(true).await;
        let err = repo
            .insert(&SubscriptionRecord::new(user("u1"), t0()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[tokio::test]
    async fn subscription_id_is_unique_across_users() {
        let repo = InMemorySubscriptionRepository::new();
        let mut owner = SubscriptionRecord::new(user("owner"), t0());
        owner.external_subscription_id = Some("sub_1".to_string());
        repo.put(owner).await;

        let other = SubscriptionRecord::new(user("other"), t0());
        repo.insert(&other).await.unwrap();
        let mut claiming = other.clone();
        claiming.external_subscription_id = Some("sub_1".to_string());
        claiming.updated_at = t0().add_minutes(1);

        let err = repo.compare_and_swap(&claiming, other.updated_at).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConstraintViolated);
        assert_eq!(repo.get(&user("other")).await.unwrap(), other);
        assert_eq!(
            repo.find_by_external_subscription_id("sub_1").await.unwrap().unwrap().user_id,
            user("owner")
        );
    }

    #[tokio::test]
    async fn lookups_by_external_id_and_scans() {
        let repo = InMemorySubscriptionRepository::new();

        let mut pending = SubscriptionRecord::new(user("p"), t0());
        pending.status = SubscriptionStatus::Pending;
        repo.put(pending).await;

        let mut lapsed = SubscriptionRecord::new(user("a"), t0());
        lapsed.status = SubscriptionStatus::Active;
        lapsed.end_date = Some(t0().add_days(-1));
        lapsed.external_subscription_id = Some("sub_a".to_string());
        repo.put(lapsed).await;

        let found = repo.find_by_external_subscription_id("sub_a").await.unwrap();
        assert_eq!(found.unwrap().user_id, user("a"));
        assert!(repo.find_by_external_subscription_id("sub_x").await.unwrap().is_none());

        assert_eq!(
            repo.find_stale_pending(t0().add_minutes(1)).await.unwrap(),
            vec![user("p")]
        );
        assert!(repo.find_stale_pending(t0()).await.unwrap().is_empty());
        assert_eq!(repo.find_lapsed(t0()).await.unwrap(), vec![user("a")]);
    }
}
