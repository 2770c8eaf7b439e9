//! Read-modify-write access to subscription records.
//!
//! Every handler mutates records through [`RecordStore::update`], which
//! re-reads and re-applies the change when a compare-and-swap loses, up to
//! the configured number of attempts.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::{SubscriptionError, SubscriptionRecord};
use crate::ports::{Clock, SubscriptionRepository, UserDirectory};

/// Outcome of a successful read-modify-write.
#[derive(Debug, Clone)]
pub struct Mutation<T> {
    /// Record as stored after the call.
    pub record: SubscriptionRecord,
    /// Value returned by the mutation closure on the winning attempt.
    pub value: T,
    /// False when the closure changed nothing and no write was issued.
    pub written: bool,
}

/// Shared record access for the subscription handlers.
#[derive(Clone)]
pub struct RecordStore {
    repository: Arc<dyn SubscriptionRepository>,
    directory: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
}

impl RecordStore {
    pub fn new(
        repository: Arc<dyn SubscriptionRepository>,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        max_attempts: u32,
    ) -> Self {
        Self {
            repository,
            directory,
            clock,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn repository(&self) -> &Arc<dyn SubscriptionRepository> {
        &self.repository
    }

    pub fn directory(&self) -> &Arc<dyn UserDirectory> {
        &self.directory
    }

    /// Reads the user's record without creating it.
    pub async fn find(&self, user_id: &UserId) -> Result<Option<SubscriptionRecord>, SubscriptionError> {
        Ok(self.repository.find_by_user(user_id).await?)
    }

    /// Reads the user's record, creating a `none` record on first access.
    ///
    /// # Errors
    ///
    /// `UserNotFound` if neither a record nor a directory entry exists.
    pub async fn load_or_create(&self, user_id: &UserId) -> Result<SubscriptionRecord, SubscriptionError> {
        if let Some(record) = self.repository.find_by_user(user_id).await? {
            return Ok(record);
        }
        if self.directory.find_user(user_id).await?.is_none() {
            return Err(SubscriptionError::UserNotFound(user_id.clone()));
        }

        let fresh = SubscriptionRecord::new(user_id.clone(), self.clock.now());
        if self.repository.insert(&fresh).await? {
            tracing::debug!(user_id = %user_id, "Subscription record created");
            return Ok(fresh);
        }

        // a concurrent first access inserted before us
        self.repository
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| SubscriptionError::infrastructure("record missing after insert conflict"))
    }

    /// Applies `mutate` to the user's record (created on first access) and
    /// persists it with compare-and-swap.
    ///
    /// `mutate` receives a fresh copy of the stored record and the current
    /// time on every attempt. If it leaves `updated_at` alone nothing is
    /// written.
    ///
    /// # Errors
    ///
    /// Whatever `mutate` returns, or `Conflict` once every attempt lost.
    pub async fn update<T, F>(&self, user_id: &UserId, mutate: F) -> Result<Mutation<T>, SubscriptionError>
    where
        T: Send,
        F: FnMut(&mut SubscriptionRecord, Timestamp) -> Result<T, SubscriptionError> + Send,
    {
        self.load_or_create(user_id).await?;
        self.update_existing(user_id, mutate)
            .await?
            .ok_or_else(|| SubscriptionError::infrastructure("record vanished during update"))
    }

    /// Like [`update`](Self::update) but returns `Ok(None)` when the user has
    /// no record, instead of creating one.
    pub async fn update_existing<T, F>(
        &self,
        user_id: &UserId,
        mut mutate: F,
    ) -> Result<Option<Mutation<T>>, SubscriptionError>
    where
        T: Send,
        F: FnMut(&mut SubscriptionRecord, Timestamp) -> Result<T, SubscriptionError> + Send,
    {
        for attempt in 1..=self.max_attempts {
            let Some(mut record) = self.repository.find_by_user(user_id).await? else {
                return Ok(None);
            };
            let expected = record.updated_at;
            let value = mutate(&mut record, self.clock.now())?;

            if record.updated_at == expected {
                return Ok(Some(Mutation {
                    record,
                    value,
                    written: false,
                }));
            }

            if self.repository.compare_and_swap(&record, expected).await? {
                return Ok(Some(Mutation {
                    record,
                    value,
                    written: true,
                }));
            }

            tracing::debug!(user_id = %user_id, attempt, "Lost compare-and-swap, retrying");
        }

        tracing::warn!(
            user_id = %user_id,
            attempts = self.max_attempts,
            "Giving up after repeated concurrent modification"
        );
        Err(SubscriptionError::Conflict)
    }
}
