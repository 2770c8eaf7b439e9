//! Access entitlement.
//!
//! Consulted on every content request, so it is pure: no I/O and no gateway
//! lookups. A lapsed `active` record is denied here even if the background
//! expiry job has not corrected it yet.

use super::{SubscriptionRecord, SubscriptionStatus};
use crate::domain::foundation::Timestamp;

/// Returns true if the user behind `record` may access paid content.
pub fn has_access(record: &SubscriptionRecord, free_access: bool, now: Timestamp) -> bool {
    if free_access {
        return true;
    }
    matches!(
        record.status,
        SubscriptionStatus::Trial | SubscriptionStatus::Active
    ) && record.window_open(now)
}
