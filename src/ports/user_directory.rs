//! Identity directory port.
//!
//! Users are owned by the identity service. This service only needs to know
//! whether a user exists and how to address them when opening a gateway
//! customer.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};

/// Contact details of a known user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContact {
    pub user_id: UserId,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Read-only lookup into the identity store.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns `None` for unknown users.
    async fn find_user(&self, user_id: &UserId) -> Result<Option<UserContact>, DomainError>;
}
