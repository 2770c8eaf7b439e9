//! In-memory identity directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{UserContact, UserDirectory};

#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<UserId, UserContact>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, contact: UserContact) {
        self.users
            .write()
            .await
            .insert(contact.user_id.clone(), contact);
    }

    /// Registers a user with a derived email address.
    pub async fn add_user(&self, user_id: &UserId) {
        self.add(UserContact {
            user_id: user_id.clone(),
            email: Some(format!("{}@example.com", user_id)),
            name: None,
        })
        .await;
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<UserContact>, DomainError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }
}
