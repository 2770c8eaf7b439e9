//! Mock session validator for testing.
//!
//! Maps literal tokens to callers so HTTP tests don't need signed JWTs.
//!
//! # Example
//!
//! ```ignore
//! use coursegate::adapters::auth::MockSessionValidator;
//!
//! let validator = MockSessionValidator::new()
//!     .with_member("member-token", "user-1")
//!     .with_admin("admin-token", "ops-1");
//!
//! let caller = validator.validate("member-token").await?;
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Stores a map of tokens to callers. Unknown tokens return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    /// Returned for every validation when set
    force_error: RwLock<Option<AuthError>>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a valid token that maps to a caller.
    pub fn with_user(self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.add_token(token, user);
        self
    }

    /// Adds a member token for `user_id`.
    ///
    /// # Panics
    ///
    /// If `user_id` is blank.
    pub fn with_member(self, token: impl Into<String>, user_id: &str) -> Self {
        let id = UserId::new(user_id).expect("test user id must not be blank");
        let email = format!("{}@example.com", user_id);
        self.with_user(token, AuthenticatedUser::member(id).with_email(email))
    }

    /// Adds an admin token for `user_id`.
    ///
    /// # Panics
    ///
    /// If `user_id` is blank.
    pub fn with_admin(self, token: impl Into<String>, user_id: &str) -> Self {
        let id = UserId::new(user_id).expect("test user id must not be blank");
        self.with_user(token, AuthenticatedUser::admin(id))
    }

    /// Forces all validations to return the specified error.
    pub fn with_error(self, error: AuthError) -> Self {
        if let Ok(mut slot) = self.force_error.write() {
            *slot = Some(error);
        }
        self
    }

    /// Registers a new valid token at runtime.
    pub fn add_token(&self, token: impl Into<String>, user: AuthenticatedUser) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(token.into(), user);
        }
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let forced = self.force_error.read().ok().and_then(|e| e.clone());
        if let Some(error) = forced {
            return Err(error);
        }

        self.tokens
            .read()
            .map_err(|_| AuthError::service_unavailable("token map poisoned"))?
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
