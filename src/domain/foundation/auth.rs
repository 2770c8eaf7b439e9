//! Authentication types for the domain layer.
//!
//! Sessions are issued elsewhere. This service only validates bearer tokens
//! through the `SessionValidator` port and works with the resulting
//! [`AuthenticatedUser`].

use super::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role carried by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Member,
    Admin,
}

/// Authenticated caller extracted from a validated session token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The unique user identifier from the session issuer.
    pub id: UserId,

    /// Email address if the token carries one.
    pub email: Option<String>,

    /// Role claim; members unless the issuer says otherwise.
    pub role: Role,
}

impl AuthenticatedUser {
    /// Creates a member session for `id`.
    pub fn member(id: UserId) -> Self {
        Self {
            id,
            email: None,
            role: Role::Member,
        }
    }

    /// Creates an admin session for `id`.
    pub fn admin(id: UserId) -> Self {
        Self {
            id,
            email: None,
            role: Role::Admin,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with `InsufficientPermissions` unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), AuthError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AuthError::InsufficientPermissions)
        }
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// Token is valid but the caller lacks the role for this action.
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    /// The session validator could not do its job (bad config, etc.).
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this error indicates the caller should re-authenticate.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, AuthError::InvalidToken | AuthError::TokenExpired)
    }
}
