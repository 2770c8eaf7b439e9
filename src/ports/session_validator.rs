//! Session validation port.
//!
//! Sessions are issued by the identity service. HTTP middleware hands the
//! bearer token to this port and gets back the caller, or an [`AuthError`].

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates bearer tokens and extracts the caller.
///
/// # Contract
///
/// - `AuthError::InvalidToken` for malformed tokens or bad signatures
/// - `AuthError::TokenExpired` for expired tokens
/// - `AuthError::ServiceUnavailable` when validation cannot be performed
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a raw token (without the "Bearer " prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
