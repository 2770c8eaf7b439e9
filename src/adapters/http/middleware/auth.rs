//! Authentication middleware and extractors for axum.
//!
//! This module provides:
//! - `auth_middleware` - validates Bearer tokens and injects the caller into extensions
//! - `RequireAuth` - extractor that requires a session
//! - `RequireAdmin` - extractor that requires a session with the admin role
//!
//! ```text
//! Request → auth_middleware → injects AuthenticatedUser into extensions
//!                                      ↓
//!                              Handler → RequireAuth extractor reads from extensions
//! ```
//!
//! Routes without a token pass through untouched; the extractors decide
//! whether that is acceptable. The webhook route uses neither.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::ports::SessionValidator;

/// Auth middleware state - wraps the session validator.
pub type AuthState = Arc<dyn SessionValidator>;

/// Validates `Authorization: Bearer <token>` when present.
///
/// On success the caller is inserted into request extensions. An invalid or
/// expired token is rejected here with 401; a missing one is not.
pub async fn auth_middleware(
    State(validator): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        return next.run(request).await;
    };

    match validator.validate(token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => AuthRejection::from(e).into_response(),
    }
}

/// Extractor that requires an authenticated caller.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(RequireAuth)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

/// Extractor that requires an authenticated caller with the admin role.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthenticatedUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        user.require_admin()?;
        Ok(RequireAdmin(user))
    }
}

/// Rejection type for authentication failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// No session was presented.
    Unauthenticated,
    /// A session was presented and rejected.
    InvalidSession(AuthError),
    /// Valid session, wrong role.
    Forbidden,
    /// The validator itself failed.
    Unavailable,
}

impl From<AuthError> for AuthRejection {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InsufficientPermissions => AuthRejection::Forbidden,
            AuthError::ServiceUnavailable(msg) => {
                tracing::error!("Auth service unavailable: {}", msg);
                AuthRejection::Unavailable
            }
            other => AuthRejection::InvalidSession(other),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthRejection::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", "Authentication required")
            }
            AuthRejection::InvalidSession(AuthError::TokenExpired) => {
                (StatusCode::UNAUTHORIZED, "SESSION_EXPIRED", "Session expired")
            }
            AuthRejection::InvalidSession(_) => {
                (StatusCode::UNAUTHORIZED, "INVALID_SESSION", "Invalid session")
            }
            AuthRejection::Forbidden => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", "Insufficient permissions")
            }
            AuthRejection::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "AUTH_UNAVAILABLE",
                "Authentication service unavailable",
            ),
        };

        (
            status,
            Json(serde_json::json!({
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}
