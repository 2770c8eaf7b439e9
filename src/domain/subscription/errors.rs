//! Subscription error taxonomy.
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Validation, InvalidPlan | 400 |
//! | AlreadyActive, OrderPending, NotEligible, TrialAlreadyUsed | 400 |
//! | MissingSignature, InvalidSignature, MalformedPayload | 400 |
//! | UserNotFound | 404 |
//! | Conflict | 409 |
//! | Gateway | 502 |
//! | Infrastructure | 500 |

use thiserror::Error;

use super::SubscriptionStatus;
use crate::domain::foundation::{DomainError, UserId, ValidationError};

/// Errors surfaced by subscription operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unknown plan type: '{0}'")]
    InvalidPlan(String),

    #[error("Subscription is already active")]
    AlreadyActive,

    #[error("An order for a different plan is still pending; cancel it first")]
    OrderPending,

    #[error("Not eligible from status '{0}'")]
    NotEligible(SubscriptionStatus),

    #[error("Trial has already been used")]
    TrialAlreadyUsed,

    #[error("Missing signature")]
    MissingSignature,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Payment gateway error: {message}")]
    Gateway { message: String, retryable: bool },

    #[error("Subscription was modified concurrently, retry the request")]
    Conflict,

    #[error("Internal error: {0}")]
    Infrastructure(String),
}

impl SubscriptionError {
    pub fn validation(message: impl Into<String>) -> Self {
        SubscriptionError::Validation(message.into())
    }

    pub fn invalid_plan(raw: impl Into<String>) -> Self {
        SubscriptionError::InvalidPlan(raw.into())
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        SubscriptionError::MalformedPayload(reason.into())
    }

    pub fn gateway(message: impl Into<String>, retryable: bool) -> Self {
        SubscriptionError::Gateway {
            message: message.into(),
            retryable,
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        SubscriptionError::Infrastructure(message.into())
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            SubscriptionError::Validation(_) => "VALIDATION_FAILED",
            SubscriptionError::InvalidPlan(_) => "INVALID_PLAN",
            SubscriptionError::AlreadyActive => "ALREADY_ACTIVE",
            SubscriptionError::OrderPending => "ORDER_PENDING",
            SubscriptionError::NotEligible(_) => "NOT_ELIGIBLE",
            SubscriptionError::TrialAlreadyUsed => "TRIAL_ALREADY_USED",
            SubscriptionError::MissingSignature => "MISSING_SIGNATURE",
            SubscriptionError::InvalidSignature => "INVALID_SIGNATURE",
            SubscriptionError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            SubscriptionError::UserNotFound(_) => "USER_NOT_FOUND",
            SubscriptionError::Gateway { .. } => "GATEWAY_ERROR",
            SubscriptionError::Conflict => "CONCURRENT_MODIFICATION",
            SubscriptionError::Infrastructure(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            SubscriptionError::Gateway { retryable, .. } => *retryable,
            SubscriptionError::Conflict | SubscriptionError::Infrastructure(_) => true,
            _ => false,
        }
    }

    /// Signature and payload errors, rejected before any state is touched.
    pub fn is_signature_error(&self) -> bool {
        matches!(
            self,
            SubscriptionError::MissingSignature
                | SubscriptionError::InvalidSignature
                | SubscriptionError::MalformedPayload(_)
        )
    }
}

impl From<DomainError> for SubscriptionError {
    fn from(err: DomainError) -> Self {
        if err.is_client_error() {
            SubscriptionError::Validation(err.message)
        } else {
            SubscriptionError::Infrastructure(err.to_string())
        }
    }
}

impl From<ValidationError> for SubscriptionError {
    fn from(err: ValidationError) -> Self {
        SubscriptionError::Validation(err.to_string())
    }
}
