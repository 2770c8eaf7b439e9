//! Error types shared by value objects, ports and adapters.

use std::fmt;
use thiserror::Error;

/// Raised when a value object rejects its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::EmptyField { field } | ValidationError::InvalidFormat { field, .. } => {
                field
            }
        }
    }
}

/// Category of a [`DomainError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Input rejected before it reached storage
    ValidationFailed,
    /// A storage constraint refused the write (e.g. a gateway id already
    /// owned by another user)
    ConstraintViolated,
    DatabaseError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::ConstraintViolated => "CONSTRAINT_VIOLATED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned across port boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] {message}")]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    /// Field that failed validation, when there is one
    pub field: Option<String>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::new(ErrorCode::ValidationFailed, message)
        }
    }

    /// Whether the caller sent something unacceptable, as opposed to the
    /// storage layer failing.
    pub fn is_client_error(&self) -> bool {
        !matches!(self.code, ErrorCode::DatabaseError)
    }
}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::validation(err.field().to_string(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_name_the_field() {
        let err = ValidationError::empty_field("user_id");
        assert_eq!(err.to_string(), "Field 'user_id' cannot be empty");
        assert_eq!(err.field(), "user_id");

        let err = ValidationError::invalid_format("plan", "unknown plan 'weekly'");
        assert_eq!(err.field(), "plan");
        assert!(err.to_string().ends_with("unknown plan 'weekly'"));
    }

    #[test]
    fn domain_error_display_is_prefixed_with_code() {
        let err = DomainError::database("connection reset");
        assert_eq!(err.to_string(), "[DATABASE_ERROR] connection reset");
        assert!(!err.is_client_error());
    }

    #[test]
    fn converted_validation_error_keeps_field() {
        let err: DomainError = ValidationError::empty_field("user_id").into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.field.as_deref(), Some("user_id"));
        assert!(err.is_client_error());
    }
}
