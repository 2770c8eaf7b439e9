//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Identifier of a user, owned by the external identity provider.
///
/// Opaque to this service: any non-empty string the session issuer hands out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new UserId, returning error if empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("user_id"));
        }
        Ok(Self(id))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_accepts_opaque_string() {
        let id = UserId::new("64f0c2a9e1b3").unwrap();
        assert_eq!(id.as_str(), "64f0c2a9e1b3");
        assert_eq!(id.to_string(), "64f0c2a9e1b3");
    }

    #[test]
    fn user_id_rejects_empty_and_blank() {
        for raw in ["", "   "] {
            match UserId::new(raw) {
                Err(ValidationError::EmptyField { field }) => assert_eq!(field, "user_id"),
                other => panic!("expected EmptyField, got {:?}", other),
            }
        }
    }

    #[test]
    fn user_id_serializes_transparently() {
        let id = UserId::new("user-1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"user-1\"");
    }
}
