//! Foundation module - Shared domain primitives.
//!
//! Value objects, identifiers and error types used by every other layer.

mod auth;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser, Role};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::UserId;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
