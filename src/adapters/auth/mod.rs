//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `jwt` - HS256 sessions signed by the identity service
//! - `mock` - token map for tests that don't need signed tokens

mod jwt;
mod mock;

pub use jwt::{JwtSessionValidator, SessionClaims};
pub use mock::MockSessionValidator;
