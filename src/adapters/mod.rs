//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - JWT session validation (and a mock for tests)
//! - `http` - axum REST surface and webhook endpoint
//! - `memory` - in-memory repository and directory
//! - `notifier` - subscription notice delivery
//! - `postgres` - sqlx-backed repository and directory
//! - `razorpay` - payment gateway client (and a mock for tests)

pub mod auth;
pub mod http;
pub mod memory;
pub mod notifier;
pub mod postgres;
pub mod razorpay;

pub use auth::{JwtSessionValidator, MockSessionValidator};
pub use memory::{InMemorySubscriptionRepository, InMemoryUserDirectory};
pub use notifier::{LogNotifier, RecordingNotifier};
pub use postgres::{PostgresSubscriptionRepository, PostgresUserDirectory};
pub use razorpay::{MockPaymentGateway, RazorpayConfig, RazorpayGateway};
