//! HTTP adapter for subscription endpoints.
//!
//! Exposes the subscription lifecycle via REST API:
//! - `POST /subscription/trial` - Start the one-time trial
//! - `POST /subscription/order` - Create or reuse a payment order
//! - `POST /subscription/verify` - Verify a completed checkout
//! - `GET /subscription/status` - Effective status and access
//! - `POST /subscription/cancel` - Abandon a pending order
//! - `POST /subscription/sweep` - Admin sweep
//! - `POST /webhooks/payment` - Gateway webhooks

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{SubscriptionApiError, SubscriptionAppState, SIGNATURE_HEADER};
pub use routes::subscription_router;
