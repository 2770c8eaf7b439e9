//! Razorpay payment gateway adapter.
//!
//! Implements the `PaymentGateway` port:
//! - Customer creation (idempotent per email)
//! - Order creation keyed by a deterministic receipt
//! - Subscription lookup for webhook cross-checks
//! - Checkout and webhook signature verification
//!
//! # Security
//!
//! - Signatures use HMAC-SHA256 with constant-time comparison
//! - All secrets are handled via `secrecy::SecretString`
//!
//! # Configuration
//!
//! Required environment variables:
//! - `COURSEGATE__PAYMENT__KEY_ID`: API key id
//! - `COURSEGATE__PAYMENT__KEY_SECRET`: API key secret, also signs checkouts
//! - `COURSEGATE__PAYMENT__WEBHOOK_SECRET`: webhook signing secret

mod mock_payment_gateway;
mod razorpay_adapter;

pub use mock_payment_gateway::{
    MethodCall, MockPaymentGateway, MOCK_KEY_SECRET, MOCK_WEBHOOK_SECRET,
};
pub use razorpay_adapter::{RazorpayConfig, RazorpayGateway};
