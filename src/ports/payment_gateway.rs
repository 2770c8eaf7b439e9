//! Payment gateway port.
//!
//! The narrow slice of the gateway this service needs: customers, orders,
//! subscription lookup and the two signature checks. Signature checks are
//! synchronous because they only need the shared secrets.
//!
//! Network calls must be bounded by a timeout in the adapter. Order creation
//! carries a receipt so a retried call does not create a second order.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserId;
use crate::domain::subscription::SubscriptionError;

/// Port for the external payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create (or fetch the existing) gateway customer for a user.
    async fn create_customer(&self, request: CreateCustomerRequest)
        -> Result<Customer, PaymentError>;

    /// Create a payment order.
    ///
    /// `receipt` is the idempotency key: the same receipt yields the same
    /// order on gateways that de-duplicate by it.
    async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, PaymentError>;

    /// Fetch a subscription by gateway id.
    ///
    /// Returns `None` if the gateway does not know the id.
    async fn fetch_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<GatewaySubscription>, PaymentError>;

    /// Check the signature returned by checkout for `order_id|payment_id`.
    fn verify_payment_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;

    /// Check a webhook signature over the raw request body.
    fn verify_webhook_signature(&self, raw_body: &[u8], signature: &str) -> bool;
}

/// Request to create a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    /// Internal user ID (stored as gateway notes).
    pub user_id: UserId,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Customer in the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
}

/// Request to create an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: UserId,
    pub customer_id: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    /// Deterministic receipt, also the idempotency key.
    pub receipt: String,
}

/// Order in the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
}

/// Subscription as the gateway reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySubscription {
    pub id: String,
    /// Raw gateway status (`active`, `halted`, ...).
    pub status: String,
    pub customer_id: Option<String>,
    /// Unix seconds.
    pub current_end: Option<i64>,
}

/// Errors from payment gateway operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Gateway's own error code, if it sent one.
    pub provider_code: Option<String>,
    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::Timeout, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidRequest, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for SubscriptionError {
    fn from(err: PaymentError) -> Self {
        SubscriptionError::gateway(err.to_string(), err.retryable)
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// The call did not finish within the configured timeout.
    Timeout,

    /// API key rejected.
    AuthenticationError,

    /// Gateway rejected the request body.
    InvalidRequest,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Gateway 5xx or unexpected response.
    ProviderError,
}

impl PaymentErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError
                | PaymentErrorCode::Timeout
                | PaymentErrorCode::RateLimitExceeded
                | PaymentErrorCode::ProviderError
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::Timeout => "timeout",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::InvalidRequest => "invalid_request",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}
