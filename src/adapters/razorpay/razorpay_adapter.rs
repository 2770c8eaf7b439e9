//! Razorpay payment gateway adapter.
//!
//! Implements the `PaymentGateway` port over the Razorpay REST API.
//!
//! # Security
//!
//! - Checkout and webhook signatures are HMAC-SHA256, compared in constant time
//! - Secrets handled via `secrecy::SecretString`
//!
//! # Resilience
//!
//! Every request is bounded by the client-wide timeout from configuration.
//! Order creation sends a deterministic receipt so a retried call maps onto
//! the same order.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::PaymentConfig;
use crate::domain::subscription::signature;
use crate::ports::{
    CreateCustomerRequest, CreateOrderRequest, Customer, GatewaySubscription, Order, PaymentError,
    PaymentErrorCode, PaymentGateway,
};

/// Razorpay API configuration.
#[derive(Clone)]
pub struct RazorpayConfig {
    key_id: String,
    key_secret: SecretString,
    webhook_secret: SecretString,
    api_base_url: String,
    timeout: Duration,
}

impl RazorpayConfig {
    pub fn new(
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
        webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: SecretString::new(key_secret.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: "https://api.razorpay.com/v1".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Builds the adapter config from the application settings.
    pub fn from_settings(settings: &PaymentConfig) -> Self {
        Self {
            key_id: settings.key_id.clone(),
            key_secret: settings.key_secret.clone(),
            webhook_secret: settings.webhook_secret.clone(),
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            timeout: settings.request_timeout(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Razorpay gateway adapter.
pub struct RazorpayGateway {
    config: RazorpayConfig,
    http_client: reqwest::Client,
}

impl RazorpayGateway {
    /// Creates the adapter with a client bounded by the configured timeout.
    pub fn new(config: RazorpayConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::provider(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base_url, path)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.basic_auth(&self.config.key_id, Some(self.config.key_secret.expose_secret()))
    }

    /// Sends a request and decodes a 2xx JSON body.
    ///
    /// Returns `Ok(None)` on 404 so lookups can report "unknown".
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        builder: reqwest::RequestBuilder,
    ) -> Result<Option<T>, PaymentError> {
        let response = self
            .authed(builder)
            .send()
            .await
            .map_err(|e| transport_error(operation, &e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = status_error(status, &body);
            tracing::error!(
                operation,
                status = status.as_u16(),
                code = %err.code,
                "Razorpay request failed"
            );
            return Err(err);
        }

        response.json::<T>().await.map(Some).map_err(|e| {
            PaymentError::provider(format!("Failed to parse Razorpay {} response: {}", operation, e))
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        // fail_existing=0 returns the existing customer for a known email
        let body = json!({
            "name": request.name,
            "email": request.email,
            "fail_existing": "0",
            "notes": { "user_id": request.user_id.as_str() },
        });

        let customer: RazorpayEntity = self
            .send("create_customer", self.http_client.post(self.url("customers")).json(&body))
            .await?
            .ok_or_else(|| PaymentError::not_found("customers endpoint"))?;

        tracing::info!(user_id = %request.user_id, customer_id = %customer.id, "Gateway customer ready");
        Ok(Customer { id: customer.id })
    }

    async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, PaymentError> {
        let body = json!({
            "amount": request.amount,
            "currency": request.currency,
            "receipt": request.receipt,
            "notes": {
                "user_id": request.user_id.as_str(),
                "customer_id": request.customer_id,
            },
        });

        let order: RazorpayOrder = self
            .send("create_order", self.http_client.post(self.url("orders")).json(&body))
            .await?
            .ok_or_else(|| PaymentError::not_found("orders endpoint"))?;

        Ok(Order {
            id: order.id,
            amount: order.amount,
            currency: order.currency,
            receipt: order.receipt,
        })
    }

    async fn fetch_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<GatewaySubscription>, PaymentError> {
        if subscription_id.is_empty() || !subscription_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(PaymentError::invalid_request("malformed subscription id"));
        }
        let url = self.url(&format!("subscriptions/{}", subscription_id));
        let found: Option<RazorpaySubscription> =
            self.send("fetch_subscription", self.http_client.get(url)).await?;

        Ok(found.map(|s| GatewaySubscription {
            id: s.id,
            status: s.status,
            customer_id: s.customer_id,
            current_end: s.current_end,
        }))
    }

    fn verify_payment_signature(&self, order_id: &str, payment_id: &str, provided: &str) -> bool {
        let message = signature::payment_message(order_id, payment_id);
        let ok = signature::verify_hex(
            self.config.key_secret.expose_secret(),
            message.as_bytes(),
            provided,
        );
        if !ok {
            tracing::warn!(order_id, payment_id, "Checkout signature mismatch");
        }
        ok
    }

    fn verify_webhook_signature(&self, raw_body: &[u8], provided: &str) -> bool {
        let ok = signature::verify_hex(self.config.webhook_secret.expose_secret(), raw_body, provided);
        if !ok {
            tracing::warn!(body_len = raw_body.len(), "Webhook signature mismatch");
        }
        ok
    }
}

#[derive(Debug, Deserialize)]
struct RazorpayEntity {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RazorpayOrder {
    id: String,
    amount: i64,
    currency: String,
    #[serde(default)]
    receipt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RazorpaySubscription {
    id: String,
    status: String,
    #[serde(default)]
    customer_id: Option<String>,
    #[serde(default)]
    current_end: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorBody {
    error: RazorpayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

fn transport_error(operation: &str, err: &reqwest::Error) -> PaymentError {
    if err.is_timeout() {
        tracing::warn!(operation, "Razorpay request timed out");
        PaymentError::timeout(format!("{} timed out", operation))
    } else {
        PaymentError::network(format!("{}: {}", operation, err))
    }
}

/// Maps a non-2xx response to a `PaymentError`.
fn status_error(status: StatusCode, body: &str) -> PaymentError {
    let detail = serde_json::from_str::<RazorpayErrorBody>(body).ok().map(|b| b.error);
    let description = detail
        .as_ref()
        .and_then(|d| d.description.clone())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    let code = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PaymentErrorCode::AuthenticationError,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => PaymentErrorCode::InvalidRequest,
        StatusCode::TOO_MANY_REQUESTS => PaymentErrorCode::RateLimitExceeded,
        StatusCode::NOT_FOUND => PaymentErrorCode::NotFound,
        _ => PaymentErrorCode::ProviderError,
    };

    let err = PaymentError::new(code, description);
    match detail.and_then(|d| d.code) {
        Some(provider_code) => err.with_provider_code(provider_code),
        None => err,
    }
}
