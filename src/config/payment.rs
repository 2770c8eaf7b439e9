//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Payment gateway configuration (Razorpay-compatible API)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// API key id (public half of the key pair)
    pub key_id: String,

    /// API key secret; also signs checkout confirmations
    pub key_secret: SecretString,

    /// Shared secret for webhook signatures
    pub webhook_secret: SecretString,

    /// Gateway REST base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// ISO currency for orders
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Upper bound for any single gateway call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl PaymentConfig {
    /// Get gateway call timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check if using test-mode keys
    pub fn is_test_mode(&self) -> bool {
        self.key_id.starts_with("rzp_test_")
    }

    /// Validate payment configuration
    ///
    /// Plain HTTP gateways are refused in production.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.key_id.is_empty() {
            return Err(ValidationError::MissingRequired("COURSEGATE__PAYMENT__KEY_ID"));
        }
        if self.key_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("COURSEGATE__PAYMENT__KEY_SECRET"));
        }
        if self.webhook_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("COURSEGATE__PAYMENT__WEBHOOK_SECRET"));
        }
        if !self.api_base_url.starts_with("https://") && *environment == Environment::Production {
            return Err(ValidationError::GatewayMustBeHttps);
        }
        if self.currency.len() != 3 {
            return Err(ValidationError::InvalidCurrency);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 60 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_api_base_url() -> String {
    "https://api.razorpay.com/v1".to_string()
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_request_timeout() -> u64 {
    10
}
