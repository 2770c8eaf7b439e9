//! Application configuration module
//!
//! Configuration is read once at startup from environment variables (and a
//! `.env` file in development) using the `config` and `dotenvy` crates, then
//! passed by value into every component. Variables use the `COURSEGATE`
//! prefix with `__` between nesting levels.
//!
//! # Example
//!
//! ```no_run
//! use coursegate::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod error;
mod payment;
mod server;
mod subscription;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};
pub use subscription::SubscriptionConfig;

use serde::Deserialize;

use crate::domain::subscription::SubscriptionPolicy;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Session token validation
    pub auth: AuthConfig,

    /// Payment gateway credentials and limits
    pub payment: PaymentConfig,

    /// Trial length, pending timeout, plan catalog, free-access override
    #[serde(default)]
    pub subscription: SubscriptionConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `COURSEGATE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `COURSEGATE__PAYMENT__WEBHOOK_SECRET=...` -> `payment.webhook_secret`
    /// - `COURSEGATE__SUBSCRIPTION__PLANS__YEARLY__AMOUNT=499900`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("COURSEGATE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.payment.validate(&self.server.environment)?;
        self.subscription.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    /// Policy values handed to the subscription handlers
    pub fn subscription_policy(&self) -> SubscriptionPolicy {
        SubscriptionPolicy {
            free_access: self.subscription.free_access,
            trial_days: self.subscription.trial_days,
            pending_timeout_mins: self.subscription.pending_timeout_mins,
            max_cas_retries: self.subscription.max_cas_retries,
            currency: self.payment.currency.clone(),
            plans: self.subscription.plans.clone(),
        }
    }
}
