//! Startup configuration failures.

use thiserror::Error;

/// Loading or validating [`AppConfig`](super::AppConfig) failed. Either way the
/// process exits before binding a socket.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    ValidationFailed(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0} must be set")]
    MissingRequired(&'static str),

    // server
    #[error("server.port must be non-zero")]
    InvalidPort,
    #[error("server.host must be an IP address")]
    InvalidHost,
    #[error("request timeout is zero or above its ceiling")]
    InvalidTimeout,

    // database
    #[error("database.url must use the postgres:// or postgresql:// scheme")]
    InvalidDatabaseUrl,
    #[error("database.pool_max must be positive and at least pool_min")]
    InvalidPoolSize,
    #[error("database.pool_max may not exceed 100")]
    PoolSizeTooLarge,

    // auth
    #[error("auth.session_secret is too short for production")]
    SessionSecretTooShort,

    // payment
    #[error("payment.api_base_url must use https in production")]
    GatewayMustBeHttps,
    #[error("payment.currency must be a 3-letter ISO 4217 code")]
    InvalidCurrency,

    // subscription
    #[error("subscription.trial_days must be between 1 and 365")]
    InvalidTrialDays,
    #[error("subscription.pending_timeout_mins must be between 1 and 10080")]
    InvalidPendingTimeout,
    #[error("subscription.sweep_interval_secs must be positive")]
    InvalidSweepInterval,
    #[error("subscription.max_cas_retries must be at least 1")]
    InvalidRetryCount,
    #[error("every plan needs a positive amount and period")]
    InvalidPlanTerms,
}
