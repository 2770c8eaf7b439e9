//! PostgreSQL connection settings.
//!
//! The subscription table sees short single-row transactions (CAS updates and
//! the periodic sweep), so the pool stays small by default.

use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

use super::error::ValidationError;

const MAX_POOL_SIZE: u32 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://` or `postgresql://` connection string
    pub url: String,

    #[serde(default = "DatabaseConfig::default_pool_min")]
    pub pool_min: u32,

    #[serde(default = "DatabaseConfig::default_pool_max")]
    pub pool_max: u32,

    /// Seconds a request waits for a free connection before failing with an
    /// infrastructure error
    #[serde(default = "DatabaseConfig::default_acquire_wait")]
    pub acquire_wait_secs: u64,

    /// Seconds before an idle connection is closed; `0` keeps it open
    #[serde(default = "DatabaseConfig::default_idle_close")]
    pub idle_close_secs: u64,

    /// Apply `migrations/` before serving traffic
    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    fn default_pool_min() -> u32 {
        1
    }

    fn default_pool_max() -> u32 {
        10
    }

    fn default_acquire_wait() -> u64 {
        5
    }

    fn default_idle_close() -> u64 {
        300
    }

    /// Pool options for `PgPoolOptions::connect`.
    pub fn pool_options(&self) -> PgPoolOptions {
        let idle = (self.idle_close_secs > 0).then(|| Duration::from_secs(self.idle_close_secs));
        PgPoolOptions::new()
            .min_connections(self.pool_min)
            .max_connections(self.pool_max)
            .acquire_timeout(Duration::from_secs(self.acquire_wait_secs))
            .idle_timeout(idle)
    }

    /// Connection string with the password masked, for startup logs.
    pub fn redacted_url(&self) -> String {
        let Some((scheme, rest)) = self.url.split_once("://") else {
            return "<invalid>".to_string();
        };
        let Some((credentials, host)) = rest.rsplit_once('@') else {
            return self.url.clone();
        };
        match credentials.split_once(':') {
            Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
            None => self.url.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("COURSEGATE__DATABASE__URL"));
        }
        let scheme = self.url.split_once("://").map(|(scheme, _)| scheme);
        if !matches!(scheme, Some("postgres" | "postgresql")) {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.pool_max == 0 || self.pool_min > self.pool_max {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.pool_max > MAX_POOL_SIZE {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool_min: Self::default_pool_min(),
            pool_max: Self::default_pool_max(),
            acquire_wait_secs: Self::default_acquire_wait(),
            idle_close_secs: Self::default_idle_close(),
            run_migrations: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_url(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_url_names_the_variable() {
        let err = with_url("  ").validate().unwrap_err();
        assert!(err.to_string().contains("COURSEGATE__DATABASE__URL"));
    }

    #[test]
    fn only_postgres_schemes_are_accepted() {
        assert!(with_url("postgres://db/coursegate").validate().is_ok());
        assert!(with_url("postgresql://db/coursegate").validate().is_ok());
        assert!(matches!(
            with_url("mysql://db/coursegate").validate(),
            Err(ValidationError::InvalidDatabaseUrl)
        ));
        assert!(matches!(
            with_url("db/coursegate").validate(),
            Err(ValidationError::InvalidDatabaseUrl)
        ));
    }

    #[test]
    fn pool_bounds_are_checked() {
        let inverted = DatabaseConfig {
            pool_min: 4,
            pool_max: 2,
            ..with_url("postgres://db/coursegate")
        };
        assert!(matches!(inverted.validate(), Err(ValidationError::InvalidPoolSize)));

        let empty = DatabaseConfig {
            pool_min: 0,
            pool_max: 0,
            ..with_url("postgres://db/coursegate")
        };
        assert!(matches!(empty.validate(), Err(ValidationError::InvalidPoolSize)));

        let huge = DatabaseConfig {
            pool_max: 101,
            ..with_url("postgres://db/coursegate")
        };
        assert!(matches!(huge.validate(), Err(ValidationError::PoolSizeTooLarge)));
    }

    #[test]
    fn pool_options_carry_the_limits() {
        let config = DatabaseConfig {
            pool_max: 3,
            idle_close_secs: 0,
            ..with_url("postgres://db/coursegate")
        };
        let options = config.pool_options();
        assert_eq!(options.get_max_connections(), 3);
        assert_eq!(options.get_idle_timeout(), None);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn redacted_url_hides_password_only() {
        assert_eq!(
            with_url("postgres://app:hunter2@db:5432/coursegate").redacted_url(),
            "postgres://app:***@db:5432/coursegate"
        );
        assert_eq!(
            with_url("postgres://db/coursegate").redacted_url(),
            "postgres://db/coursegate"
        );
        assert_eq!(with_url("garbage").redacted_url(), "<invalid>");
    }
}
