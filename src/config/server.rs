//! HTTP listener settings and deployment environment.

use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use super::error::ValidationError;

const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind; must be a literal IP address
    pub host: String,
    pub port: u16,
    pub environment: Environment,

    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_level: String,

    /// Whole-request deadline, including the gateway round trip of
    /// order creation
    pub request_timeout_secs: u64,

    /// Comma-separated browser origins allowed to call the API
    pub cors_origins: Option<String>,
}

/// Deployment environment. Production tightens secret and gateway checks and
/// switches logs to JSON.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let ip: IpAddr = self
            .host
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidHost)?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }

    pub fn cors_origins_list(&self) -> Vec<String> {
        let Some(raw) = self.cors_origins.as_deref() else {
            return Vec::new();
        };
        raw.split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(ValidationError::InvalidTimeout);
        }
        self.socket_addr().map(|_| ())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: Environment::Development,
            log_level: "info,coursegate=debug,sqlx=warn".to_string(),
            request_timeout_secs: 30,
            cors_origins: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_all_interfaces() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(!config.is_production());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn hostnames_are_not_resolved() {
        let config = ServerConfig {
            host: "localhost".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidHost)));

        let v6 = ServerConfig {
            host: "::1".to_string(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(v6.socket_addr().unwrap().to_string(), "[::1]:9000");
    }

    #[test]
    fn blank_cors_entries_are_dropped() {
        let config = ServerConfig {
            cors_origins: Some(" https://learn.example.com,, https://admin.example.com ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.cors_origins_list(),
            vec!["https://learn.example.com", "https://admin.example.com"]
        );
        assert!(ServerConfig::default().cors_origins_list().is_empty());
    }

    #[test]
    fn zero_port_and_out_of_range_timeouts_fail() {
        let zero_port = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert!(matches!(zero_port.validate(), Err(ValidationError::InvalidPort)));

        for secs in [0, 301] {
            let config = ServerConfig {
                request_timeout_secs: secs,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(ValidationError::InvalidTimeout)));
        }
    }

    #[test]
    fn environment_parses_lowercase() {
        let env: Environment = serde_json::from_str("\"production\"").unwrap();
        assert_eq!(env, Environment::Production);
        assert!(serde_json::from_str::<Environment>("\"Production\"").is_err());
    }
}
