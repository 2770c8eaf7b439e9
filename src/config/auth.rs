//! Session validation configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Minimum HS256 key length accepted in production
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Session token configuration (HS256 JWTs issued by the identity service)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HMAC key used by the identity service to sign sessions
    pub session_secret: SecretString,

    /// Expected `iss` claim, if the issuer sets one
    pub issuer: Option<String>,
}

impl AuthConfig {
    /// Validate authentication configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let secret = self.session_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("COURSEGATE__AUTH__SESSION_SECRET"));
        }
        if *environment == Environment::Production && secret.len() < MIN_PRODUCTION_SECRET_LEN {
            return Err(ValidationError::SessionSecretTooShort);
        }
        Ok(())
    }
}
