//! HS256 session validator.
//!
//! Sessions are JWTs signed by the identity service with a shared secret.
//! Only the claims this service needs are read: `sub`, `email`, `role` and
//! the standard expiry and issuer claims.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::domain::foundation::{AuthError, AuthenticatedUser, Role, UserId};
use crate::ports::SessionValidator;

/// Session claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject - the user ID
    pub sub: String,

    /// Expiry timestamp (Unix epoch seconds)
    pub exp: i64,

    #[serde(default)]
    pub iss: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub role: Role,
}

/// Validates HS256 session tokens against the shared secret.
pub struct JwtSessionValidator {
    secret: SecretString,
    issuer: Option<String>,
}

impl JwtSessionValidator {
    pub fn new(secret: SecretString, issuer: Option<String>) -> Self {
        Self { secret, issuer }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.session_secret.clone(), config.issuer.clone())
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());

        let data = decode::<SessionClaims>(token, &key, &self.validation()).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                ErrorKind::InvalidIssuer => {
                    tracing::warn!("Invalid issuer in token");
                    AuthError::InvalidToken
                }
                _ => {
                    tracing::warn!("Token validation failed: {}", e);
                    AuthError::InvalidToken
                }
            }
        })?;

        let claims = data.claims;
        let id = UserId::new(claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let user = AuthenticatedUser {
            id,
            email: claims.email,
            role: claims.role,
        };
        Ok(user)
    }
}
