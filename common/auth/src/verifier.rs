use std::collections::HashSet;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use tracing::debug;

use crate::claims::Claims;
use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};

/// Verifies HS256 bearer tokens against the server-held secret.
///
/// Signature and `exp` are the only checks; there is no revocation list, so
/// expiry is the sole way a token stops working.
#[derive(Clone)]
pub struct JwtVerifier {
    config: JwtConfig,
    key: DecodingKey,
}

impl JwtVerifier {
    pub fn new(config: JwtConfig) -> Self {
        let key = DecodingKey::from_secret(config.secret.as_bytes());
        Self { config, key }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.config.leeway_seconds.into();
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);
        validation
    }

    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let token_data = decode::<Value>(token, &self.key, &self.validation())
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::Base64(_)
                | jsonwebtoken::errors::ErrorKind::Json(_)
                | jsonwebtoken::errors::ErrorKind::Utf8(_) => {
                    AuthError::InvalidHeader(err.to_string())
                }
                _ => AuthError::from(err),
            })?;
        let claims = Claims::try_from(token_data.claims)?;
        debug!(email = %claims.email, "verified JWT successfully");
        Ok(claims)
    }
}
