use chrono::Utc;
use common_auth::{AuthError, AuthResult, JwtConfig};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{Map, Value};

/// Issues HS256 access tokens with the same secret the verifier checks against.
pub struct TokenSigner {
    encoding_key: EncodingKey,
    ttl_seconds: i64,
}

impl TokenSigner {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            ttl_seconds: config.token_ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Signs the caller's payload after stamping `iat` and `exp`.
    ///
    /// The payload must be a JSON object carrying a non-empty `email` string. Any other
    /// fields (a `role`, say) are signed as-is but never consulted by authorization.
    pub fn issue(&self, payload: Value) -> AuthResult<String> {
        let mut claims: Map<String, Value> = match payload {
            Value::Object(map) => map,
            other => return Err(AuthError::InvalidJson(format!("expected object, got {other}"))),
        };
        match claims.get("email") {
            Some(Value::String(email)) if !email.trim().is_empty() => {}
            Some(other) => return Err(AuthError::InvalidClaim("email", other.to_string())),
            None => return Err(AuthError::InvalidClaim("email", String::new())),
        }

        let now = Utc::now().timestamp();
        claims.insert("iat".into(), Value::from(now));
        claims.insert("exp".into(), Value::from(now + self.ttl_seconds));

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Signing(err.to_string()))
    }
}
