use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Application-focused representation of verified JWT claims.
///
/// Only the identity is trusted. Anything else the token carries stays in
/// `raw` for diagnostics and is never used for authorization.
#[derive(Debug, Clone, Serialize)]
pub struct Claims {
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub issued_at: Option<DateTime<Utc>>,
    pub raw: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    email: String,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
}

impl TryFrom<ClaimsRepr> for Claims {
    type Error = AuthError;

    fn try_from(value: ClaimsRepr) -> AuthResult<Self> {
        let email = value.email.trim().to_owned();
        if email.is_empty() {
            return Err(AuthError::InvalidClaim("email", value.email));
        }

        let expires_at = Utc
            .timestamp_opt(value.exp, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidClaim("exp", value.exp.to_string()))?;

        let issued_at = match value.iat {
            Some(iat) => Some(
                Utc.timestamp_opt(iat, 0)
                    .single()
                    .ok_or_else(|| AuthError::InvalidClaim("iat", iat.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            email,
            expires_at,
            issued_at,
            raw: serde_json::Value::Null,
        })
    }
}

impl TryFrom<serde_json::Value> for Claims {
    type Error = AuthError;

    fn try_from(value: serde_json::Value) -> AuthResult<Self> {
        let repr: ClaimsRepr = serde_json::from_value(value.clone())
            .map_err(|err| AuthError::InvalidJson(err.to_string()))?;
        let mut claims = Claims::try_from(repr)?;
        claims.raw = value;
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn claims_keep_raw_payload() {
        let payload = json!({"email": "a@bistro.test", "exp": 1_900_000_000, "role": "admin"});
        let claims = Claims::try_from(payload.clone()).expect("claims");
        assert_eq!(claims.email, "a@bistro.test");
        assert_eq!(claims.expires_at.timestamp(), 1_900_000_000);
        assert!(claims.issued_at.is_none());
        assert_eq!(claims.raw, payload);
    }

    #[test]
    fn blank_email_is_rejected() {
        let err = Claims::try_from(json!({"email": "  ", "exp": 1})).expect_err("blank email");
        assert!(matches!(err, AuthError::InvalidClaim("email", _)));
    }

    #[test]
    fn missing_email_is_malformed() {
        let err = Claims::try_from(json!({"exp": 1})).expect_err("no email");
        assert!(matches!(err, AuthError::InvalidJson(_)));
    }
}
