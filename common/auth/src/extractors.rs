use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderValue};

use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};
use crate::verifier::JwtVerifier;

const SCHEME: &str = "bearer";

/// The raw credential taken from an `Authorization: Bearer <token>` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// The scheme is matched case-insensitively; the token itself must be non-empty.
    pub fn from_header(value: Option<&HeaderValue>) -> AuthResult<Self> {
        let raw = value
            .ok_or(AuthError::MissingAuthorization)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthorization)?
            .trim();

        let (scheme, token) = raw
            .split_once(' ')
            .ok_or(AuthError::InvalidAuthorization)?;
        let token = token.trim();
        if !scheme.eq_ignore_ascii_case(SCHEME) || token.is_empty() {
            return Err(AuthError::InvalidAuthorization);
        }
        Ok(Self(token.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A request whose bearer token verified. Carries identity only.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub claims: Claims,
    pub token: String,
}

impl AuthContext {
    pub fn email(&self) -> &str {
        &self.claims.email
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let bearer = BearerToken::from_header(parts.headers.get(AUTHORIZATION))?;
        let claims = Arc::<JwtVerifier>::from_ref(state).verify(bearer.as_str())?;
        Ok(Self {
            claims,
            token: bearer.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: &'static str) -> AuthResult<BearerToken> {
        BearerToken::from_header(Some(&HeaderValue::from_static(value)))
    }

    #[test]
    fn accepts_bearer_in_any_case() {
        assert_eq!(parse("Bearer abc.def.ghi").unwrap().as_str(), "abc.def.ghi");
        assert_eq!(parse("bearer  abc").unwrap().as_str(), "abc");
    }

    #[test]
    fn missing_header_is_distinct_from_malformed() {
        assert!(matches!(
            BearerToken::from_header(None),
            Err(AuthError::MissingAuthorization)
        ));
        assert!(matches!(parse("Basic dXNlcjpwdw=="), Err(AuthError::InvalidAuthorization)));
        assert!(matches!(parse("Bearer"), Err(AuthError::InvalidAuthorization)));
        assert!(matches!(parse("Bearer    "), Err(AuthError::InvalidAuthorization)));
    }
}
