use axum::response::{IntoResponse, Response};
use common_http_errors::ApiError;
use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to decode token header: {0}")]
    InvalidHeader(String),
    #[error("token verification failed: {0}")]
    Verification(String),
    #[error("token expired")]
    Expired,
    #[error("invalid claim '{0}' with value '{1}'")]
    InvalidClaim(&'static str, String),
    #[error("malformed claim payload: {0}")]
    InvalidJson(String),
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("authorization header malformed")]
    InvalidAuthorization,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        match value.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Verification(value.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        if let AuthError::Signing(_) = value {
            return ApiError::internal(value, None);
        }
        let code = match &value {
            AuthError::MissingAuthorization | AuthError::InvalidAuthorization => "auth_header",
            AuthError::InvalidHeader(_) | AuthError::Verification(_) => "auth_token",
            AuthError::Expired => "auth_expired",
            AuthError::InvalidClaim(_, _) | AuthError::InvalidJson(_) => "auth_claims",
            AuthError::Signing(_) => "auth_signing",
        };
        ApiError::unauthenticated(code, value.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn token_failures_are_unauthenticated() {
        for err in [
            AuthError::MissingAuthorization,
            AuthError::InvalidAuthorization,
            AuthError::Verification("InvalidSignature".into()),
            AuthError::Expired,
            AuthError::InvalidClaim("email", String::new()),
        ] {
            let resp = err.into_response();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            assert!(resp.headers().get("X-Error-Code").is_some());
        }
    }

    #[test]
    fn signing_failure_is_internal() {
        let resp = AuthError::Signing("bad key".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
