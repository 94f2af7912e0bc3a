use common_http_errors::ApiError;
use tracing::warn;

use crate::AuthContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    /// The caller asked for a resource owned by another identity.
    IdentityMismatch { expected: String, requested: Option<String> },
}

impl From<GuardError> for ApiError {
    fn from(value: GuardError) -> Self {
        match value {
            GuardError::IdentityMismatch { .. } => ApiError::forbidden(),
        }
    }
}

/// Self-only access: the requested email must be exactly the verified one.
pub fn ensure_self(auth: &AuthContext, requested: Option<&str>) -> Result<(), GuardError> {
    match requested {
        Some(email) if email == auth.claims.email => Ok(()),
        other => {
            warn!(
                caller = %auth.claims.email,
                requested = ?other,
                "self_only_check_failed"
            );
            Err(GuardError::IdentityMismatch {
                expected: auth.claims.email.clone(),
                requested: other.map(str::to_owned),
            })
        }
    }
}
