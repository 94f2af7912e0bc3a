use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use common_auth::{AuthContext, JwtVerifier};
use common_http_errors::{ApiError, ApiResult};
use tracing::{debug, warn};

use crate::metrics::ServiceMetrics;
use crate::models::User;
use crate::store::UserRepository;

/// Admits admin-only operations by re-reading the caller's stored role on every request.
#[derive(Clone)]
pub struct RoleGate {
    users: Arc<dyn UserRepository>,
    metrics: Arc<ServiceMetrics>,
}

impl RoleGate {
    pub fn new(users: Arc<dyn UserRepository>, metrics: Arc<ServiceMetrics>) -> Self {
        Self { users, metrics }
    }

    pub async fn admit(&self, auth: &AuthContext) -> ApiResult<User> {
        let email = auth.email();
        let user = self
            .users
            .find_by_email(email)
            .await
            .map_err(|err| ApiError::internal(err, None))?;

        match user {
            Some(user) if user.role.is_admin() => {
                self.metrics.gate_decision("admitted");
                debug!(%email, "admin gate admitted");
                Ok(user)
            }
            Some(user) => {
                self.metrics.gate_decision("denied");
                warn!(%email, role = user.role.as_str(), "admin gate denied");
                Err(ApiError::forbidden())
            }
            None => {
                self.metrics.gate_decision("unknown_user");
                warn!(%email, "admin gate denied: no stored user");
                Err(ApiError::forbidden())
            }
        }
    }
}

/// A verified caller whose stored role is `admin`.
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub auth: AuthContext,
    pub user: User,
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminContext
where
    Arc<JwtVerifier>: FromRef<S>,
    RoleGate: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthContext::from_request_parts(parts, state).await?;
        let user = RoleGate::from_ref(state).admit(&auth).await?;
        Ok(Self { auth, user })
    }
}
