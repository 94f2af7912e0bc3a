use std::sync::Arc;

use axum::{extract::State, Json};
use common_auth::AuthError;
use common_http_errors::{ApiError, ApiResult};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::tokens::TokenSigner;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub async fn issue_token(
    State(signer): State<Arc<TokenSigner>>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<TokenResponse>> {
    let email = payload
        .get("email")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let token = signer.issue(payload).map_err(|err| match err {
        AuthError::Signing(_) => ApiError::internal(err, None),
        other => ApiError::invalid("invalid_token_payload", other.to_string()),
    })?;
    info!(%email, ttl_seconds = signer.ttl_seconds(), "access token issued");
    Ok(Json(TokenResponse { token }))
}
