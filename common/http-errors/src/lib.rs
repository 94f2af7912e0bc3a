use axum::{http::{StatusCode, HeaderValue}, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use uuid::Uuid;

mod metrics;

pub use metrics::{error_metrics_registry, http_error_metrics_layer, ERROR_CODE_HEADER, MAX_ERROR_CODES};

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")] pub missing_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")] pub trace_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")] pub message: Option<String>,
}

/// Error taxonomy shared by every handler. Each variant maps to exactly one
/// HTTP status; the `code` lands in both the JSON body and `X-Error-Code`.
#[derive(Debug)]
pub enum ApiError {
    /// Missing, malformed or expired credentials.
    Unauthenticated { code: &'static str, trace_id: Option<Uuid>, message: Option<String> },
    ForbiddenMissingRole { role: &'static str, trace_id: Option<Uuid> },
    Forbidden { trace_id: Option<Uuid> },
    BadRequest { code: &'static str, trace_id: Option<Uuid>, message: Option<String> },
    NotFound { code: &'static str, trace_id: Option<Uuid> },
    /// The ledger write of a settlement did not complete.
    SettlementFailed { trace_id: Option<Uuid>, message: Option<String> },
    /// The external payment processor refused or could not be reached.
    ProcessorUnavailable { trace_id: Option<Uuid>, message: Option<String> },
    Internal { trace_id: Option<Uuid>, message: Option<String> },
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(e: E, trace_id: Option<Uuid>) -> Self { Self::Internal { trace_id, message: Some(e.to_string()) } }
    pub fn bad_request(code: &'static str, trace_id: Option<Uuid>) -> Self { Self::BadRequest { code, trace_id, message: None } }
    pub fn invalid(code: &'static str, message: impl Into<String>) -> Self { Self::BadRequest { code, trace_id: None, message: Some(message.into()) } }
    pub fn unauthenticated(code: &'static str, message: impl Into<String>) -> Self { Self::Unauthenticated { code, trace_id: None, message: Some(message.into()) } }
    pub fn forbidden() -> Self { Self::Forbidden { trace_id: None } }
    pub fn settlement_failed<E: std::fmt::Display>(e: E, trace_id: Option<Uuid>) -> Self { Self::SettlementFailed { trace_id, message: Some(e.to_string()) } }
    pub fn processor_unavailable<E: std::fmt::Display>(e: E) -> Self { Self::ProcessorUnavailable { trace_id: None, message: Some(e.to_string()) } }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            ApiError::ForbiddenMissingRole { .. } | ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::ProcessorUnavailable { .. } => StatusCode::BAD_GATEWAY,
            ApiError::SettlementFailed { .. } | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (body, error_code) = match self {
            ApiError::Unauthenticated { code, trace_id, message } => (
                ErrorBody { code: code.into(), missing_role: None, trace_id, message },
                code
            ),
            ApiError::ForbiddenMissingRole { role, trace_id } => (
                ErrorBody { code: "missing_role".into(), missing_role: Some(role.into()), trace_id, message: None },
                "missing_role"
            ),
            ApiError::Forbidden { trace_id } => (
                ErrorBody { code: "forbidden".into(), missing_role: None, trace_id, message: Some("forbidden access".into()) },
                "forbidden"
            ),
            ApiError::BadRequest { code, trace_id, message } => (
                ErrorBody { code: code.into(), missing_role: None, trace_id, message },
                code
            ),
            ApiError::NotFound { code, trace_id } => (
                ErrorBody { code: code.into(), missing_role: None, trace_id, message: None },
                code
            ),
            ApiError::SettlementFailed { trace_id, message } => (
                ErrorBody { code: "settlement_failed".into(), missing_role: None, trace_id, message },
                "settlement_failed"
            ),
            ApiError::ProcessorUnavailable { trace_id, message } => (
                ErrorBody { code: "processor_unavailable".into(), missing_role: None, trace_id, message },
                "processor_unavailable"
            ),
            ApiError::Internal { trace_id, message } => (
                ErrorBody { code: "internal_error".into(), missing_role: None, trace_id, message },
                "internal_error"
            ),
        };
        if status.is_server_error() {
            tracing::error!(code = error_code, status = status.as_u16(), message = ?body.message, trace_id = ?body.trace_id, "request failed");
        }
        let mut resp = (status, Json(body)).into_response();
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert(ERROR_CODE_HEADER, val);
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
