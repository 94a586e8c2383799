use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

/// Every way a gateway request can fail.
///
/// Each variant maps to exactly one response status; the body is always
/// `{"detail": ...}`.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The server has no upstream API key. Not the caller's fault.
    #[error("Server missing OPENWEATHER_API_KEY")]
    Config,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Daily request limit of {limit} reached. Try again after 00:00 UTC.")]
    QuotaExceeded { limit: u32 },

    #[error("Rate limit exceeded.")]
    RateExceeded,

    #[error("{0}")]
    Validation(String),

    /// Non-2xx answer from the provider, passed through as-is.
    #[error("Upstream returned {status}")]
    Upstream { status: StatusCode, body: Value },

    #[error("Upstream request timed out")]
    UpstreamTimeout,

    #[error("Upstream request failed: {0}")]
    UpstreamTransport(String),

    #[error("History store error: {0}")]
    History(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Config => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::QuotaExceeded { .. } | GatewayError::RateExceeded => {
                StatusCode::TOO_MANY_REQUESTS
            }
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Upstream { status, .. } => *status,
            GatewayError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::UpstreamTransport(_) => StatusCode::BAD_GATEWAY,
            GatewayError::History(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn detail(&self) -> Value {
        match self {
            GatewayError::Upstream { body, .. } => body.clone(),
            other => Value::String(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::UpstreamTimeout
        } else {
            GatewayError::UpstreamTransport(err.to_string())
        }
    }
}

impl From<sled::Error> for GatewayError {
    fn from(err: sled::Error) -> Self {
        GatewayError::History(err.to_string())
    }
}

// Malformed query strings answer in the same JSON shape as everything else
impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        GatewayError::Validation(rejection.body_text())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}
