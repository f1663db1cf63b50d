//! Error types for the HTTP layer.
//!
//! [`ApiError`] covers every response other than success and converts into
//! an Axum response with the body `{ "error": <message>, "status": <code> }`.
//! There is no 5xx path: unexpected faults are logged where they occur and
//! reported as 400.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the API layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed input, a path/resource mismatch, or a downgraded fault.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The caller is authenticated but does not own the resource.
    #[error("forbidden")]
    Forbidden,

    /// No valid credentials were presented to a protected action.
    #[error("unauthorized")]
    Unauthorized,
}

impl ApiError {
    /// Log an unexpected fault for `operation` and report it as a 400
    /// carrying `message`.
    pub fn fault(operation: &'static str, message: &str, err: &dyn std::fmt::Display) -> Self {
        tracing::error!(operation, error = %err, "{}", message);
        Self::BadRequest(message.to_owned())
    }

    /// The HTTP status of this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::NotFound(msg) | Self::BadRequest(msg) => msg,
            Self::Forbidden => String::from("Forbidden"),
            Self::Unauthorized => String::from("Unauthorized"),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
