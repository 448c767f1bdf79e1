//! Mapping of application errors onto HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use shopcount_common::ShopCountError;
use tracing::{error, warn};

/// Error returned by request handlers.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Error raised by the report service, the store or request parsing.
    #[error(transparent)]
    Service(#[from] ShopCountError),

    /// Request body that could not be decoded.
    #[error("Malformed request body: {0}")]
    BadRequest(String),
}

/// Result type for request handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always `false`
    pub success: bool,
    /// Machine-readable error class
    pub code: String,
    /// Human-readable description
    pub message: String,
}

impl ApiError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Service(ShopCountError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Service(err) if !err.is_client_error() => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) | Self::Service(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Error class reported in [`ErrorBody::code`].
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Service(ShopCountError::Validation { .. }) => "validation_error",
            Self::Service(ShopCountError::InvalidRange { .. }) => "invalid_range",
            Self::Service(ShopCountError::NotFound { .. }) => "not_found",
            Self::Service(_) => "internal_error",
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            warn!(error = %self, status = status.as_u16(), "Request rejected");
            self.to_string()
        };

        let body = ErrorBody {
            success: false,
            code: self.code().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
