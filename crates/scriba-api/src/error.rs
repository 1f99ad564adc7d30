//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use scriba_worker::WorkerError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Worker(e) => match e {
                WorkerError::Validation(_) => StatusCode::BAD_REQUEST,
                WorkerError::NotFound(_) => StatusCode::NOT_FOUND,
                WorkerError::HashMismatch => StatusCode::CONFLICT,
                WorkerError::Busy(_) => StatusCode::TOO_MANY_REQUESTS,
                WorkerError::Media(_)
                | WorkerError::Inference(_)
                | WorkerError::Store(_)
                | WorkerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, ApiError::Worker(e) if e.is_retryable())
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retryable: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // 5xx details stay in the logs, not on the wire
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "internal error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorBody {
            error: message,
            retryable: self.retryable(),
        };
        (status, Json(body)).into_response()
    }
}
