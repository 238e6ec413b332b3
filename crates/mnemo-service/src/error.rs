//! Error types for the service.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use mnemo_types::{ErrorBody, ResponseStatus};

/// Service error type.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed request payload.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The embedding model has not finished warm-up.
    #[error("embedding model is not loaded yet")]
    ModelNotReady,

    /// Vector index failure.
    #[error("Storage error: {0}")]
    Storage(#[from] mnemo_index::IndexError),

    /// Embedding failure.
    #[error("Embedding error: {0}")]
    Embed(#[from] mnemo_embed::EmbedError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<mnemo_types::ValidationError> for ServiceError {
    fn from(e: mnemo_types::ValidationError) -> Self {
        ServiceError::BadRequest(e.to_string())
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServiceError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ServiceError::ModelNotReady => (StatusCode::SERVICE_UNAVAILABLE, "model_not_ready"),
            ServiceError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            ServiceError::Embed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "embed_error"),
            ServiceError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let message = self.to_string();

        match &self {
            ServiceError::Storage(_) | ServiceError::Embed(_) | ServiceError::Internal(_) => {
                tracing::error!(status = %status, code, error = %message, "Server error");
            }
            _ => {
                tracing::warn!(status = %status, code, error = %message, "Client error");
            }
        }

        let body = ErrorBody {
            status: ResponseStatus::Error,
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
