use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::StoreError;
use mq::MqError;
use serde::Serialize;
use thiserror::Error;

/// Message shared by "absent" and "owned by someone else", so callers cannot
/// probe for other owners' files.
pub const NOT_FOUND_MESSAGE: &str = "File not found or access denied.";

/// Structured error response returned by all operations on failure.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOT_FOUND`,
    /// `PROCESSING`, `PROCESSING_FAILED`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "New name is required.")]
    pub message: String,
}

/// Why the file service could not be set up at start-up.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("File store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("Notification bus unavailable: {0}")]
    Bus(#[from] MqError),
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound,
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: NOT_FOUND_MESSAGE.into(),
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::internal())
            }
        }
    }
}

impl ErrorBody {
    pub(crate) fn internal() -> Self {
        ErrorBody {
            code: "INTERNAL_ERROR",
            message: "An unexpected error occurred.".into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<MqError> for AppError {
    fn from(err: MqError) -> Self {
        AppError::Internal(err.to_string())
    }
}
