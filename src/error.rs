// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::{lifecycle::LifecycleError, store::StoreError};

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden (authenticated, but not allowed)
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., resubmission refused, concurrent update)
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Allows using `?` operator on raw database calls.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => AppError::Conflict(err.to_string()),
            StoreError::VersionConflict(_) => AppError::Conflict(
                "Submission was modified concurrently, please retry".to_string(),
            ),
            StoreError::Missing(_) => AppError::NotFound(err.to_string()),
            StoreError::Database(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

/// Maps lifecycle rejections to transport-level errors.
impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        let msg = err.to_string();
        match err {
            LifecycleError::NotPublished(_)
            | LifecycleError::EmptySubmission
            | LifecycleError::ScoreOutOfRange { .. } => AppError::BadRequest(msg),
            LifecycleError::ResubmissionNotAllowed(_)
            | LifecycleError::DuplicateSubmission { .. } => AppError::Conflict(msg),
            LifecycleError::SubmissionNotFound => AppError::NotFound(msg),
            LifecycleError::NotAuthorized(_) => AppError::Forbidden(msg),
        }
    }
}
