//! Error types for Cliptube
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the application. It implements `IntoResponse` to
/// automatically convert errors to the uniform error envelope.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing entity identifier (400)
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Validation error (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Field-level validation errors (400)
    #[error("Validation failed")]
    ValidationFields(Vec<String>),

    /// Resource not found or not visible (404)
    #[error("Resource not found")]
    NotFound,

    /// Uniqueness violation (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Authentication required or bad credential (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Access denied (403)
    #[error("Access denied")]
    Forbidden,

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Media storage error (500)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidIdentifier(_)
            | AppError::Validation(_)
            | AppError::ValidationFields(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Database(_)
            | AppError::Storage(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Every failure surfaces as the uniform error envelope:
    /// `{status_code, message, errors, data: null, success: false}`.
    fn into_response(self) -> Response {
        use axum::Json;

        let status = self.status_code();

        // Internal causes are logged, not leaked to clients.
        let (message, errors): (String, Vec<String>) = match &self {
            AppError::ValidationFields(fields) => ("Validation failed".to_string(), fields.clone()),
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                ("Database error".to_string(), Vec::new())
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                ("Internal server error".to_string(), Vec::new())
            }
            other => (other.to_string(), Vec::new()),
        };

        let body = Json(serde_json::json!({
            "status_code": status.as_u16(),
            "message": message,
            "errors": errors,
            "data": null,
            "success": false,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
