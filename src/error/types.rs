/**
 * Server Error Types
 *
 * This module defines the error type returned by HTTP handlers that need
 * richer failure reporting than a bare status code.
 *
 * # Error Categories
 *
 * - `HandlerError` - request-level failures (validation, missing input) with
 *   an explicit status code
 * - `DatabaseError` - failures from the PostgreSQL layer
 * - `DispatchError` - failures from the client-update dispatcher
 * - `StorageError` - failures writing uploaded files to disk
 * - `SerializationError` - JSON serialization failures
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::dispatch::DispatchError;

/// Errors returned by HTTP handlers.
///
/// Each variant maps to an HTTP status code and a JSON error body via the
/// `IntoResponse` implementation in `conversion`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request-level failure with an explicit status code
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Database failure
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Client-update dispatch failure
    #[error("Dispatch error: {0}")]
    DispatchError(#[from] DispatchError),

    /// File storage failure
    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),

    /// JSON serialization failure
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ApiError {
    /// Create a new handler error with a status code
    ///
    /// # Arguments
    ///
    /// * `status` - HTTP status code
    /// * `message` - Error message
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `HandlerError` - uses the status code from the error
    /// - `DatabaseError` - 500 Internal Server Error
    /// - `DispatchError` - 404 Not Found for an unresolved recipient,
    ///   502 Bad Gateway otherwise
    /// - `StorageError` - 500 Internal Server Error
    /// - `SerializationError` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::DispatchError(err) => match err {
                DispatchError::RecipientUnresolved(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::DatabaseError(err) => err.to_string(),
            Self::DispatchError(err) => err.to_string(),
            Self::StorageError(err) => err.to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_handler_error() {
        let error = ApiError::handler(StatusCode::BAD_REQUEST, "Invalid request");
        match error {
            ApiError::HandlerError { status, message } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(message, "Invalid request");
            }
            _ => panic!("Expected HandlerError"),
        }
    }

    #[test]
    fn test_status_code_mapping() {
        let handler_error = ApiError::handler(StatusCode::UNAUTHORIZED, "Unauthorized");
        assert_eq!(handler_error.status_code(), StatusCode::UNAUTHORIZED);

        let database_error = ApiError::DatabaseError(sqlx::Error::RowNotFound);
        assert_eq!(database_error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let unresolved =
            ApiError::DispatchError(DispatchError::RecipientUnresolved(Uuid::new_v4()));
        assert_eq!(unresolved.status_code(), StatusCode::NOT_FOUND);
    }
}
