/**
 * Backend Error Types
 *
 * This module defines the error type returned by HTTP handlers. It wraps
 * the two failure kinds of the write path and the handful of request-level
 * errors raised before a mutation starts.
 *
 * # Error Categories
 *
 * ## Validation
 *
 * A transform rejected the request. Each variant of `ValidationFailure`
 * has its own status:
 * - `NotFound` - 404
 * - `Forbidden` - 403
 * - `Conflict` - 409
 * - `BadInput` - 400
 *
 * ## Persistence
 *
 * Loading or saving the data set failed. The request may be retried, so it
 * is reported as 503 Service Unavailable.
 *
 * ## Handler
 *
 * Request-level problems detected in the handler itself (malformed ids,
 * missing query parameters).
 */
use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::store::{MutationError, PersistenceFailure, ValidationFailure};
use crate::shared::SharedError;

/// Backend-specific error types
///
/// ```rust
/// use axum::http::StatusCode;
/// use msgrelay::backend::error::BackendError;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "actor_id is required");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., missing query parameter)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Business-rule rejection from a transform
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// Durable load or save failed
    #[error(transparent)]
    Persistence(#[from] PersistenceFailure),

    /// Record field check failed outside a transform
    #[error(transparent)]
    SharedError(#[from] SharedError),
}

impl BackendError {
    /// Create a new handler error with a status code
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
    /// - `HandlerError` - Uses the status code from the error
    /// - `Validation` - 404 / 403 / 409 / 400 by failure kind
    /// - `Persistence` - 503 Service Unavailable
    /// - `SharedError` - 400 Bad Request
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::Validation(failure) => match failure {
                ValidationFailure::NotFound { .. } => StatusCode::NOT_FOUND,
                ValidationFailure::Forbidden(_) => StatusCode::FORBIDDEN,
                ValidationFailure::Conflict(_) => StatusCode::CONFLICT,
                ValidationFailure::BadInput { .. } => StatusCode::BAD_REQUEST,
            },
            Self::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::SharedError(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error message
    ///
    /// Persistence failures are not echoed to clients.
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::Validation(failure) => failure.to_string(),
            Self::Persistence(_) => "storage temporarily unavailable, retry later".to_string(),
            Self::SharedError(err) => err.to_string(),
        }
    }
}

impl From<MutationError> for BackendError {
    fn from(err: MutationError) -> Self {
        match err {
            MutationError::Validation(failure) => Self::Validation(failure),
            MutationError::Persistence(failure) => Self::Persistence(failure),
        }
    }
}
