/**
 * Store Error Types
 *
 * Every write path funnels through `Store::mutate`, so callers see exactly
 * two kinds of failure:
 *
 * - `ValidationFailure` - the transform rejected the request (not found,
 *   forbidden, conflict, bad input). Never retried.
 * - `PersistenceFailure` - loading or saving the data set failed. The
 *   caller may retry or surface it as a 5xx.
 *
 * `StoreError` is the raw error of a storage backend; it is wrapped in
 * `PersistenceFailure` before it reaches a mutation caller.
 */
use thiserror::Error;
use uuid::Uuid;

use crate::shared::SharedError;

/// Raw error from a durable store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Backend is temporarily unreachable
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The mutation task was torn down before it finished
    #[error("mutation interrupted: {0}")]
    Interrupted(String),
}

/// Business-rule rejection raised inside a transform
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid {field}: {message}")]
    BadInput { field: String, message: String },
}

impl ValidationFailure {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn bad_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<SharedError> for ValidationFailure {
    fn from(err: SharedError) -> Self {
        Self::BadInput {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

/// Durable load or save failed
#[derive(Debug, Error)]
#[error("persistence failure: {source}")]
pub struct PersistenceFailure {
    #[from]
    pub source: StoreError,
}

/// Error surfaced to callers of `Store::mutate`
#[derive(Debug, Error)]
pub enum MutationError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error(transparent)]
    Persistence(#[from] PersistenceFailure),
}

impl MutationError {
    /// Persistence failures may be retried by the caller; validation failures never
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    /// The validation failure, if this is one
    pub fn as_validation(&self) -> Option<&ValidationFailure> {
        match self {
            Self::Validation(failure) => Some(failure),
            Self::Persistence(_) => None,
        }
    }
}

impl From<StoreError> for MutationError {
    fn from(err: StoreError) -> Self {
        Self::Persistence(PersistenceFailure::from(err))
    }
}
