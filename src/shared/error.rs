//! Record Validation Errors
//!
//! Field checks that `User` and `Message` run on their own input before a
//! transform stores it. They need no storage access, so clients can run the
//! same checks before sending a request.
use thiserror::Error;

/// A record field failed its local checks
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Field is blank after trimming
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Field exceeds its length limit
    #[error("{field} longer than {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Field holds characters it may not contain
    #[error("{field} {reason}")]
    Malformed { field: &'static str, reason: String },
}

impl SharedError {
    pub fn empty(field: &'static str) -> Self {
        Self::Empty { field }
    }

    pub fn too_long(field: &'static str, max: usize) -> Self {
        Self::TooLong { field, max }
    }

    pub fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field } | Self::TooLong { field, .. } | Self::Malformed { field, .. } => {
                field
            }
        }
    }
}
