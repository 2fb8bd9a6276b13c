//! Error types for Ward.

use thiserror::Error;

/// Coarse classification of a [`WardError`], used by call sites to map
/// failures onto transport-level outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input. Never retried.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// Uniqueness violation or a delete blocked by dependents.
    Conflict,
    /// System-protected entity, or an authorization denial.
    Forbidden,
    /// Cache or database failure; authorization fails closed.
    Internal,
}

impl ErrorKind {
    /// HTTP-equivalent status code for this classification.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }
}

#[derive(Debug, Error)]
pub enum WardError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Conflict on {entity}: {reason}")]
    Conflict { entity: String, reason: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Authorization check cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WardError {
    pub fn validation(message: impl Into<String>) -> Self {
        WardError::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        WardError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn conflict(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        WardError::Conflict {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        WardError::Forbidden {
            reason: reason.into(),
        }
    }

    /// Classify this error. Every I/O-flavoured variant, including
    /// cancellation, is `Internal`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WardError::Validation { .. } => ErrorKind::Validation,
            WardError::NotFound { .. } => ErrorKind::NotFound,
            WardError::Conflict { .. } => ErrorKind::Conflict,
            WardError::Forbidden { .. } => ErrorKind::Forbidden,
            WardError::Database(_)
            | WardError::Cache(_)
            | WardError::Cancelled
            | WardError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WardError::NotFound { .. })
    }
}

pub type WardResult<T> = Result<T, WardError>;
