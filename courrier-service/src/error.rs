//! Service error types

use courrier_core::{Capability, Role};
use thiserror::Error;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} already exists: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Role {role} is not allowed to {capability}")]
    Forbidden { role: Role, capability: Capability },

    #[error("Password too short (minimum {0} characters)")]
    PasswordTooShort(usize),

    #[error("Password too long (maximum 72 bytes)")]
    PasswordTooLong,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Stored snapshot is unreadable: {0}")]
    CorruptSnapshot(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error(transparent)]
    Domain(#[from] courrier_core::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// True when the in-memory state is intact and the operation may be retried
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ServiceError::Persistence(_))
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(e: rusqlite::Error) -> Self {
        ServiceError::Persistence(e.to_string())
    }
}
