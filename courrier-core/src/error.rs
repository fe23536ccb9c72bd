//! Error types for the courrier domain

use thiserror::Error;

use crate::model::CourrierState;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid priority: {0}")]
    InvalidPriority(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid sort order: {0}")]
    InvalidSortOrder(String),

    #[error("Illegal transition from {from} to {to}")]
    IllegalTransition {
        from: CourrierState,
        to: CourrierState,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid attachment: {0}")]
    InvalidAttachment(String),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}
