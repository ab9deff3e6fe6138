//! Domain error model.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic failure of a domain rule. Decided without any IO, so retrying
/// the same call with the same input fails the same way.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// User input the rule refuses (blank field, bad country code).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The records involved are in a state the operation cannot start from.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("not found")]
    NotFound,

    /// Illegal review transition, edit of a submitted product, slot already holding a file.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The record belongs to someone else.
    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Message written for the person who triggered the error, if the variant has one.
    ///
    /// Invariant and id messages describe internal state and are not returned.
    pub fn user_text(&self) -> Option<&str> {
        match self {
            DomainError::Validation(msg) | DomainError::Conflict(msg) => Some(msg),
            _ => None,
        }
    }
}

/// An environment variable that is missing or cannot be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(&'static str, String),

    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
