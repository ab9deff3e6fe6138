use thiserror::Error;

use gpsrhub_core::{DomainError, UserId};

use crate::{CurrentUser, Permission};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not signed in")]
    Unauthenticated,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    #[error("forbidden: resource belongs to another user")]
    NotOwner,
}

impl From<AuthzError> for DomainError {
    fn from(_: AuthzError) -> Self {
        DomainError::Unauthorized
    }
}

/// Turn the optional session user into a hard requirement.
pub fn require_user(user: Option<&CurrentUser>) -> Result<&CurrentUser, AuthzError> {
    user.ok_or(AuthzError::Unauthenticated)
}

/// Check that the user's role grants `required`.
///
/// - No IO
/// - No panics
pub fn authorize(user: &CurrentUser, required: &Permission) -> Result<(), AuthzError> {
    if user.role.permissions().contains(required) {
        Ok(())
    } else {
        tracing::debug!(user_id = %user.id, role = %user.role, permission = %required, "permission denied");
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Check that `user` owns a resource owned by `owner_id`.
pub fn ensure_owner(user: &CurrentUser, owner_id: UserId) -> Result<(), AuthzError> {
    if user.id == owner_id {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}
