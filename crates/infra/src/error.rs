//! Errors raised at the collaborator boundary and surfaced by wizard operations.

use thiserror::Error;

use gpsrhub_ai::AiError;
use gpsrhub_auth::AuthzError;
use gpsrhub_billing::BillingError;
use gpsrhub_core::DomainError;
use gpsrhub_products::ValidationError;

use crate::reconcile::ReconcileFailure;

/// A persistence or storage call that did not succeed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("{0} not found")]
    NotFound(String),

    /// The backend refused the write (constraint, policy, bad reference).
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend could not be reached or failed internally.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl CollaboratorError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

impl From<DomainError> for CollaboratorError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound => CollaboratorError::NotFound("record".to_string()),
            DomainError::Conflict(msg) => CollaboratorError::Conflict(msg),
            other => CollaboratorError::Rejected(other.to_string()),
        }
    }
}

/// Everything a wizard, address book, review or checker operation can fail with.
#[derive(Debug, Error)]
pub enum WizardError {
    /// Client-side check failed; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// Some link/unlink calls succeeded before one failed.
    #[error(transparent)]
    Reconcile(#[from] ReconcileFailure),

    #[error(transparent)]
    Checker(#[from] AiError),
}

impl WizardError {
    /// Short text for the toast shown at the step boundary.
    pub fn user_message(&self) -> String {
        match self {
            WizardError::Validation(err) => err.to_string(),
            WizardError::Domain(DomainError::NotFound) => "That record no longer exists.".to_string(),
            WizardError::Domain(err) => err
                .user_text()
                .map(str::to_string)
                .unwrap_or_else(|| "This change is not allowed.".to_string()),
            WizardError::Authz(AuthzError::Unauthenticated) => "Please sign in again.".to_string(),
            WizardError::Authz(_) => "You do not have access to this.".to_string(),
            WizardError::Billing(err) => format!("Your subscription does not allow this: {err}."),
            WizardError::Collaborator(CollaboratorError::NotFound(what)) => {
                format!("The {what} could not be found.")
            }
            WizardError::Collaborator(_) => "Saving failed. Please try again.".to_string(),
            WizardError::Reconcile(_) => {
                "Some changes were saved and some were not. Reload the product before continuing."
                    .to_string()
            }
            WizardError::Checker(err) => err.user_message().to_string(),
        }
    }
}
