//! Review lifecycle of a product.
//!
//! ```text
//! Draft ──submit──▶ Submitted ──start_review──▶ InReview ──approve──▶ Approved
//!                      ▲                           │ └──reject──────▶ Rejected
//!                      └──submit── ChangesRequested ◀──request_changes┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gpsrhub_core::{DomainError, DomainResult, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    Draft,
    Submitted,
    InReview,
    Approved,
    Rejected,
    ChangesRequested,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Draft => "draft",
            ReviewStatus::Submitted => "submitted",
            ReviewStatus::InReview => "in_review",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::ChangesRequested => "changes_requested",
        }
    }

    /// The owner may still change the product.
    pub fn is_editable(&self) -> bool {
        matches!(self, ReviewStatus::Draft | ReviewStatus::ChangesRequested)
    }

    /// The product has been handed over for review (or already decided).
    pub fn is_submitted(&self) -> bool {
        !self.is_editable()
    }
}

impl core::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReviewAction {
    /// Owner hands the product over (first time or after changes were requested).
    Submit,
    StartReview { reviewer: UserId },
    Approve { reviewer: UserId },
    Reject { reviewer: UserId, note: String },
    RequestChanges { reviewer: UserId, note: String },
}

impl ReviewAction {
    fn name(&self) -> &'static str {
        match self {
            ReviewAction::Submit => "submit",
            ReviewAction::StartReview { .. } => "start review",
            ReviewAction::Approve { .. } => "approve",
            ReviewAction::Reject { .. } => "reject",
            ReviewAction::RequestChanges { .. } => "request changes",
        }
    }
}

/// Review status plus the bookkeeping shown to the owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewState {
    pub status: ReviewStatus,
    /// Reviewer's note for rejections and change requests.
    pub note: Option<String>,
    pub reviewer: Option<UserId>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl ReviewState {
    /// Decide the next state. Pure: `self` is not modified.
    pub fn apply(&self, action: &ReviewAction, now: DateTime<Utc>) -> DomainResult<ReviewState> {
        use ReviewStatus::*;

        let illegal = || {
            DomainError::conflict(format!(
                "cannot {} a product that is {}",
                action.name(),
                self.status
            ))
        };

        match action {
            ReviewAction::Submit => match self.status {
                Draft | ChangesRequested => Ok(ReviewState {
                    status: Submitted,
                    note: None,
                    reviewer: None,
                    submitted_at: Some(now),
                    decided_at: None,
                }),
                _ => Err(illegal()),
            },
            ReviewAction::StartReview { reviewer } => match self.status {
                Submitted => Ok(ReviewState {
                    status: InReview,
                    reviewer: Some(*reviewer),
                    ..self.clone()
                }),
                _ => Err(illegal()),
            },
            ReviewAction::Approve { reviewer } => match self.status {
                InReview => Ok(ReviewState {
                    status: Approved,
                    note: None,
                    reviewer: Some(*reviewer),
                    decided_at: Some(now),
                    ..self.clone()
                }),
                _ => Err(illegal()),
            },
            ReviewAction::Reject { reviewer, note } | ReviewAction::RequestChanges { reviewer, note } => {
                if self.status != InReview {
                    return Err(illegal());
                }
                let note = note.trim();
                if note.is_empty() {
                    return Err(DomainError::validation(format!(
                        "a note is required to {}",
                        action.name()
                    )));
                }
                let status = if matches!(action, ReviewAction::Reject { .. }) {
                    Rejected
                } else {
                    ChangesRequested
                };
                Ok(ReviewState {
                    status,
                    note: Some(note.to_string()),
                    reviewer: Some(*reviewer),
                    decided_at: Some(now),
                    ..self.clone()
                })
            }
        }
    }
}
