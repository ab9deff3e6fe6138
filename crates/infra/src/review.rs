//! Admin review queue.

use chrono::Utc;
use tracing::info;

use gpsrhub_auth::{CurrentUser, Permission, authorize, require_user};
use gpsrhub_core::{ProductId, UserId};
use gpsrhub_products::{DraftProduct, ProductSummary, ReviewAction, ReviewState, ReviewStatus};

use crate::error::WizardError;
use crate::persistence::Backend;
use crate::steps::load_draft;

/// Products waiting for, or under, review.
const PENDING: [ReviewStatus; 2] = [ReviewStatus::Submitted, ReviewStatus::InReview];

pub struct ReviewDesk<'a, B: ?Sized> {
    backend: &'a B,
}

impl<'a, B> ReviewDesk<'a, B>
where
    B: Backend + ?Sized,
{
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Oldest submission first.
    pub async fn list_pending(&self, user: Option<&CurrentUser>) -> Result<Vec<ProductSummary>, WizardError> {
        let user = require_user(user)?;
        authorize(user, &Permission::PRODUCTS_READ_ANY)?;
        Ok(self.backend.list_products_by_status(&PENDING).await?)
    }

    /// Full read-only view of any product.
    pub async fn inspect(&self, user: Option<&CurrentUser>, product_id: ProductId) -> Result<DraftProduct, WizardError> {
        let user = require_user(user)?;
        authorize(user, &Permission::PRODUCTS_READ_ANY)?;
        Ok(load_draft(self.backend, product_id).await?)
    }

    pub async fn start_review(&self, user: Option<&CurrentUser>, product_id: ProductId) -> Result<ReviewState, WizardError> {
        self.decide(user, product_id, |reviewer| ReviewAction::StartReview { reviewer })
            .await
    }

    pub async fn approve(&self, user: Option<&CurrentUser>, product_id: ProductId) -> Result<ReviewState, WizardError> {
        self.decide(user, product_id, |reviewer| ReviewAction::Approve { reviewer })
            .await
    }

    pub async fn reject(
        &self,
        user: Option<&CurrentUser>,
        product_id: ProductId,
        note: &str,
    ) -> Result<ReviewState, WizardError> {
        self.decide(user, product_id, |reviewer| ReviewAction::Reject {
            reviewer,
            note: note.to_string(),
        })
        .await
    }

    pub async fn request_changes(
        &self,
        user: Option<&CurrentUser>,
        product_id: ProductId,
        note: &str,
    ) -> Result<ReviewState, WizardError> {
        self.decide(user, product_id, |reviewer| ReviewAction::RequestChanges {
            reviewer,
            note: note.to_string(),
        })
        .await
    }

    async fn decide(
        &self,
        user: Option<&CurrentUser>,
        product_id: ProductId,
        action: impl FnOnce(UserId) -> ReviewAction,
    ) -> Result<ReviewState, WizardError> {
        let user = require_user(user)?;
        authorize(user, &Permission::PRODUCTS_REVIEW)?;

        let row = self.backend.get_product(product_id).await?;
        let next = row.review.apply(&action(user.id), Utc::now())?;
        let saved = self.backend.set_review(product_id, &next, None).await?;
        info!(
            product_id = %product_id,
            reviewer = %user.id,
            from = %row.review.status,
            to = %saved.status,
            "review status changed"
        );
        Ok(saved)
    }
}
