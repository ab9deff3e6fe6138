//! Persistence collaborators.
//!
//! One trait per table family. User-owned draft rows (products, associations,
//! answers, standards, slots) are hard-deleted; catalog and address rows are
//! soft-deleted through `deleted_at`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gpsrhub_billing::Subscription;
use gpsrhub_core::{AddressId, CatalogId, ProductId, StandardId, UserId};
use gpsrhub_parties::{Address, AddressKind};
use gpsrhub_products::{
    Association, AssociationKind, CatalogEntry, CatalogQuery, Category, Declarations, NewStandard,
    NotifiedBody, ProductDetails, ProductSummary, ProductType, ProvisioningDefaults, Question,
    QuestionAnswer, ReviewState, ReviewStatus, Standard, TechnicalFileKind, TechnicalFileSlot,
};

use crate::error::CollaboratorError;

pub type StoreResult<T> = Result<T, CollaboratorError>;

/// The `products` row: scalar fields only, children live in their own tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRow {
    pub id: ProductId,
    pub owner_id: UserId,
    pub details: ProductDetails,
    pub notified_body: Option<NotifiedBody>,
    pub declarations: Declarations,
    pub review: ReviewState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            owner_id: self.owner_id,
            name: self.details.name.clone(),
            model: self.details.model.clone(),
            status: self.review.status,
            submitted_at: self.review.submitted_at,
        }
    }
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert_product(&self, owner_id: UserId, details: &ProductDetails) -> StoreResult<ProductRow>;
    async fn update_product(&self, id: ProductId, details: &ProductDetails) -> StoreResult<ProductRow>;
    async fn get_product(&self, id: ProductId) -> StoreResult<ProductRow>;
    async fn list_products(&self, owner_id: UserId) -> StoreResult<Vec<ProductSummary>>;
    async fn list_products_by_status(&self, statuses: &[ReviewStatus]) -> StoreResult<Vec<ProductSummary>>;
    async fn count_products(&self, owner_id: UserId) -> StoreResult<usize>;
    async fn save_notified_body(&self, id: ProductId, body: &NotifiedBody) -> StoreResult<NotifiedBody>;
    async fn set_review(
        &self,
        id: ProductId,
        review: &ReviewState,
        declarations: Option<&Declarations>,
    ) -> StoreResult<ReviewState>;
}

/// Directive and regulation links.
#[async_trait]
pub trait AssociationStore: Send + Sync {
    /// Insert a link and return the row with the catalog entry's code and title.
    async fn link(
        &self,
        product_id: ProductId,
        kind: AssociationKind,
        reference_id: CatalogId,
    ) -> StoreResult<Association>;
    async fn unlink(&self, product_id: ProductId, kind: AssociationKind, reference_id: CatalogId) -> StoreResult<()>;
    async fn list_associations(&self, product_id: ProductId, kind: AssociationKind) -> StoreResult<Vec<Association>>;
}

#[async_trait]
pub trait QuestionAnswerStore: Send + Sync {
    async fn set_answer(&self, product_id: ProductId, question_id: CatalogId) -> StoreResult<QuestionAnswer>;
    async fn clear_answer(&self, product_id: ProductId, question_id: CatalogId) -> StoreResult<()>;
    async fn list_answers(&self, product_id: ProductId) -> StoreResult<Vec<QuestionAnswer>>;
}

#[async_trait]
pub trait StandardStore: Send + Sync {
    async fn add_standard(&self, product_id: ProductId, standard: &NewStandard) -> StoreResult<Standard>;
    async fn remove_standard(&self, product_id: ProductId, id: StandardId) -> StoreResult<()>;
    async fn list_standards(&self, product_id: ProductId) -> StoreResult<Vec<Standard>>;
}

#[async_trait]
pub trait TechnicalFileStore: Send + Sync {
    /// Insert or replace the row for `(slot.product_id, slot.kind)`.
    async fn upsert_slot(&self, slot: &TechnicalFileSlot) -> StoreResult<TechnicalFileSlot>;
    async fn clear_slot(&self, product_id: ProductId, kind: TechnicalFileKind) -> StoreResult<()>;
    async fn list_slots(&self, product_id: ProductId) -> StoreResult<Vec<TechnicalFileSlot>>;
}

/// Read-only reference data.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_entries(&self, kind: AssociationKind, query: &CatalogQuery) -> StoreResult<Vec<CatalogEntry>>;
    async fn list_categories(&self, query: &CatalogQuery) -> StoreResult<Vec<Category>>;
    async fn list_product_types(&self, category_id: CatalogId, query: &CatalogQuery) -> StoreResult<Vec<ProductType>>;
    async fn list_questions(&self, product_type_id: CatalogId, query: &CatalogQuery) -> StoreResult<Vec<Question>>;
    async fn provisioning_defaults(&self, product_type_id: CatalogId) -> StoreResult<ProvisioningDefaults>;
}

#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn insert_address(&self, address: &Address) -> StoreResult<Address>;
    /// Replace an existing row (edits and soft deletes).
    async fn update_address(&self, address: &Address) -> StoreResult<Address>;
    /// Any row, archived or not.
    async fn get_address(&self, id: AddressId) -> StoreResult<Address>;
    /// Active rows only, oldest first.
    async fn list_addresses(&self, owner_id: UserId, kind: Option<AddressKind>) -> StoreResult<Vec<Address>>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn subscription(&self, owner_id: UserId) -> StoreResult<Option<Subscription>>;
    async fn save_subscription(&self, subscription: &Subscription) -> StoreResult<Subscription>;
}

/// Everything the wizard talks to, as one bound.
pub trait Backend:
    ProductRepository
    + AssociationStore
    + QuestionAnswerStore
    + StandardStore
    + TechnicalFileStore
    + CatalogStore
    + AddressStore
    + SubscriptionStore
{
}

impl<T> Backend for T where
    T: ProductRepository
        + AssociationStore
        + QuestionAnswerStore
        + StandardStore
        + TechnicalFileStore
        + CatalogStore
        + AddressStore
        + SubscriptionStore
{
}
