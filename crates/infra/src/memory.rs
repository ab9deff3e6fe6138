//! In-memory backend implementing every persistence trait.
//!
//! Intended for tests/dev. Rows live in plain vectors behind one `RwLock`; link
//! and unlink calls can be made to fail per reference id to exercise partial
//! reconciles, and product row updates can be switched off.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use gpsrhub_billing::Subscription;
use gpsrhub_core::{AddressId, AssociationId, CatalogId, ProductId, StandardId, UserId};
use gpsrhub_parties::{Address, AddressKind};
use gpsrhub_products::{
    Association, AssociationKind, CatalogEntry, CatalogQuery, Category, Declarations, NewStandard,
    NotifiedBody, ProductDetails, ProductSummary, ProductType, ProvisioningDefaults, Question,
    QuestionAnswer, ReviewState, ReviewStatus, Standard, TechnicalFileKind, TechnicalFileSlot,
};

use crate::error::CollaboratorError;
use crate::persistence::{
    AddressStore, AssociationStore, CatalogStore, ProductRepository, ProductRow, QuestionAnswerStore,
    StandardStore, StoreResult, SubscriptionStore, TechnicalFileStore,
};
use crate::reconcile::LinkOp;

#[derive(Debug, Default)]
struct Tables {
    products: HashMap<ProductId, ProductRow>,
    associations: Vec<Association>,
    answers: Vec<QuestionAnswer>,
    standards: Vec<Standard>,
    slots: Vec<TechnicalFileSlot>,
    addresses: Vec<Address>,
    subscriptions: HashMap<UserId, Subscription>,
    entries: Vec<CatalogEntry>,
    categories: Vec<Category>,
    product_types: Vec<ProductType>,
    questions: Vec<Question>,
    defaults: HashMap<CatalogId, ProvisioningDefaults>,
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    tables: RwLock<Tables>,
    failing: Mutex<HashSet<LinkOp>>,
    updates_down: AtomicBool,
    link_calls: AtomicUsize,
    unlink_calls: AtomicUsize,
}

fn poisoned() -> CollaboratorError {
    CollaboratorError::unavailable("lock poisoned")
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| poisoned())
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| poisoned())
    }

    fn with_tables(&self, f: impl FnOnce(&mut Tables)) {
        if let Ok(mut tables) = self.tables.write() {
            f(&mut tables);
        }
    }

    pub fn seed_entry(&self, entry: CatalogEntry) {
        self.with_tables(|t| t.entries.push(entry));
    }

    pub fn seed_category(&self, category: Category) {
        self.with_tables(|t| t.categories.push(category));
    }

    pub fn seed_product_type(&self, product_type: ProductType) {
        self.with_tables(|t| t.product_types.push(product_type));
    }

    pub fn seed_question(&self, question: Question) {
        self.with_tables(|t| t.questions.push(question));
    }

    pub fn seed_defaults(&self, product_type_id: CatalogId, defaults: ProvisioningDefaults) {
        self.with_tables(|t| {
            t.defaults.insert(product_type_id, defaults);
        });
    }

    pub fn seed_subscription(&self, subscription: Subscription) {
        self.with_tables(|t| {
            t.subscriptions.insert(subscription.owner_id, subscription);
        });
    }

    /// Make every future call for `op` fail with `Unavailable`.
    pub fn fail_on(&self, op: LinkOp) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(op);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.clear();
        }
    }

    /// While set, `update_product` fails with `Unavailable`.
    pub fn set_product_updates_down(&self, down: bool) {
        self.updates_down.store(down, Ordering::SeqCst);
    }

    /// Link and answer-set calls received so far.
    pub fn link_calls(&self) -> usize {
        self.link_calls.load(Ordering::SeqCst)
    }

    /// Unlink and answer-clear calls received so far.
    pub fn unlink_calls(&self) -> usize {
        self.unlink_calls.load(Ordering::SeqCst)
    }

    fn check_fault(&self, op: LinkOp) -> StoreResult<()> {
        let counter = match op {
            LinkOp::Add(_) => &self.link_calls,
            LinkOp::Remove(_) => &self.unlink_calls,
        };
        counter.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing.lock().map_err(|_| poisoned())?;
        if failing.contains(&op) {
            return Err(CollaboratorError::unavailable(format!("injected failure on {op}")));
        }
        Ok(())
    }
}

impl Tables {
    fn product_mut(&mut self, id: ProductId) -> StoreResult<&mut ProductRow> {
        self.products
            .get_mut(&id)
            .ok_or_else(|| CollaboratorError::not_found(format!("product {id}")))
    }
}

#[async_trait]
impl ProductRepository for InMemoryBackend {
    async fn insert_product(&self, owner_id: UserId, details: &ProductDetails) -> StoreResult<ProductRow> {
        let now = Utc::now();
        let row = ProductRow {
            id: ProductId::new(),
            owner_id,
            details: details.clone(),
            notified_body: None,
            declarations: Declarations::default(),
            review: ReviewState::default(),
            created_at: now,
            updated_at: now,
        };
        self.write()?.products.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_product(&self, id: ProductId, details: &ProductDetails) -> StoreResult<ProductRow> {
        if self.updates_down.load(Ordering::SeqCst) {
            return Err(CollaboratorError::unavailable("product updates are down"));
        }
        let mut tables = self.write()?;
        let row = tables.product_mut(id)?;
        row.details = details.clone();
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<ProductRow> {
        self.read()?
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| CollaboratorError::not_found(format!("product {id}")))
    }

    async fn list_products(&self, owner_id: UserId) -> StoreResult<Vec<ProductSummary>> {
        let tables = self.read()?;
        let mut rows: Vec<&ProductRow> = tables
            .products
            .values()
            .filter(|row| row.owner_id == owner_id)
            .collect();
        rows.sort_by_key(|row| row.created_at);
        Ok(rows.into_iter().map(ProductRow::summary).collect())
    }

    async fn list_products_by_status(&self, statuses: &[ReviewStatus]) -> StoreResult<Vec<ProductSummary>> {
        let tables = self.read()?;
        let mut rows: Vec<&ProductRow> = tables
            .products
            .values()
            .filter(|row| statuses.contains(&row.review.status))
            .collect();
        rows.sort_by_key(|row| (row.review.submitted_at, row.created_at));
        Ok(rows.into_iter().map(ProductRow::summary).collect())
    }

    async fn count_products(&self, owner_id: UserId) -> StoreResult<usize> {
        Ok(self
            .read()?
            .products
            .values()
            .filter(|row| row.owner_id == owner_id)
            .count())
    }

    async fn save_notified_body(&self, id: ProductId, body: &NotifiedBody) -> StoreResult<NotifiedBody> {
        let mut tables = self.write()?;
        let row = tables.product_mut(id)?;
        row.notified_body = Some(body.clone());
        row.updated_at = Utc::now();
        Ok(body.clone())
    }

    async fn set_review(
        &self,
        id: ProductId,
        review: &ReviewState,
        declarations: Option<&Declarations>,
    ) -> StoreResult<ReviewState> {
        let mut tables = self.write()?;
        let row = tables.product_mut(id)?;
        row.review = review.clone();
        if let Some(declarations) = declarations {
            row.declarations = *declarations;
        }
        row.updated_at = Utc::now();
        Ok(review.clone())
    }
}

#[async_trait]
impl AssociationStore for InMemoryBackend {
    async fn link(
        &self,
        product_id: ProductId,
        kind: AssociationKind,
        reference_id: CatalogId,
    ) -> StoreResult<Association> {
        self.check_fault(LinkOp::Add(reference_id))?;
        let mut tables = self.write()?;
        if !tables.products.contains_key(&product_id) {
            return Err(CollaboratorError::not_found(format!("product {product_id}")));
        }
        if tables
            .associations
            .iter()
            .any(|a| a.product_id == product_id && a.kind == kind && a.reference_id == reference_id)
        {
            return Err(CollaboratorError::Conflict(format!(
                "{kind} {reference_id} is already linked"
            )));
        }
        let entry = tables
            .entries
            .iter()
            .find(|e| e.kind == kind && e.id == reference_id)
            .ok_or_else(|| CollaboratorError::not_found(format!("{kind} {reference_id}")))?;
        let association = Association::link(AssociationId::new(), product_id, entry, Utc::now())?;
        tables.associations.push(association.clone());
        Ok(association)
    }

    async fn unlink(&self, product_id: ProductId, kind: AssociationKind, reference_id: CatalogId) -> StoreResult<()> {
        self.check_fault(LinkOp::Remove(reference_id))?;
        self.write()?
            .associations
            .retain(|a| !(a.product_id == product_id && a.kind == kind && a.reference_id == reference_id));
        Ok(())
    }

    async fn list_associations(&self, product_id: ProductId, kind: AssociationKind) -> StoreResult<Vec<Association>> {
        Ok(self
            .read()?
            .associations
            .iter()
            .filter(|a| a.product_id == product_id && a.kind == kind)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl QuestionAnswerStore for InMemoryBackend {
    async fn set_answer(&self, product_id: ProductId, question_id: CatalogId) -> StoreResult<QuestionAnswer> {
        self.check_fault(LinkOp::Add(question_id))?;
        let mut tables = self.write()?;
        if tables
            .answers
            .iter()
            .any(|a| a.product_id == product_id && a.question_id == question_id)
        {
            return Err(CollaboratorError::Conflict(format!(
                "question {question_id} is already answered"
            )));
        }
        let answer = QuestionAnswer {
            product_id,
            question_id,
            answered_at: Utc::now(),
        };
        tables.answers.push(answer.clone());
        Ok(answer)
    }

    async fn clear_answer(&self, product_id: ProductId, question_id: CatalogId) -> StoreResult<()> {
        self.check_fault(LinkOp::Remove(question_id))?;
        self.write()?
            .answers
            .retain(|a| !(a.product_id == product_id && a.question_id == question_id));
        Ok(())
    }

    async fn list_answers(&self, product_id: ProductId) -> StoreResult<Vec<QuestionAnswer>> {
        Ok(self
            .read()?
            .answers
            .iter()
            .filter(|a| a.product_id == product_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StandardStore for InMemoryBackend {
    async fn add_standard(&self, product_id: ProductId, standard: &NewStandard) -> StoreResult<Standard> {
        let row = Standard::create(StandardId::new(), product_id, standard, Utc::now())?;
        self.write()?.standards.push(row.clone());
        Ok(row)
    }

    async fn remove_standard(&self, product_id: ProductId, id: StandardId) -> StoreResult<()> {
        let mut tables = self.write()?;
        let before = tables.standards.len();
        tables
            .standards
            .retain(|s| !(s.product_id == product_id && s.id == id));
        if tables.standards.len() == before {
            return Err(CollaboratorError::not_found(format!("standard {id}")));
        }
        Ok(())
    }

    async fn list_standards(&self, product_id: ProductId) -> StoreResult<Vec<Standard>> {
        Ok(self
            .read()?
            .standards
            .iter()
            .filter(|s| s.product_id == product_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TechnicalFileStore for InMemoryBackend {
    async fn upsert_slot(&self, slot: &TechnicalFileSlot) -> StoreResult<TechnicalFileSlot> {
        let mut tables = self.write()?;
        let position = tables
            .slots
            .iter()
            .position(|s| s.product_id == slot.product_id && s.kind == slot.kind);
        match position {
            Some(index) => tables.slots[index] = slot.clone(),
            None => tables.slots.push(slot.clone()),
        }
        Ok(slot.clone())
    }

    async fn clear_slot(&self, product_id: ProductId, kind: TechnicalFileKind) -> StoreResult<()> {
        self.write()?
            .slots
            .retain(|s| !(s.product_id == product_id && s.kind == kind));
        Ok(())
    }

    async fn list_slots(&self, product_id: ProductId) -> StoreResult<Vec<TechnicalFileSlot>> {
        let mut slots: Vec<TechnicalFileSlot> = self
            .read()?
            .slots
            .iter()
            .filter(|s| s.product_id == product_id)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.kind);
        Ok(slots)
    }
}

#[async_trait]
impl CatalogStore for InMemoryBackend {
    async fn list_entries(&self, kind: AssociationKind, query: &CatalogQuery) -> StoreResult<Vec<CatalogEntry>> {
        let tables = self.read()?;
        Ok(query.apply(tables.entries.iter().filter(|e| e.kind == kind).cloned()))
    }

    async fn list_categories(&self, query: &CatalogQuery) -> StoreResult<Vec<Category>> {
        Ok(self
            .read()?
            .categories
            .iter()
            .filter(|c| query.admits(c.id, c.deleted_at))
            .cloned()
            .collect())
    }

    async fn list_product_types(&self, category_id: CatalogId, query: &CatalogQuery) -> StoreResult<Vec<ProductType>> {
        Ok(self
            .read()?
            .product_types
            .iter()
            .filter(|t| t.category_id == category_id && query.admits(t.id, t.deleted_at))
            .cloned()
            .collect())
    }

    async fn list_questions(&self, product_type_id: CatalogId, query: &CatalogQuery) -> StoreResult<Vec<Question>> {
        Ok(self
            .read()?
            .questions
            .iter()
            .filter(|q| q.product_type_id == product_type_id && query.admits(q.id, q.deleted_at))
            .cloned()
            .collect())
    }

    async fn provisioning_defaults(&self, product_type_id: CatalogId) -> StoreResult<ProvisioningDefaults> {
        Ok(self
            .read()?
            .defaults
            .get(&product_type_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl AddressStore for InMemoryBackend {
    async fn insert_address(&self, address: &Address) -> StoreResult<Address> {
        let mut tables = self.write()?;
        if tables.addresses.iter().any(|a| a.id == address.id) {
            return Err(CollaboratorError::Conflict(format!("address {} exists", address.id)));
        }
        tables.addresses.push(address.clone());
        Ok(address.clone())
    }

    async fn update_address(&self, address: &Address) -> StoreResult<Address> {
        let mut tables = self.write()?;
        let existing = tables
            .addresses
            .iter_mut()
            .find(|a| a.id == address.id)
            .ok_or_else(|| CollaboratorError::not_found(format!("address {}", address.id)))?;
        *existing = address.clone();
        Ok(address.clone())
    }

    async fn get_address(&self, id: AddressId) -> StoreResult<Address> {
        self.read()?
            .addresses
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| CollaboratorError::not_found(format!("address {id}")))
    }

    async fn list_addresses(&self, owner_id: UserId, kind: Option<AddressKind>) -> StoreResult<Vec<Address>> {
        Ok(self
            .read()?
            .addresses
            .iter()
            .filter(|a| a.owner_id == owner_id && a.deleted_at.is_none())
            .filter(|a| kind.is_none_or(|k| a.kind == k))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SubscriptionStore for InMemoryBackend {
    async fn subscription(&self, owner_id: UserId) -> StoreResult<Option<Subscription>> {
        Ok(self.read()?.subscriptions.get(&owner_id).cloned())
    }

    async fn save_subscription(&self, subscription: &Subscription) -> StoreResult<Subscription> {
        self.write()?
            .subscriptions
            .insert(subscription.owner_id, subscription.clone());
        Ok(subscription.clone())
    }
}
