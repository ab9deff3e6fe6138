//! Wizard session: one signed-in user editing one product.
//!
//! ```text
//! operation(form)
//!   ↓
//! 1. handler reads &DraftProduct, validates, calls collaborators in sequence
//!   ↓
//! 2. handler returns a DraftPatch
//!   ↓
//! 3. Wizard merges the patch and advances when the patch finishes the current step
//! ```
//!
//! Operations take `&mut self`, so a second submit cannot start while one is in
//! flight. When a reconcile stops part-way or a collaborator call fails, the
//! session re-reads the product from persistence before returning the failure,
//! so the draft matches what was actually written.

use tracing::warn;

use gpsrhub_auth::{CurrentUser, Permission, authorize, ensure_owner, require_user};
use gpsrhub_core::{FileUpload, ProductId, StandardId};
use gpsrhub_products::{
    Declarations, DraftPatch, DraftProduct, GeneralDetails, NewStandard, NotifiedBody,
    TechnicalFileKind, Wizard, WizardStep,
};

use crate::error::WizardError;
use crate::persistence::Backend;
use crate::steps::{self, ComplianceSelection, load_draft};
use crate::storage::ObjectStorage;

pub struct WizardSession<'a, B: ?Sized, S: ?Sized> {
    backend: &'a B,
    storage: &'a S,
    user: CurrentUser,
    wizard: Wizard,
}

impl<'a, B, S> WizardSession<'a, B, S>
where
    B: Backend + ?Sized,
    S: ObjectStorage + ?Sized,
{
    /// Open the wizard on a new, empty product.
    pub fn start(backend: &'a B, storage: &'a S, user: Option<&CurrentUser>) -> Result<Self, WizardError> {
        let user = require_user(user)?;
        authorize(user, &Permission::PRODUCTS_WRITE)?;
        Ok(Self {
            backend,
            storage,
            wizard: Wizard::start(user.id),
            user: user.clone(),
        })
    }

    /// Open the wizard on an existing product at its furthest completed step.
    pub async fn resume(
        backend: &'a B,
        storage: &'a S,
        user: Option<&CurrentUser>,
        product_id: ProductId,
    ) -> Result<Self, WizardError> {
        let user = require_user(user)?;
        authorize(user, &Permission::PRODUCTS_WRITE)?;
        let draft = load_draft(backend, product_id).await?;
        ensure_owner(user, draft.owner_id)?;
        Ok(Self {
            backend,
            storage,
            wizard: Wizard::resume(draft),
            user: user.clone(),
        })
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn draft(&self) -> &DraftProduct {
        self.wizard.draft()
    }

    pub fn step(&self) -> WizardStep {
        self.wizard.step()
    }

    /// Previous step; form state of the current step is discarded.
    pub fn back(&mut self) -> WizardStep {
        self.wizard.back()
    }

    /// Replace the draft with what persistence holds. No-op before the first save.
    pub async fn reload(&mut self) -> Result<(), WizardError> {
        let Some(product_id) = self.wizard.draft().id else {
            return Ok(());
        };
        self.reload_from(product_id).await
    }

    /// Pick up a reviewer's decision without re-reading the whole product.
    pub async fn refresh_review(&mut self) -> Result<WizardStep, WizardError> {
        let product_id = self.wizard.draft().persisted_id()?;
        let row = self.backend.get_product(product_id).await?;
        Ok(self.wizard.apply(DraftPatch::Review(row.review))?)
    }

    async fn reload_from(&mut self, product_id: ProductId) -> Result<(), WizardError> {
        let fresh = load_draft(self.backend, product_id).await?;
        self.wizard.reload(fresh)?;
        Ok(())
    }

    /// Merge a handler's outcome into the wizard.
    ///
    /// A reconcile report or a collaborator failure may follow earlier writes, so
    /// the draft is re-read from persistence before the error is returned.
    async fn settle(&mut self, outcome: Result<DraftPatch, WizardError>) -> Result<WizardStep, WizardError> {
        let error = match outcome {
            Ok(patch) => return Ok(self.wizard.apply(patch)?),
            Err(error) => error,
        };
        let product_id = match &error {
            WizardError::Reconcile(failure) => Some(failure.product_id),
            WizardError::Collaborator(_) => self.wizard.draft().id,
            _ => None,
        };
        if let Some(product_id) = product_id {
            if let Err(reload_error) = self.reload_from(product_id).await {
                warn!(
                    product_id = %product_id,
                    error = %reload_error,
                    "could not reload product after a failed save"
                );
            }
        }
        Err(error)
    }

    pub async fn save_general(&mut self, form: &GeneralDetails) -> Result<WizardStep, WizardError> {
        let outcome = steps::save_general(self.backend, self.storage, self.wizard.draft(), form).await;
        self.settle(outcome).await
    }

    pub async fn save_compliance(&mut self, selection: &ComplianceSelection) -> Result<WizardStep, WizardError> {
        let outcome = steps::save_compliance(self.backend, self.wizard.draft(), selection).await;
        self.settle(outcome).await
    }

    pub async fn add_standard(&mut self, input: &NewStandard) -> Result<WizardStep, WizardError> {
        let outcome = steps::add_standard(self.backend, self.wizard.draft(), input).await;
        self.settle(outcome).await
    }

    pub async fn remove_standard(&mut self, standard_id: StandardId) -> Result<WizardStep, WizardError> {
        let outcome = steps::remove_standard(self.backend, self.wizard.draft(), standard_id).await;
        self.settle(outcome).await
    }

    pub async fn upload_technical_file(
        &mut self,
        kind: TechnicalFileKind,
        file: &FileUpload,
    ) -> Result<WizardStep, WizardError> {
        let outcome =
            steps::upload_technical_file(self.backend, self.storage, self.wizard.draft(), kind, file).await;
        self.settle(outcome).await
    }

    pub async fn remove_technical_file(&mut self, kind: TechnicalFileKind) -> Result<WizardStep, WizardError> {
        let outcome = steps::remove_technical_file(self.backend, self.storage, self.wizard.draft(), kind).await;
        self.settle(outcome).await
    }

    pub async fn mark_not_required(&mut self, kind: TechnicalFileKind, reason: &str) -> Result<WizardStep, WizardError> {
        let outcome = steps::mark_not_required(self.backend, self.wizard.draft(), kind, reason).await;
        self.settle(outcome).await
    }

    pub async fn clear_not_required(&mut self, kind: TechnicalFileKind) -> Result<WizardStep, WizardError> {
        let outcome = steps::clear_not_required(self.backend, self.wizard.draft(), kind).await;
        self.settle(outcome).await
    }

    pub async fn save_notified_body(&mut self, body: &NotifiedBody) -> Result<WizardStep, WizardError> {
        let outcome = steps::save_notified_body(self.backend, self.wizard.draft(), body).await;
        self.settle(outcome).await
    }

    pub async fn submit_for_review(&mut self, declarations: &Declarations) -> Result<WizardStep, WizardError> {
        self.wizard.ensure_can_submit()?;
        let outcome = steps::submit_for_review(self.backend, self.wizard.draft(), declarations).await;
        self.settle(outcome).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use gpsrhub_auth::AuthzError;
    use gpsrhub_billing::{BillingError, Plan, Subscription};
    use gpsrhub_core::{AddressId, CatalogId, DomainError, UserId};
    use gpsrhub_parties::{Address, AddressInput, AddressKind};
    use gpsrhub_products::{
        AssociationKind, CatalogEntry, Linked, ProvisioningDefaults, Question, ReviewStatus,
        ValidationError,
    };

    use crate::config::StorageConfig;
    use crate::error::CollaboratorError;
    use crate::memory::InMemoryBackend;
    use crate::persistence::{AddressStore, AssociationStore, ProductRepository};
    use crate::reconcile::LinkOp;
    use crate::review::ReviewDesk;
    use crate::storage::InMemoryObjectStorage;

    const PRODUCT_TYPE: CatalogId = CatalogId::new(2);

    struct Fixture {
        backend: InMemoryBackend,
        storage: InMemoryObjectStorage,
        user: CurrentUser,
        manufacturer: AddressId,
        eu_rep: AddressId,
        uk_rep: AddressId,
    }

    fn entry(id: i64, kind: AssociationKind) -> CatalogEntry {
        CatalogEntry {
            id: CatalogId::new(id),
            kind,
            code: format!("{kind}-{id}"),
            title: format!("{kind} {id}"),
            description: None,
            deleted_at: None,
        }
    }

    async fn address(backend: &InMemoryBackend, owner: UserId, kind: AddressKind, country: &str) -> AddressId {
        let input = AddressInput {
            name: "Acme Toys".to_string(),
            street: "1 Main St".to_string(),
            city: "Town".to_string(),
            postcode: "12345".to_string(),
            country: country.to_string(),
            ..AddressInput::default()
        };
        let row = Address::register(AddressId::new(), owner, kind, &input, Utc::now()).unwrap();
        backend.insert_address(&row).await.unwrap().id
    }

    async fn fixture(plan: Plan) -> Fixture {
        let backend = InMemoryBackend::new();
        for id in [10, 20, 30] {
            backend.seed_entry(entry(id, AssociationKind::Directive));
        }
        backend.seed_entry(entry(40, AssociationKind::Regulation));
        for id in [5, 6] {
            backend.seed_question(Question {
                id: CatalogId::new(id),
                product_type_id: PRODUCT_TYPE,
                text: format!("Question {id}?"),
                deleted_at: None,
            });
        }
        backend.seed_defaults(
            PRODUCT_TYPE,
            ProvisioningDefaults {
                directive_ids: vec![CatalogId::new(10)],
                regulation_ids: vec![CatalogId::new(40)],
                standards: vec![NewStandard {
                    reference_number: "EN 71-1".to_string(),
                    edition: "2014+A1:2018".to_string(),
                    title: "Mechanical and physical properties".to_string(),
                }],
            },
        );

        let user = CurrentUser::member(UserId::new(), "maker@example.com");
        let subscription = Subscription::trial(user.id, Utc::now())
            .change_plan(plan, 0, Utc::now())
            .unwrap();
        backend.seed_subscription(subscription);

        let manufacturer = address(&backend, user.id, AddressKind::Manufacturer, "US").await;
        let eu_rep = address(&backend, user.id, AddressKind::EuRepresentative, "DE").await;
        let uk_rep = address(&backend, user.id, AddressKind::UkRepresentative, "GB").await;

        let storage = InMemoryObjectStorage::new(&StorageConfig {
            public_base_url: "https://abc.supabase.co".parse().unwrap(),
            bucket: "product-files".to_string(),
        });

        Fixture {
            backend,
            storage,
            user,
            manufacturer,
            eu_rep,
            uk_rep,
        }
    }

    impl Fixture {
        fn general_form(&self) -> GeneralDetails {
            GeneralDetails {
                name: " Wooden train ".to_string(),
                batch_number: "LOT-9".to_string(),
                model: "WT-1".to_string(),
                specification: None,
                category_id: Some(CatalogId::new(1)),
                product_type_id: Some(PRODUCT_TYPE),
                requires_marking: true,
                manufacturer_id: Some(self.manufacturer),
                eu_representative_id: Some(self.eu_rep),
                uk_representative_id: None,
                kept_images: vec![],
                new_images: vec![FileUpload::new("train.png", "image/png", vec![1, 2, 3])],
                selected_question_ids: vec![CatalogId::new(5)],
            }
        }

        fn selection(&self, directives: &[i64]) -> ComplianceSelection {
            ComplianceSelection {
                directive_ids: directives.iter().copied().map(CatalogId::new).collect(),
                regulation_ids: vec![CatalogId::new(40)],
                eu_representative_id: Some(self.eu_rep),
                uk_representative_id: Some(self.uk_rep),
            }
        }

        fn session(&self) -> WizardSession<'_, InMemoryBackend, InMemoryObjectStorage> {
            WizardSession::start(&self.backend, &self.storage, Some(&self.user)).unwrap()
        }
    }

    fn directive_refs(draft: &DraftProduct) -> Vec<i64> {
        draft.directives.iter().map(|d| d.reference_id().get()).collect()
    }

    #[tokio::test]
    async fn start_requires_a_member() {
        let f = fixture(Plan::Starter).await;
        let err = WizardSession::start(&f.backend, &f.storage, None).err().unwrap();
        assert!(matches!(err, WizardError::Authz(AuthzError::Unauthenticated)));

        let admin = CurrentUser::admin(UserId::new(), "reviewer@example.com");
        let err = WizardSession::start(&f.backend, &f.storage, Some(&admin)).err().unwrap();
        assert!(matches!(err, WizardError::Authz(AuthzError::Forbidden(_))));
    }

    #[tokio::test]
    async fn first_save_creates_product_and_provisions_defaults() {
        let f = fixture(Plan::Starter).await;
        let mut session = f.session();

        let step = session.save_general(&f.general_form()).await.unwrap();
        assert_eq!(step, WizardStep::Compliance);

        let draft = session.draft();
        assert!(draft.id.is_some());
        assert_eq!(draft.details.name, "Wooden train");
        assert_eq!(draft.details.images.len(), 1);
        assert!(f.storage.contains_url(&draft.details.images[0]));
        assert_eq!(draft.question_answers.len(), 1);
        assert_eq!(directive_refs(draft), vec![10]);
        assert_eq!(draft.regulations.len(), 1);
        assert_eq!(draft.standards[0].reference_number, "EN 71-1");
    }

    #[tokio::test]
    async fn compliance_swap_issues_one_add_and_one_remove() {
        let f = fixture(Plan::Starter).await;
        let mut session = f.session();
        session.save_general(&f.general_form()).await.unwrap();
        session.save_compliance(&f.selection(&[10, 20])).await.unwrap();
        assert_eq!(session.step(), WizardStep::TechnicalFiles);

        session.back();
        let links = f.backend.link_calls();
        let unlinks = f.backend.unlink_calls();
        session.save_compliance(&f.selection(&[10, 30])).await.unwrap();

        assert_eq!(f.backend.link_calls() - links, 1);
        assert_eq!(f.backend.unlink_calls() - unlinks, 1);
        assert_eq!(directive_refs(session.draft()), vec![10, 30]);
        assert_eq!(session.draft().details.uk_representative_id, Some(f.uk_rep));
    }

    #[tokio::test]
    async fn resaving_the_same_selection_makes_no_link_calls() {
        let f = fixture(Plan::Starter).await;
        let mut session = f.session();
        session.save_general(&f.general_form()).await.unwrap();
        session.save_compliance(&f.selection(&[10, 20])).await.unwrap();

        session.back();
        let links = f.backend.link_calls();
        let unlinks = f.backend.unlink_calls();
        session.save_compliance(&f.selection(&[20, 10])).await.unwrap();
        assert_eq!(f.backend.link_calls(), links);
        assert_eq!(f.backend.unlink_calls(), unlinks);
    }

    #[tokio::test]
    async fn partial_failure_reloads_what_was_written() {
        let f = fixture(Plan::Starter).await;
        let mut session = f.session();
        session.save_general(&f.general_form()).await.unwrap();
        session.save_compliance(&f.selection(&[10, 20])).await.unwrap();
        session.back();

        f.backend.fail_on(LinkOp::Remove(CatalogId::new(20)));
        let err = session.save_compliance(&f.selection(&[10, 30])).await.unwrap_err();
        let WizardError::Reconcile(failure) = &err else {
            panic!("expected a reconcile failure, got {err:?}");
        };
        assert_eq!(failure.added, vec![CatalogId::new(30)]);
        assert_eq!(failure.failed, LinkOp::Remove(CatalogId::new(20)));
        assert!(failure.refetch_required());
        assert!(err.user_message().contains("Reload"));

        // The add went through; the draft now shows all three links.
        let mut refs = directive_refs(session.draft());
        refs.sort();
        assert_eq!(refs, vec![10, 20, 30]);
        assert_eq!(session.step(), WizardStep::Compliance);

        f.backend.clear_failures();
        session.save_compliance(&f.selection(&[10, 30])).await.unwrap();
        let product_id = session.draft().id.unwrap();
        let persisted = f
            .backend
            .list_associations(product_id, AssociationKind::Directive)
            .await
            .unwrap();
        assert_eq!(persisted.len(), 2);
    }

    #[tokio::test]
    async fn failed_answer_reconcile_on_first_save_adopts_the_new_row() {
        let f = fixture(Plan::Starter).await;
        let mut session = f.session();
        f.backend.fail_on(LinkOp::Add(CatalogId::new(5)));

        let err = session.save_general(&f.general_form()).await.unwrap_err();
        assert!(matches!(err, WizardError::Reconcile(_)));
        assert!(session.draft().id.is_some());
        assert_eq!(session.step(), WizardStep::General);

        f.backend.clear_failures();
        session.save_general(&f.general_form()).await.unwrap();
        assert_eq!(f.backend.count_products(f.user.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn retried_first_save_still_provisions_defaults() {
        let f = fixture(Plan::Starter).await;
        let mut session = f.session();
        f.backend.fail_on(LinkOp::Add(CatalogId::new(5)));
        session.save_general(&f.general_form()).await.unwrap_err();
        assert!(!session.draft().has_compliance_references());

        f.backend.clear_failures();
        session.save_general(&f.general_form()).await.unwrap();

        let draft = session.draft();
        assert_eq!(directive_refs(draft), vec![10]);
        assert_eq!(draft.regulations.len(), 1);
        assert_eq!(draft.standards.len(), 1);
        let persisted = f
            .backend
            .list_associations(draft.id.unwrap(), AssociationKind::Directive)
            .await
            .unwrap();
        assert_eq!(persisted.len(), 1);
    }

    #[tokio::test]
    async fn failed_representative_update_leaves_links_untouched() {
        let f = fixture(Plan::Starter).await;
        let mut session = f.session();
        session.save_general(&f.general_form()).await.unwrap();
        let product_id = session.draft().id.unwrap();

        f.backend.set_product_updates_down(true);
        let err = session.save_compliance(&f.selection(&[10, 20])).await.unwrap_err();
        assert!(matches!(err, WizardError::Collaborator(_)));

        let persisted = f
            .backend
            .list_associations(product_id, AssociationKind::Directive)
            .await
            .unwrap();
        let persisted: Vec<i64> = persisted.iter().map(|d| d.reference_id().get()).collect();
        assert_eq!(directive_refs(session.draft()), persisted);
        assert_eq!(session.step(), WizardStep::Compliance);

        f.backend.set_product_updates_down(false);
        let step = session.save_compliance(&f.selection(&[10, 20])).await.unwrap();
        assert_eq!(step, WizardStep::TechnicalFiles);
        assert_eq!(directive_refs(session.draft()), vec![10, 20]);
        assert_eq!(session.draft().details.uk_representative_id, Some(f.uk_rep));
    }

    #[tokio::test]
    async fn kept_images_must_come_from_the_draft() {
        let f = fixture(Plan::Starter).await;
        let mut session = f.session();
        let mut form = f.general_form();
        form.new_images.clear();
        form.kept_images = vec!["https://elsewhere.example/cat.png".to_string()];

        let err = session.save_general(&form).await.unwrap_err();
        assert!(matches!(err, WizardError::Validation(ValidationError::UnknownImage(_))));
        assert_eq!(f.backend.count_products(f.user.id).await.unwrap(), 0);

        session.save_general(&f.general_form()).await.unwrap();
        session.back();
        let mut form = f.general_form();
        form.new_images.clear();
        form.kept_images = session.draft().details.images.clone();
        session.save_general(&form).await.unwrap();
        assert_eq!(f.storage.object_count(), 1);
    }

    #[tokio::test]
    async fn submit_is_refused_before_the_technical_files_step() {
        let f = fixture(Plan::Starter).await;
        let mut session = f.session();
        session.save_general(&f.general_form()).await.unwrap();
        let product_id = session.draft().id.unwrap();

        let err = session
            .submit_for_review(&Declarations::all_checked())
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::Domain(DomainError::Conflict(_))));
        assert_eq!(session.step(), WizardStep::Compliance);
        let row = f.backend.get_product(product_id).await.unwrap();
        assert_eq!(row.review.status, ReviewStatus::Draft);
    }

    #[tokio::test]
    async fn plan_limit_blocks_a_second_product() {
        let f = fixture(Plan::Free).await;
        f.session().save_general(&f.general_form()).await.unwrap();

        let mut second = f.session();
        let err = second.save_general(&f.general_form()).await.unwrap_err();
        assert!(matches!(
            err,
            WizardError::Billing(BillingError::LimitReached { plan: Plan::Free, limit: 1 })
        ));
        assert_eq!(f.backend.count_products(f.user.id).await.unwrap(), 1);
        assert_eq!(f.storage.object_count(), 1);
    }

    #[tokio::test]
    async fn validation_failures_make_no_calls() {
        let f = fixture(Plan::Starter).await;
        let mut session = f.session();
        let mut form = f.general_form();
        form.eu_representative_id = None;

        let err = session.save_general(&form).await.unwrap_err();
        assert!(matches!(err, WizardError::Validation(ValidationError::NoRepresentative)));
        assert_eq!(f.storage.object_count(), 0);
        assert_eq!(f.backend.count_products(f.user.id).await.unwrap(), 0);

        let mut form = f.general_form();
        form.selected_question_ids = vec![CatalogId::new(99)];
        let err = session.save_general(&form).await.unwrap_err();
        assert!(matches!(
            err,
            WizardError::Validation(ValidationError::UnknownQuestion(id)) if id == CatalogId::new(99)
        ));
    }

    #[tokio::test]
    async fn representative_must_be_in_the_right_role() {
        let f = fixture(Plan::Starter).await;
        let mut session = f.session();
        let mut form = f.general_form();
        form.eu_representative_id = Some(f.uk_rep);

        let err = session.save_general(&form).await.unwrap_err();
        assert!(matches!(err, WizardError::Domain(_)));
    }

    #[tokio::test]
    async fn dropped_images_are_deleted_from_storage() {
        let f = fixture(Plan::Starter).await;
        let mut session = f.session();
        session.save_general(&f.general_form()).await.unwrap();
        let old_url = session.draft().details.images[0].clone();

        session.back();
        let mut form = f.general_form();
        form.new_images = vec![FileUpload::new("side.jpg", "image/jpeg", vec![9])];
        session.save_general(&form).await.unwrap();

        assert!(!f.storage.contains_url(&old_url));
        assert_eq!(f.storage.object_count(), 1);
        assert_eq!(session.draft().details.images.len(), 1);
        assert_ne!(session.draft().details.images[0], old_url);
    }

    #[tokio::test]
    async fn full_flow_submits_for_review() {
        let f = fixture(Plan::Starter).await;
        let mut session = f.session();
        session.save_general(&f.general_form()).await.unwrap();
        session.save_compliance(&f.selection(&[10])).await.unwrap();

        let uploaded = [TechnicalFileKind::DeclarationOfConformity, TechnicalFileKind::RiskAssessment];
        for kind in TechnicalFileKind::ALL {
            if uploaded.contains(&kind) {
                let file = FileUpload::new(format!("{}.pdf", kind.key()), "application/pdf", vec![1]);
                session.upload_technical_file(kind, &file).await.unwrap();
            } else {
                session.mark_not_required(kind, "not applicable to toys").await.unwrap();
            }
        }

        let err = session
            .mark_not_required(TechnicalFileKind::RiskAssessment, "skip")
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::Domain(_)));

        let step = session.submit_for_review(&Declarations::all_checked()).await.unwrap();
        assert_eq!(step, WizardStep::Summary);
        assert_eq!(session.draft().status(), ReviewStatus::Submitted);

        let err = session
            .add_standard(&NewStandard {
                reference_number: "EN 71-2".to_string(),
                edition: String::new(),
                title: "Flammability".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::Domain(_)));
    }

    #[tokio::test]
    async fn requested_changes_reopen_the_product_for_resubmission() {
        let f = fixture(Plan::Starter).await;
        let mut session = f.session();
        session.save_general(&f.general_form()).await.unwrap();
        session.save_compliance(&f.selection(&[10])).await.unwrap();
        for kind in TechnicalFileKind::ALL {
            session.mark_not_required(kind, "covered elsewhere").await.unwrap();
        }
        session.submit_for_review(&Declarations::all_checked()).await.unwrap();
        let product_id = session.draft().id.unwrap();

        let reviewer = CurrentUser::admin(UserId::new(), "reviewer@example.com");
        let desk = ReviewDesk::new(&f.backend);
        desk.start_review(Some(&reviewer), product_id).await.unwrap();
        desk.request_changes(Some(&reviewer), product_id, "Upload the test reports")
            .await
            .unwrap();

        assert_eq!(session.refresh_review().await.unwrap(), WizardStep::Summary);
        assert_eq!(session.draft().status(), ReviewStatus::ChangesRequested);
        assert_eq!(session.back(), WizardStep::TechnicalFiles);

        session
            .clear_not_required(TechnicalFileKind::TestReports)
            .await
            .unwrap();
        let file = FileUpload::new("reports.pdf", "application/pdf", vec![7]);
        session
            .upload_technical_file(TechnicalFileKind::TestReports, &file)
            .await
            .unwrap();
        let step = session.submit_for_review(&Declarations::all_checked()).await.unwrap();
        assert_eq!(step, WizardStep::Summary);
        assert_eq!(session.draft().status(), ReviewStatus::Submitted);
    }

    #[tokio::test]
    async fn removing_a_file_reopens_the_slot() {
        let f = fixture(Plan::Starter).await;
        let mut session = f.session();
        session.save_general(&f.general_form()).await.unwrap();
        session.save_compliance(&f.selection(&[10])).await.unwrap();
        for kind in TechnicalFileKind::ALL {
            let file = FileUpload::new("doc.pdf", "application/pdf", vec![1]);
            session.upload_technical_file(kind, &file).await.unwrap();
        }

        // Replacing a file deletes the old object.
        let before = f.storage.object_count();
        let file = FileUpload::new("v2.pdf", "application/pdf", vec![2]);
        session
            .upload_technical_file(TechnicalFileKind::UserManual, &file)
            .await
            .unwrap();
        assert_eq!(f.storage.object_count(), before);

        session
            .remove_technical_file(TechnicalFileKind::TestReports)
            .await
            .unwrap();
        let err = session
            .submit_for_review(&Declarations::all_checked())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WizardError::Validation(ValidationError::MissingTechnicalFiles(ref kinds))
                if kinds == &vec![TechnicalFileKind::TestReports]
        ));
        assert_eq!(session.step(), WizardStep::TechnicalFiles);
    }

    #[tokio::test]
    async fn resume_checks_ownership_and_restores_the_step() {
        let f = fixture(Plan::Starter).await;
        let mut session = f.session();
        session.save_general(&f.general_form()).await.unwrap();
        let product_id = session.draft().id.unwrap();

        let resumed = WizardSession::resume(&f.backend, &f.storage, Some(&f.user), product_id)
            .await
            .unwrap();
        assert_eq!(resumed.step(), WizardStep::Compliance);
        assert_eq!(resumed.draft().standards.len(), 1);

        let stranger = CurrentUser::member(UserId::new(), "other@example.com");
        let err = WizardSession::resume(&f.backend, &f.storage, Some(&stranger), product_id)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, WizardError::Authz(AuthzError::NotOwner)));

        let err = WizardSession::resume(&f.backend, &f.storage, Some(&f.user), ProductId::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, WizardError::Collaborator(CollaboratorError::NotFound(_))));
    }
}
