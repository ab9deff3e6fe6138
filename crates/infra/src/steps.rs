//! Step handlers.
//!
//! Each handler reads the current draft, issues its collaborator calls one at a
//! time and returns the `DraftPatch` describing what persistence now holds. None
//! of them mutate the draft; `WizardSession` merges the patch.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use gpsrhub_billing::BillingError;
use gpsrhub_core::{AddressId, CatalogId, DomainError, FileUpload, ProductId, StandardId, UserId};
use gpsrhub_parties::AddressKind;
use gpsrhub_products::{
    AssociationKind, CatalogQuery, Declarations, DraftPatch, DraftProduct, GeneralDetails,
    NewStandard, NotifiedBody, ProductDetails, Provisioned, ReviewAction, TechnicalFileKind,
    TechnicalFileSlot, ValidationError, validate_general, validate_kept_images, validate_submission,
};

use crate::error::WizardError;
use crate::persistence::{Backend, StoreResult};
use crate::reconcile::{AnswerLinker, AssociationLinker, reconcile};
use crate::storage::ObjectStorage;

/// Step 2 form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceSelection {
    pub directive_ids: Vec<CatalogId>,
    pub regulation_ids: Vec<CatalogId>,
    pub eu_representative_id: Option<AddressId>,
    pub uk_representative_id: Option<AddressId>,
}

/// Rebuild a draft from persistence.
pub async fn load_draft<B>(backend: &B, product_id: ProductId) -> StoreResult<DraftProduct>
where
    B: Backend + ?Sized,
{
    let row = backend.get_product(product_id).await?;
    let question_answers = backend.list_answers(product_id).await?;
    let directives = backend
        .list_associations(product_id, AssociationKind::Directive)
        .await?;
    let regulations = backend
        .list_associations(product_id, AssociationKind::Regulation)
        .await?;
    let standards = backend.list_standards(product_id).await?;
    let technical_files = backend.list_slots(product_id).await?;

    Ok(DraftProduct {
        id: Some(row.id),
        owner_id: row.owner_id,
        details: row.details,
        question_answers,
        directives,
        regulations,
        standards,
        technical_files,
        notified_body: row.notified_body,
        declarations: row.declarations,
        review: row.review,
        created_at: Some(row.created_at),
        updated_at: Some(row.updated_at),
    })
}

async fn check_address<B>(
    backend: &B,
    owner_id: UserId,
    id: Option<AddressId>,
    kind: AddressKind,
) -> Result<(), WizardError>
where
    B: Backend + ?Sized,
{
    if let Some(id) = id {
        backend.get_address(id).await?.ensure_usable_as(owner_id, kind)?;
    }
    Ok(())
}

/// Delete stored objects the product no longer references. Failures are logged.
async fn discard_objects<S>(storage: &S, urls: &[String])
where
    S: ObjectStorage + ?Sized,
{
    for url in urls {
        match storage.delete(url).await {
            Ok(true) => debug!(url = %url, "deleted stored object"),
            Ok(false) => warn!(url = %url, "stored object was not deleted"),
            Err(error) => warn!(url = %url, error = %error, "failed to delete stored object"),
        }
    }
}

/// Step 1: save general information.
///
/// The first save runs the subscription quota check and inserts the product row.
/// Later saves update the row in place. Whenever the product has no directives,
/// regulations or standards yet, the product type's defaults are provisioned.
pub async fn save_general<B, S>(
    backend: &B,
    storage: &S,
    draft: &DraftProduct,
    form: &GeneralDetails,
) -> Result<DraftPatch, WizardError>
where
    B: Backend + ?Sized,
    S: ObjectStorage + ?Sized,
{
    draft.ensure_editable()?;
    validate_general(form)?;
    validate_kept_images(&draft.details.images, form)?;
    if let Some(file) = form.new_images.iter().find(|file| !file.is_image()) {
        return Err(DomainError::validation(format!("{} is not an image", file.file_name)).into());
    }
    let product_type_id = form
        .product_type_id
        .ok_or(ValidationError::MissingField("product type"))?;

    let questions = backend
        .list_questions(product_type_id, &CatalogQuery::summary())
        .await?;
    if let Some(unknown) = form
        .selected_question_ids
        .iter()
        .find(|id| !questions.iter().any(|q| q.id == **id))
    {
        return Err(ValidationError::UnknownQuestion(*unknown).into());
    }

    let owner_id = draft.owner_id;
    check_address(backend, owner_id, form.manufacturer_id, AddressKind::Manufacturer).await?;
    check_address(backend, owner_id, form.eu_representative_id, AddressKind::EuRepresentative).await?;
    check_address(backend, owner_id, form.uk_representative_id, AddressKind::UkRepresentative).await?;

    let first_save = draft.id.is_none();
    if first_save {
        let subscription = backend
            .subscription(owner_id)
            .await?
            .ok_or(BillingError::NoSubscription)?;
        let existing = backend.count_products(owner_id).await?;
        subscription.ensure_can_register_product(existing)?;
    }
    // Decided from what persistence holds, so a first save that stopped after the
    // insert still gets its defaults on the retry.
    let defaults = if draft.has_compliance_references() {
        None
    } else {
        Some(backend.provisioning_defaults(product_type_id).await?)
    };

    let mut uploaded = Vec::with_capacity(form.new_images.len());
    let hint = format!("{}-image", form.name.trim());
    for file in &form.new_images {
        match storage.upload(file, owner_id, &hint).await {
            Ok(stored) => uploaded.push(stored.public_url),
            Err(error) => {
                discard_objects(storage, &uploaded).await;
                return Err(error.into());
            }
        }
    }

    let details = ProductDetails {
        name: form.name.trim().to_string(),
        batch_number: form.batch_number.trim().to_string(),
        model: form.model.trim().to_string(),
        images: form.kept_images.iter().cloned().chain(uploaded.iter().cloned()).collect(),
        specification: form
            .specification
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        category_id: form.category_id,
        product_type_id: form.product_type_id,
        requires_marking: Some(form.requires_marking),
        manufacturer_id: form.manufacturer_id,
        eu_representative_id: form.eu_representative_id,
        uk_representative_id: form.uk_representative_id,
    };

    let saved = match draft.id {
        Some(id) => backend.update_product(id, &details).await,
        None => backend.insert_product(owner_id, &details).await,
    };
    let row = match saved {
        Ok(row) => row,
        Err(error) => {
            discard_objects(storage, &uploaded).await;
            return Err(error.into());
        }
    };
    info!(product_id = %row.id, first_save, images = row.details.images.len(), "saved general information");

    let dropped: Vec<String> = draft
        .details
        .images
        .iter()
        .filter(|url| !form.kept_images.contains(url))
        .cloned()
        .collect();
    discard_objects(storage, &dropped).await;

    let answers = reconcile(
        &AnswerLinker::new(backend),
        row.id,
        &draft.question_answers,
        &form.selected_question_ids,
    )
    .await?;

    let provisioned = match defaults {
        Some(defaults) if !defaults.is_empty() => {
            let directives = reconcile(
                &AssociationLinker::new(backend, AssociationKind::Directive),
                row.id,
                &draft.directives,
                &defaults.directive_ids,
            )
            .await?;
            let regulations = reconcile(
                &AssociationLinker::new(backend, AssociationKind::Regulation),
                row.id,
                &draft.regulations,
                &defaults.regulation_ids,
            )
            .await?;
            let mut standards = Vec::with_capacity(defaults.standards.len());
            for template in &defaults.standards {
                // Templates are a convenience; a failed one is left for the user to add.
                match backend.add_standard(row.id, template).await {
                    Ok(standard) => standards.push(standard),
                    Err(error) => warn!(
                        product_id = %row.id,
                        reference = %template.reference_number,
                        error = %error,
                        "default standard not provisioned"
                    ),
                }
            }
            debug!(
                product_id = %row.id,
                directives = directives.rows.len(),
                regulations = regulations.rows.len(),
                standards = standards.len(),
                "provisioned product type defaults"
            );
            Some(Provisioned {
                directives: directives.rows,
                regulations: regulations.rows,
                standards,
            })
        }
        _ => None,
    };

    Ok(DraftPatch::General {
        product_id: row.id,
        details: row.details,
        question_answers: answers.rows,
        provisioned,
        saved_at: row.updated_at,
    })
}

/// Step 2: directives, regulations and representatives.
pub async fn save_compliance<B>(
    backend: &B,
    draft: &DraftProduct,
    selection: &ComplianceSelection,
) -> Result<DraftPatch, WizardError>
where
    B: Backend + ?Sized,
{
    let product_id = draft.persisted_id()?;
    draft.ensure_editable()?;
    if selection.eu_representative_id.is_none() && selection.uk_representative_id.is_none() {
        return Err(ValidationError::NoRepresentative.into());
    }
    let owner_id = draft.owner_id;
    check_address(backend, owner_id, selection.eu_representative_id, AddressKind::EuRepresentative).await?;
    check_address(backend, owner_id, selection.uk_representative_id, AddressKind::UkRepresentative).await?;

    // Row update before the link batches; only the batches can leave a partial write.
    let representatives_changed = draft.details.eu_representative_id != selection.eu_representative_id
        || draft.details.uk_representative_id != selection.uk_representative_id;
    if representatives_changed {
        let details = ProductDetails {
            eu_representative_id: selection.eu_representative_id,
            uk_representative_id: selection.uk_representative_id,
            ..draft.details.clone()
        };
        backend.update_product(product_id, &details).await?;
    }

    let directives = reconcile(
        &AssociationLinker::new(backend, AssociationKind::Directive),
        product_id,
        &draft.directives,
        &selection.directive_ids,
    )
    .await?;
    let regulations = reconcile(
        &AssociationLinker::new(backend, AssociationKind::Regulation),
        product_id,
        &draft.regulations,
        &selection.regulation_ids,
    )
    .await?;

    info!(
        product_id = %product_id,
        link_calls = directives.calls() + regulations.calls(),
        representatives_changed,
        "saved compliance selection"
    );

    Ok(DraftPatch::Compliance {
        directives: directives.rows,
        regulations: regulations.rows,
        eu_representative_id: selection.eu_representative_id,
        uk_representative_id: selection.uk_representative_id,
    })
}

pub async fn add_standard<B>(
    backend: &B,
    draft: &DraftProduct,
    input: &NewStandard,
) -> Result<DraftPatch, WizardError>
where
    B: Backend + ?Sized,
{
    let product_id = draft.persisted_id()?;
    draft.ensure_editable()?;
    let input = input.validated()?;
    let standard = backend.add_standard(product_id, &input).await?;
    debug!(product_id = %product_id, standard_id = %standard.id, "added standard");

    let mut standards = draft.standards.clone();
    standards.push(standard);
    Ok(DraftPatch::Standards(standards))
}

pub async fn remove_standard<B>(
    backend: &B,
    draft: &DraftProduct,
    standard_id: StandardId,
) -> Result<DraftPatch, WizardError>
where
    B: Backend + ?Sized,
{
    let product_id = draft.persisted_id()?;
    draft.ensure_editable()?;
    if !draft.standards.iter().any(|s| s.id == standard_id) {
        return Err(DomainError::not_found().into());
    }
    backend.remove_standard(product_id, standard_id).await?;

    let standards = draft
        .standards
        .iter()
        .filter(|s| s.id != standard_id)
        .cloned()
        .collect();
    Ok(DraftPatch::Standards(standards))
}

fn existing_slot(draft: &DraftProduct, kind: TechnicalFileKind) -> Option<&TechnicalFileSlot> {
    draft.technical_files.iter().find(|slot| slot.kind == kind)
}

/// Slots of `draft` with the `kind` row replaced (or dropped when `slot` is `None`).
fn slots_patch(draft: &DraftProduct, kind: TechnicalFileKind, slot: Option<TechnicalFileSlot>) -> DraftPatch {
    let mut slots: Vec<TechnicalFileSlot> = draft
        .technical_files
        .iter()
        .filter(|s| s.kind != kind)
        .cloned()
        .chain(slot)
        .collect();
    slots.sort_by_key(|s| s.kind);
    DraftPatch::TechnicalFiles {
        slots,
        notified_body: draft.notified_body.clone(),
    }
}

/// Step 3: store a document in a slot, replacing whatever the slot held.
pub async fn upload_technical_file<B, S>(
    backend: &B,
    storage: &S,
    draft: &DraftProduct,
    kind: TechnicalFileKind,
    file: &FileUpload,
) -> Result<DraftPatch, WizardError>
where
    B: Backend + ?Sized,
    S: ObjectStorage + ?Sized,
{
    let product_id = draft.persisted_id()?;
    draft.ensure_editable()?;
    if file.is_empty() {
        return Err(DomainError::validation(format!("{} is empty", file.file_name)).into());
    }

    let stored = storage.upload(file, draft.owner_id, kind.key()).await?;
    let slot = TechnicalFileSlot::with_file(product_id, kind, stored.public_url.clone(), Utc::now());
    let saved = match backend.upsert_slot(&slot).await {
        Ok(saved) => saved,
        Err(error) => {
            discard_objects(storage, &[stored.public_url]).await;
            return Err(error.into());
        }
    };
    info!(product_id = %product_id, slot = %kind, path = %stored.path, "uploaded technical file");

    if let Some(previous) = existing_slot(draft, kind).and_then(|s| s.file_url()) {
        discard_objects(storage, &[previous.to_string()]).await;
    }
    Ok(slots_patch(draft, kind, Some(saved)))
}

pub async fn remove_technical_file<B, S>(
    backend: &B,
    storage: &S,
    draft: &DraftProduct,
    kind: TechnicalFileKind,
) -> Result<DraftPatch, WizardError>
where
    B: Backend + ?Sized,
    S: ObjectStorage + ?Sized,
{
    let product_id = draft.persisted_id()?;
    draft.ensure_editable()?;
    let Some(file_url) = existing_slot(draft, kind).and_then(|s| s.file_url()) else {
        return Err(DomainError::conflict(format!("{} has no uploaded file", kind.label())).into());
    };

    backend.clear_slot(product_id, kind).await?;
    discard_objects(storage, &[file_url.to_string()]).await;
    Ok(slots_patch(draft, kind, None))
}

/// Rejected while the slot holds a file.
pub async fn mark_not_required<B>(
    backend: &B,
    draft: &DraftProduct,
    kind: TechnicalFileKind,
    reason: &str,
) -> Result<DraftPatch, WizardError>
where
    B: Backend + ?Sized,
{
    let product_id = draft.persisted_id()?;
    draft.ensure_editable()?;
    let slot = TechnicalFileSlot::not_required(product_id, kind, reason, existing_slot(draft, kind), Utc::now())?;
    let saved = backend.upsert_slot(&slot).await?;
    Ok(slots_patch(draft, kind, Some(saved)))
}

pub async fn clear_not_required<B>(
    backend: &B,
    draft: &DraftProduct,
    kind: TechnicalFileKind,
) -> Result<DraftPatch, WizardError>
where
    B: Backend + ?Sized,
{
    let product_id = draft.persisted_id()?;
    draft.ensure_editable()?;
    if !existing_slot(draft, kind).is_some_and(TechnicalFileSlot::is_not_required) {
        return Err(DomainError::conflict(format!("{} is not marked as not required", kind.label())).into());
    }
    backend.clear_slot(product_id, kind).await?;
    Ok(slots_patch(draft, kind, None))
}

pub async fn save_notified_body<B>(
    backend: &B,
    draft: &DraftProduct,
    body: &NotifiedBody,
) -> Result<DraftPatch, WizardError>
where
    B: Backend + ?Sized,
{
    let product_id = draft.persisted_id()?;
    draft.ensure_editable()?;
    let saved = backend.save_notified_body(product_id, body).await?;
    Ok(DraftPatch::TechnicalFiles {
        slots: draft.technical_files.clone(),
        notified_body: Some(saved),
    })
}

/// Step 3 finish: validate, record declarations and hand over for review.
pub async fn submit_for_review<B>(
    backend: &B,
    draft: &DraftProduct,
    declarations: &Declarations,
) -> Result<DraftPatch, WizardError>
where
    B: Backend + ?Sized,
{
    let product_id = draft.persisted_id()?;
    validate_submission(draft, declarations)?;
    let review = draft.review.apply(&ReviewAction::Submit, Utc::now())?;
    let review = backend.set_review(product_id, &review, Some(declarations)).await?;
    info!(product_id = %product_id, status = %review.status, "submitted for review");

    Ok(DraftPatch::Submitted {
        declarations: *declarations,
        review,
    })
}
