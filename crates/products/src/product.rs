//! The draft product and the patches wizard steps produce for it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gpsrhub_core::{AddressId, CatalogId, DomainError, DomainResult, ProductId, UserId};

use crate::association::{Association, AssociationKind, QuestionAnswer, Standard};
use crate::review::{ReviewState, ReviewStatus};
use crate::technical_file::{NotifiedBody, TechnicalFileSlot};

/// Scalar fields of a product row (everything step 1 edits, plus representatives).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub name: String,
    pub batch_number: String,
    pub model: String,
    /// Public URLs of stored product images, in display order.
    pub images: Vec<String>,
    pub specification: Option<String>,
    pub category_id: Option<CatalogId>,
    pub product_type_id: Option<CatalogId>,
    /// Whether the product must carry CE/UKCA marking. `None` until step 1 is saved.
    pub requires_marking: Option<bool>,
    pub manufacturer_id: Option<AddressId>,
    pub eu_representative_id: Option<AddressId>,
    pub uk_representative_id: Option<AddressId>,
}

impl ProductDetails {
    pub fn has_any_representative(&self) -> bool {
        self.eu_representative_id.is_some() || self.uk_representative_id.is_some()
    }

    pub fn has_both_representatives(&self) -> bool {
        self.eu_representative_id.is_some() && self.uk_representative_id.is_some()
    }
}

/// The four confirmations ticked before submitting for review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declarations {
    /// The information provided is accurate and complete.
    pub information_accurate: bool,
    /// The submitter is authorised to act for the manufacturer.
    pub authorised_to_submit: bool,
    /// Technical documentation will be retained for ten years.
    pub documents_retained: bool,
    pub terms_accepted: bool,
}

impl Declarations {
    pub fn all_checked() -> Self {
        Self {
            information_accurate: true,
            authorised_to_submit: true,
            documents_retained: true,
            terms_accepted: true,
        }
    }

    /// First unchecked declaration, by form order.
    pub fn first_unchecked(&self) -> Option<&'static str> {
        [
            (self.information_accurate, "information_accurate"),
            (self.authorised_to_submit, "authorised_to_submit"),
            (self.documents_retained, "documents_retained"),
            (self.terms_accepted, "terms_accepted"),
        ]
        .into_iter()
        .find(|(checked, _)| !checked)
        .map(|(_, name)| name)
    }
}

/// The in-progress compliance record assembled by the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftProduct {
    /// Assigned by the first step-1 save.
    pub id: Option<ProductId>,
    pub owner_id: UserId,
    pub details: ProductDetails,
    pub question_answers: Vec<QuestionAnswer>,
    pub directives: Vec<Association>,
    pub regulations: Vec<Association>,
    pub standards: Vec<Standard>,
    pub technical_files: Vec<TechnicalFileSlot>,
    pub notified_body: Option<NotifiedBody>,
    pub declarations: Declarations,
    pub review: ReviewState,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Rows created by default provisioning on the first save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provisioned {
    pub directives: Vec<Association>,
    pub regulations: Vec<Association>,
    pub standards: Vec<Standard>,
}

/// What a step handler hands back to the wizard after its calls succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "patch", rename_all = "snake_case")]
pub enum DraftPatch {
    General {
        product_id: ProductId,
        details: ProductDetails,
        question_answers: Vec<QuestionAnswer>,
        provisioned: Option<Provisioned>,
        saved_at: DateTime<Utc>,
    },
    Compliance {
        directives: Vec<Association>,
        regulations: Vec<Association>,
        eu_representative_id: Option<AddressId>,
        uk_representative_id: Option<AddressId>,
    },
    Standards(Vec<Standard>),
    TechnicalFiles {
        slots: Vec<TechnicalFileSlot>,
        notified_body: Option<NotifiedBody>,
    },
    Submitted {
        declarations: Declarations,
        review: ReviewState,
    },
    /// Status change made by a reviewer.
    Review(ReviewState),
}

impl DraftPatch {
    /// Whether applying this patch finishes the wizard step it came from.
    pub fn completes_step(&self) -> bool {
        matches!(
            self,
            DraftPatch::General { .. } | DraftPatch::Compliance { .. } | DraftPatch::Submitted { .. }
        )
    }

    fn name(&self) -> &'static str {
        match self {
            DraftPatch::General { .. } => "general",
            DraftPatch::Compliance { .. } => "compliance",
            DraftPatch::Standards(_) => "standards",
            DraftPatch::TechnicalFiles { .. } => "technical_files",
            DraftPatch::Submitted { .. } => "submitted",
            DraftPatch::Review(_) => "review",
        }
    }
}

impl DraftProduct {
    /// Empty draft at wizard start.
    pub fn new(owner_id: UserId) -> Self {
        Self {
            id: None,
            owner_id,
            details: ProductDetails::default(),
            question_answers: Vec::new(),
            directives: Vec::new(),
            regulations: Vec::new(),
            standards: Vec::new(),
            technical_files: Vec::new(),
            notified_body: None,
            declarations: Declarations::default(),
            review: ReviewState::default(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn status(&self) -> ReviewStatus {
        self.review.status
    }

    pub fn associations(&self, kind: AssociationKind) -> &[Association] {
        match kind {
            AssociationKind::Directive => &self.directives,
            AssociationKind::Regulation => &self.regulations,
        }
    }

    /// Id of a product that has been saved at least once.
    pub fn persisted_id(&self) -> DomainResult<ProductId> {
        self.id
            .ok_or_else(|| DomainError::invariant("product has not been saved yet"))
    }

    pub fn ensure_editable(&self) -> DomainResult<()> {
        if self.review.status.is_editable() {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "product is {} and can no longer be edited",
                self.review.status
            )))
        }
    }

    pub fn has_compliance_references(&self) -> bool {
        !self.directives.is_empty() || !self.regulations.is_empty() || !self.standards.is_empty()
    }

    /// Every field step 1 is responsible for is populated.
    pub fn general_complete(&self) -> bool {
        let d = &self.details;
        !d.name.trim().is_empty()
            && d.requires_marking.is_some()
            && !d.batch_number.trim().is_empty()
            && !d.model.trim().is_empty()
            && !d.images.is_empty()
            && d.category_id.is_some()
            && d.product_type_id.is_some()
            && d.manufacturer_id.is_some()
            && !self.question_answers.is_empty()
            && d.has_any_representative()
    }

    /// Every field step 2 is responsible for is populated.
    pub fn compliance_complete(&self) -> bool {
        self.has_compliance_references() && self.details.has_both_representatives()
    }

    pub fn summary(&self) -> Option<ProductSummary> {
        Some(ProductSummary {
            id: self.id?,
            owner_id: self.owner_id,
            name: self.details.name.clone(),
            model: self.details.model.clone(),
            status: self.review.status,
            submitted_at: self.review.submitted_at,
        })
    }

    /// Merge a step's result into the canonical draft.
    pub fn apply(&mut self, patch: DraftPatch) -> DomainResult<()> {
        if self.id.is_none() && !matches!(patch, DraftPatch::General { .. }) {
            return Err(DomainError::invariant(format!(
                "{} patch applied before the product was saved",
                patch.name()
            )));
        }

        match patch {
            DraftPatch::General {
                product_id,
                details,
                question_answers,
                provisioned,
                saved_at,
            } => {
                if self.id.is_some_and(|existing| existing != product_id) {
                    return Err(DomainError::invariant("general patch targets another product"));
                }
                self.id = Some(product_id);
                self.details = details;
                self.question_answers = question_answers;
                if let Some(p) = provisioned {
                    self.directives.extend(p.directives);
                    self.regulations.extend(p.regulations);
                    self.standards.extend(p.standards);
                }
                self.created_at.get_or_insert(saved_at);
                self.updated_at = Some(saved_at);
            }
            DraftPatch::Compliance {
                directives,
                regulations,
                eu_representative_id,
                uk_representative_id,
            } => {
                self.directives = directives;
                self.regulations = regulations;
                self.details.eu_representative_id = eu_representative_id;
                self.details.uk_representative_id = uk_representative_id;
            }
            DraftPatch::Standards(standards) => self.standards = standards,
            DraftPatch::TechnicalFiles {
                slots,
                notified_body,
            } => {
                self.technical_files = slots;
                self.notified_body = notified_body;
            }
            DraftPatch::Submitted {
                declarations,
                review,
            } => {
                self.declarations = declarations;
                self.review = review;
            }
            DraftPatch::Review(review) => self.review = review,
        }
        Ok(())
    }
}

/// Listing row for dashboards and the review queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub owner_id: UserId,
    pub name: String,
    pub model: String,
    pub status: ReviewStatus,
    pub submitted_at: Option<DateTime<Utc>>,
}
