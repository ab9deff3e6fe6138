//! Product registration domain.
//!
//! The draft product assembled by the four-step wizard, its catalog links
//! (directives, regulations, question answers), standards, technical file slots and
//! review lifecycle. Everything here is deterministic domain logic: no IO, no
//! network, no storage.

pub mod association;
pub mod catalog;
pub mod diff;
pub mod product;
pub mod review;
pub mod technical_file;
pub mod validation;
pub mod wizard;

pub use association::{Association, AssociationKind, Linked, NewStandard, QuestionAnswer, Standard};
pub use catalog::{
    CatalogEntry, CatalogQuery, Category, ProductType, Projection, ProvisioningDefaults, Question,
};
pub use diff::{Diff, diff};
pub use product::{Declarations, DraftPatch, DraftProduct, ProductDetails, ProductSummary, Provisioned};
pub use review::{ReviewAction, ReviewState, ReviewStatus};
pub use technical_file::{NotifiedBody, SlotState, TechnicalFileKind, TechnicalFileSlot};
pub use validation::{
    GeneralDetails, ValidationError, validate_general, validate_kept_images, validate_submission,
};
pub use wizard::{StepSequencer, Wizard, WizardStep, resolve_initial_step};
