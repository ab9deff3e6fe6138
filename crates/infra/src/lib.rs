//! Infrastructure layer: collaborator traits, the association reconciler, step
//! handlers and the services a signed-in user talks to.

pub mod addresses;
pub mod billing;
pub mod catalog;
pub mod checker;
pub mod config;
pub mod error;
pub mod memory;
pub mod persistence;
pub mod reconcile;
pub mod review;
pub mod session;
pub mod steps;
pub mod storage;

pub use addresses::AddressBook;
pub use billing::Billing;
pub use catalog::Catalog;
pub use checker::CheckerDesk;
pub use config::StorageConfig;
pub use error::{CollaboratorError, WizardError};
pub use memory::InMemoryBackend;
pub use persistence::{
    AddressStore, AssociationStore, Backend, CatalogStore, ProductRepository, ProductRow,
    QuestionAnswerStore, StandardStore, StoreResult, SubscriptionStore, TechnicalFileStore,
};
pub use reconcile::{
    AnswerLinker, AssociationLinker, LinkOp, Linker, ReconcileFailure, Reconciled, reconcile,
};
pub use review::ReviewDesk;
pub use session::WizardSession;
pub use steps::{ComplianceSelection, load_draft};
pub use storage::{InMemoryObjectStorage, ObjectStorage, PublicUrlLayout, StoredObject};
