//! Shared domain building blocks.
//!
//! Identifiers, the domain error model and small value types used by every other
//! crate. No IO lives here.

pub mod entity;
pub mod error;
pub mod id;
pub mod upload;

pub use entity::{Entity, SoftDeletable};
pub use error::{ConfigError, DomainError, DomainResult};
pub use id::{AddressId, AssociationId, CatalogId, ProductId, StandardId, UserId};
pub use upload::FileUpload;
