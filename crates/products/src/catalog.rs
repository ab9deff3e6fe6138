//! Reference catalog read by the wizard: categories, product types, directives,
//! regulations and the yes/no product questions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gpsrhub_core::{CatalogId, Entity, SoftDeletable};

use crate::association::{AssociationKind, NewStandard};

/// A directive or regulation the product can be declared against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: CatalogId,
    pub kind: AssociationKind,
    /// Short reference, e.g. "2009/48/EC".
    pub code: String,
    pub title: String,
    /// Omitted by `Projection::Summary`.
    pub description: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CatalogId,
    pub name: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductType {
    pub id: CatalogId,
    pub category_id: CatalogId,
    pub name: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Yes/no question shown in step 1 for a product type ("Is it intended for
/// children under 3?").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: CatalogId,
    pub product_type_id: CatalogId,
    pub text: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// What a freshly created product of a given type starts out linked to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningDefaults {
    pub directive_ids: Vec<CatalogId>,
    pub regulation_ids: Vec<CatalogId>,
    pub standards: Vec<NewStandard>,
}

impl ProvisioningDefaults {
    pub fn is_empty(&self) -> bool {
        self.directive_ids.is_empty() && self.regulation_ids.is_empty() && self.standards.is_empty()
    }

    pub fn ids_for(&self, kind: AssociationKind) -> &[CatalogId] {
        match kind {
            AssociationKind::Directive => &self.directive_ids,
            AssociationKind::Regulation => &self.regulation_ids,
        }
    }
}

/// Field projection for catalog list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    #[default]
    All,
    /// Identity, code and title only.
    Summary,
}

/// Filter for catalog list queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub projection: Projection,
    /// Restrict to these ids (equality filter); `None` means all.
    pub ids: Option<Vec<CatalogId>>,
    pub include_deleted: bool,
}

impl CatalogQuery {
    pub fn summary() -> Self {
        Self {
            projection: Projection::Summary,
            ..Self::default()
        }
    }

    pub fn with_ids(mut self, ids: impl IntoIterator<Item = CatalogId>) -> Self {
        self.ids = Some(ids.into_iter().collect());
        self
    }

    /// Whether a row passes the id and soft-delete filters.
    pub fn admits(&self, id: CatalogId, deleted_at: Option<DateTime<Utc>>) -> bool {
        if deleted_at.is_some() && !self.include_deleted {
            return false;
        }
        match &self.ids {
            Some(ids) => ids.contains(&id),
            None => true,
        }
    }

    /// Apply filters and projection to a directive/regulation listing.
    pub fn apply(&self, entries: impl IntoIterator<Item = CatalogEntry>) -> Vec<CatalogEntry> {
        entries
            .into_iter()
            .filter(|e| self.admits(e.id, e.deleted_at))
            .map(|mut e| {
                if self.projection == Projection::Summary {
                    e.description = None;
                }
                e
            })
            .collect()
    }
}

impl Entity for CatalogEntry {
    type Id = CatalogId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl SoftDeletable for CatalogEntry {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

impl SoftDeletable for Category {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

impl SoftDeletable for ProductType {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

impl SoftDeletable for Question {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}
