//! Rows linking a product to catalog entries, plus user-authored standards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gpsrhub_core::{AssociationId, CatalogId, DomainError, DomainResult, Entity, ProductId, StandardId};

use crate::catalog::CatalogEntry;

/// Catalog family an association points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssociationKind {
    Directive,
    Regulation,
}

impl AssociationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssociationKind::Directive => "directive",
            AssociationKind::Regulation => "regulation",
        }
    }
}

impl core::fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted row that exists because some catalog id was selected.
///
/// Both associations and question answers are reconciled by diffing their
/// `reference_id`s against the newly selected id set.
pub trait Linked {
    fn reference_id(&self) -> CatalogId;
}

/// Product ↔ directive/regulation link.
///
/// Carries copies of the catalog entry's display fields as they were when the link
/// was made, so later catalog edits do not rewrite submitted records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub id: AssociationId,
    pub product_id: ProductId,
    pub kind: AssociationKind,
    pub reference_id: CatalogId,
    pub code: String,
    pub title: String,
    pub linked_at: DateTime<Utc>,
}

impl Association {
    /// Build the row for linking `entry` to `product_id`.
    pub fn link(
        id: AssociationId,
        product_id: ProductId,
        entry: &CatalogEntry,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if entry.deleted_at.is_some() {
            return Err(DomainError::invariant(format!(
                "{} {} is withdrawn and cannot be linked",
                entry.kind, entry.code
            )));
        }
        Ok(Self {
            id,
            product_id,
            kind: entry.kind,
            reference_id: entry.id,
            code: entry.code.clone(),
            title: entry.title.clone(),
            linked_at: now,
        })
    }
}

impl Linked for Association {
    fn reference_id(&self) -> CatalogId {
        self.reference_id
    }
}

impl Entity for Association {
    type Id = AssociationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A "yes" answer to a product question. No row means "no".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub product_id: ProductId,
    pub question_id: CatalogId,
    pub answered_at: DateTime<Utc>,
}

impl Linked for QuestionAnswer {
    fn reference_id(&self) -> CatalogId {
        self.question_id
    }
}

/// Standard as typed into the "add standard" form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStandard {
    /// e.g. "EN 71-1".
    pub reference_number: String,
    /// Edition or publication date, e.g. "2014+A1:2018".
    pub edition: String,
    pub title: String,
}

impl NewStandard {
    pub fn validated(&self) -> DomainResult<Self> {
        let reference_number = self.reference_number.trim();
        if reference_number.is_empty() {
            return Err(DomainError::validation("standard reference number cannot be empty"));
        }
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("standard title cannot be empty"));
        }
        Ok(Self {
            reference_number: reference_number.to_string(),
            edition: self.edition.trim().to_string(),
            title: title.to_string(),
        })
    }
}

/// User-authored standard attached to a product; no catalog backing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standard {
    pub id: StandardId,
    pub product_id: ProductId,
    pub reference_number: String,
    pub edition: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl Standard {
    pub fn create(
        id: StandardId,
        product_id: ProductId,
        input: &NewStandard,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let clean = input.validated()?;
        Ok(Self {
            id,
            product_id,
            reference_number: clean.reference_number,
            edition: clean.edition,
            title: clean.title,
            created_at: now,
        })
    }
}

impl Entity for Standard {
    type Id = StandardId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(deleted: bool) -> CatalogEntry {
        CatalogEntry {
            id: CatalogId::new(7),
            kind: AssociationKind::Directive,
            code: "2009/48/EC".to_string(),
            title: "Toy Safety Directive".to_string(),
            description: None,
            deleted_at: deleted.then(Utc::now),
        }
    }

    #[test]
    fn link_copies_display_fields() {
        let product_id = ProductId::new();
        let association =
            Association::link(AssociationId::new(), product_id, &entry(false), Utc::now()).unwrap();
        assert_eq!(association.reference_id(), CatalogId::new(7));
        assert_eq!(association.code, "2009/48/EC");
        assert_eq!(association.kind, AssociationKind::Directive);
        assert_eq!(association.product_id, product_id);
    }

    #[test]
    fn withdrawn_entries_cannot_be_linked() {
        let err = Association::link(AssociationId::new(), ProductId::new(), &entry(true), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn standards_require_reference_and_title() {
        let blank_ref = NewStandard {
            reference_number: "  ".to_string(),
            edition: "2018".to_string(),
            title: "Safety of toys".to_string(),
        };
        assert!(blank_ref.validated().is_err());

        let ok = NewStandard {
            reference_number: " EN 71-1 ".to_string(),
            edition: " 2014+A1:2018 ".to_string(),
            title: "Safety of toys - Part 1".to_string(),
        };
        let standard = Standard::create(StandardId::new(), ProductId::new(), &ok, Utc::now()).unwrap();
        assert_eq!(standard.reference_number, "EN 71-1");
        assert_eq!(standard.edition, "2014+A1:2018");
    }
}
