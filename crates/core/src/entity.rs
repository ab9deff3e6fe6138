//! Entity trait: identity + continuity across state changes.

use chrono::{DateTime, Utc};

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Rows that are archived through a nullable `deleted_at` column instead of being
/// physically removed (catalog entries, addresses).
pub trait SoftDeletable {
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    fn is_active(&self) -> bool {
        self.deleted_at().is_none()
    }
}
