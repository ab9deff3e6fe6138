use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "products.write"). The
/// well-known ones are exposed as constants; roles map onto them in `Role::permissions`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    /// Create, edit and submit one's own products.
    pub const PRODUCTS_WRITE: Permission = Permission::from_static("products.write");
    /// Read any user's product (review queue).
    pub const PRODUCTS_READ_ANY: Permission = Permission::from_static("products.read_any");
    /// Move a submitted product through the review workflow.
    pub const PRODUCTS_REVIEW: Permission = Permission::from_static("products.review");
    pub const ADDRESSES_WRITE: Permission = Permission::from_static("addresses.write");
    pub const CATALOG_READ: Permission = Permission::from_static("catalog.read");
    pub const BILLING_MANAGE: Permission = Permission::from_static("billing.manage");
    pub const CHECKER_USE: Permission = Permission::from_static("checker.use");

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
