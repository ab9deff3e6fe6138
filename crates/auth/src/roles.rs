use serde::{Deserialize, Serialize};

use crate::Permission;

/// Account role.
///
/// Members own products, addresses and subscriptions. Admins review submitted
/// products; they can read any product but only ever write its review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }

    /// Permissions granted by this role.
    pub fn permissions(&self) -> &'static [Permission] {
        const MEMBER: &[Permission] = &[
            Permission::PRODUCTS_WRITE,
            Permission::ADDRESSES_WRITE,
            Permission::CATALOG_READ,
            Permission::BILLING_MANAGE,
            Permission::CHECKER_USE,
        ];
        const ADMIN: &[Permission] = &[
            Permission::PRODUCTS_READ_ANY,
            Permission::PRODUCTS_REVIEW,
            Permission::CATALOG_READ,
        ];
        match self {
            Role::Member => MEMBER,
            Role::Admin => ADMIN,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
