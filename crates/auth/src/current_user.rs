use serde::{Deserialize, Serialize};

use gpsrhub_core::UserId;

use crate::Role;

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl CurrentUser {
    pub fn member(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            role: Role::Member,
        }
    }

    pub fn admin(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
