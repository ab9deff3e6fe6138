use serde::{Deserialize, Serialize};

/// Billing plan tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Starter,
    Professional,
    Enterprise,
}

impl Plan {
    pub const ALL: [Plan; 4] = [Plan::Free, Plan::Starter, Plan::Professional, Plan::Enterprise];

    /// How many products the plan allows; `None` means unlimited.
    pub fn product_limit(&self) -> Option<usize> {
        match self {
            Plan::Free => Some(1),
            Plan::Starter => Some(10),
            Plan::Professional => Some(100),
            Plan::Enterprise => None,
        }
    }

    pub fn allows(&self, product_count: usize) -> bool {
        self.product_limit().is_none_or(|limit| product_count <= limit)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Starter => "starter",
            Plan::Professional => "professional",
            Plan::Enterprise => "enterprise",
        }
    }
}

impl core::fmt::Display for Plan {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
