use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gpsrhub_core::{DomainError, UserId};

use crate::plan::Plan;

/// Subscription status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trialing,
    Active,
    PastDue,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
        }
    }

    /// New products may be registered in this status.
    pub fn is_in_good_standing(&self) -> bool {
        matches!(self, SubscriptionStatus::Trialing | SubscriptionStatus::Active)
    }
}

impl core::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    #[error("no subscription found")]
    NoSubscription,

    #[error("subscription is {0}")]
    Inactive(SubscriptionStatus),

    #[error("the {plan} plan allows {limit} product(s)")]
    LimitReached { plan: Plan, limit: usize },

    #[error("cannot {action} a subscription that is {status}")]
    IllegalTransition {
        action: &'static str,
        status: SubscriptionStatus,
    },
}

impl From<BillingError> for DomainError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::NoSubscription => DomainError::not_found(),
            BillingError::IllegalTransition { .. } => DomainError::conflict(err.to_string()),
            other => DomainError::invariant(other.to_string()),
        }
    }
}

/// A user's plan and billing status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub owner_id: UserId,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Every new account starts on a free trial.
    pub fn trial(owner_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            owner_id,
            plan: Plan::Free,
            status: SubscriptionStatus::Trialing,
            current_period_end: None,
            updated_at: now,
        }
    }

    fn illegal(&self, action: &'static str) -> BillingError {
        BillingError::IllegalTransition {
            action,
            status: self.status,
        }
    }

    /// Payment succeeded for a new period.
    pub fn activate(&self, period_end: DateTime<Utc>, now: DateTime<Utc>) -> Result<Self, BillingError> {
        if self.status == SubscriptionStatus::Canceled {
            return Err(self.illegal("activate"));
        }
        Ok(Self {
            status: SubscriptionStatus::Active,
            current_period_end: Some(period_end),
            updated_at: now,
            ..self.clone()
        })
    }

    pub fn mark_past_due(&self, now: DateTime<Utc>) -> Result<Self, BillingError> {
        if self.status != SubscriptionStatus::Active {
            return Err(self.illegal("mark past due"));
        }
        Ok(Self {
            status: SubscriptionStatus::PastDue,
            updated_at: now,
            ..self.clone()
        })
    }

    pub fn cancel(&self, now: DateTime<Utc>) -> Result<Self, BillingError> {
        if self.status == SubscriptionStatus::Canceled {
            return Err(self.illegal("cancel"));
        }
        Ok(Self {
            status: SubscriptionStatus::Canceled,
            updated_at: now,
            ..self.clone()
        })
    }

    /// Switch tier. Downgrades below the current product count are refused.
    pub fn change_plan(
        &self,
        plan: Plan,
        product_count: usize,
        now: DateTime<Utc>,
    ) -> Result<Self, BillingError> {
        if self.status == SubscriptionStatus::Canceled {
            return Err(self.illegal("change the plan of"));
        }
        if let Some(limit) = plan.product_limit() {
            if product_count > limit {
                return Err(BillingError::LimitReached { plan, limit });
            }
        }
        Ok(Self {
            plan,
            updated_at: now,
            ..self.clone()
        })
    }

    /// Gate for creating product number `existing_count + 1`.
    pub fn ensure_can_register_product(&self, existing_count: usize) -> Result<(), BillingError> {
        if !self.status.is_in_good_standing() {
            return Err(BillingError::Inactive(self.status));
        }
        match self.plan.product_limit() {
            Some(limit) if existing_count >= limit => Err(BillingError::LimitReached {
                plan: self.plan,
                limit,
            }),
            _ => Ok(()),
        }
    }
}
