//! Subscription plans and the product allowance they grant.

pub mod plan;
pub mod subscription;

pub use plan::Plan;
pub use subscription::{BillingError, Subscription, SubscriptionStatus};
