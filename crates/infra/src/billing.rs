//! Subscription management for the signed-in user.

use chrono::{DateTime, Utc};
use tracing::info;

use gpsrhub_auth::{CurrentUser, Permission, authorize, require_user};
use gpsrhub_billing::{BillingError, Plan, Subscription};
use gpsrhub_core::{DomainError, UserId};

use crate::error::WizardError;
use crate::persistence::{ProductRepository, SubscriptionStore};

pub struct Billing<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> Billing<'a, S>
where
    S: SubscriptionStore + ProductRepository + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    fn manager(user: Option<&CurrentUser>) -> Result<&CurrentUser, WizardError> {
        let user = require_user(user)?;
        authorize(user, &Permission::BILLING_MANAGE)?;
        Ok(user)
    }

    async fn existing(&self, owner_id: UserId) -> Result<Subscription, WizardError> {
        Ok(self
            .store
            .subscription(owner_id)
            .await?
            .ok_or(BillingError::NoSubscription)?)
    }

    async fn save(&self, next: Subscription) -> Result<Subscription, WizardError> {
        let saved = self.store.save_subscription(&next).await?;
        info!(
            owner_id = %saved.owner_id,
            plan = %saved.plan,
            status = %saved.status,
            "subscription updated"
        );
        Ok(saved)
    }

    pub async fn current(&self, user: Option<&CurrentUser>) -> Result<Option<Subscription>, WizardError> {
        let user = Self::manager(user)?;
        Ok(self.store.subscription(user.id).await?)
    }

    /// Open the free trial for an account that has never subscribed.
    pub async fn start_trial(&self, user: Option<&CurrentUser>) -> Result<Subscription, WizardError> {
        let user = Self::manager(user)?;
        if self.store.subscription(user.id).await?.is_some() {
            return Err(DomainError::conflict("a subscription already exists").into());
        }
        self.save(Subscription::trial(user.id, Utc::now())).await
    }

    pub async fn change_plan(&self, user: Option<&CurrentUser>, plan: Plan) -> Result<Subscription, WizardError> {
        let user = Self::manager(user)?;
        let current = self.existing(user.id).await?;
        let product_count = self.store.count_products(user.id).await?;
        let next = current.change_plan(plan, product_count, Utc::now())?;
        self.save(next).await
    }

    pub async fn cancel(&self, user: Option<&CurrentUser>) -> Result<Subscription, WizardError> {
        let user = Self::manager(user)?;
        let next = self.existing(user.id).await?.cancel(Utc::now())?;
        self.save(next).await
    }

    /// Payment confirmed by the payment provider for `owner_id`.
    pub async fn record_payment(&self, owner_id: UserId, period_end: DateTime<Utc>) -> Result<Subscription, WizardError> {
        let next = self.existing(owner_id).await?.activate(period_end, Utc::now())?;
        self.save(next).await
    }

    /// Renewal charge failed at the payment provider.
    pub async fn record_payment_failure(&self, owner_id: UserId) -> Result<Subscription, WizardError> {
        let next = self.existing(owner_id).await?.mark_past_due(Utc::now())?;
        self.save(next).await
    }
}
