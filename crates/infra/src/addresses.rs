//! The signed-in user's manufacturer and representative addresses.

use chrono::Utc;
use tracing::info;

use gpsrhub_auth::{CurrentUser, Permission, authorize, ensure_owner, require_user};
use gpsrhub_core::AddressId;
use gpsrhub_parties::{Address, AddressInput, AddressKind};

use crate::error::WizardError;
use crate::persistence::AddressStore;

pub struct AddressBook<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> AddressBook<'a, S>
where
    S: AddressStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    fn writer(user: Option<&CurrentUser>) -> Result<&CurrentUser, WizardError> {
        let user = require_user(user)?;
        authorize(user, &Permission::ADDRESSES_WRITE)?;
        Ok(user)
    }

    /// Owned, existing row for an edit.
    async fn owned(&self, user: &CurrentUser, id: AddressId) -> Result<Address, WizardError> {
        let address = self.store.get_address(id).await?;
        ensure_owner(user, address.owner_id)?;
        Ok(address)
    }

    pub async fn create(
        &self,
        user: Option<&CurrentUser>,
        kind: AddressKind,
        input: &AddressInput,
    ) -> Result<Address, WizardError> {
        let user = Self::writer(user)?;
        let address = Address::register(AddressId::new(), user.id, kind, input, Utc::now())?;
        let saved = self.store.insert_address(&address).await?;
        info!(address_id = %saved.id, kind = %kind, "address created");
        Ok(saved)
    }

    pub async fn update(
        &self,
        user: Option<&CurrentUser>,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, WizardError> {
        let user = Self::writer(user)?;
        let updated = self.owned(user, id).await?.updated(input, Utc::now())?;
        Ok(self.store.update_address(&updated).await?)
    }

    /// Soft delete. Products that already reference the address keep the reference.
    pub async fn archive(&self, user: Option<&CurrentUser>, id: AddressId) -> Result<Address, WizardError> {
        let user = Self::writer(user)?;
        let archived = self.owned(user, id).await?.archived(Utc::now())?;
        let saved = self.store.update_address(&archived).await?;
        info!(address_id = %saved.id, "address archived");
        Ok(saved)
    }

    /// Active addresses, optionally of one kind, oldest first.
    pub async fn list(&self, user: Option<&CurrentUser>, kind: Option<AddressKind>) -> Result<Vec<Address>, WizardError> {
        let user = require_user(user)?;
        Ok(self.store.list_addresses(user.id, kind).await?)
    }
}
