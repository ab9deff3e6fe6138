//! Read access to the reference catalog for signed-in users.

use gpsrhub_auth::{CurrentUser, Permission, authorize, require_user};
use gpsrhub_core::CatalogId;
use gpsrhub_products::{AssociationKind, CatalogEntry, CatalogQuery, Category, ProductType, Question};

use crate::error::WizardError;
use crate::persistence::CatalogStore;

pub struct Catalog<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> Catalog<'a, S>
where
    S: CatalogStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    fn reader(user: Option<&CurrentUser>) -> Result<(), WizardError> {
        authorize(require_user(user)?, &Permission::CATALOG_READ)?;
        Ok(())
    }

    pub async fn categories(&self, user: Option<&CurrentUser>) -> Result<Vec<Category>, WizardError> {
        Self::reader(user)?;
        Ok(self.store.list_categories(&CatalogQuery::default()).await?)
    }

    pub async fn product_types(
        &self,
        user: Option<&CurrentUser>,
        category_id: CatalogId,
    ) -> Result<Vec<ProductType>, WizardError> {
        Self::reader(user)?;
        Ok(self
            .store
            .list_product_types(category_id, &CatalogQuery::default())
            .await?)
    }

    pub async fn questions(
        &self,
        user: Option<&CurrentUser>,
        product_type_id: CatalogId,
    ) -> Result<Vec<Question>, WizardError> {
        Self::reader(user)?;
        Ok(self
            .store
            .list_questions(product_type_id, &CatalogQuery::default())
            .await?)
    }

    /// Directives or regulations.
    pub async fn entries(
        &self,
        user: Option<&CurrentUser>,
        kind: AssociationKind,
        query: &CatalogQuery,
    ) -> Result<Vec<CatalogEntry>, WizardError> {
        Self::reader(user)?;
        Ok(self.store.list_entries(kind, query).await?)
    }
}
