//! Manage Products Use Case
//!
//! Catalogue maintenance. Reads are open to every active role, writes are
//! reserved for admins and every write lands in the activity log.

use std::sync::Arc;

use chrono::Utc;
use kernel::access::{Actor, Permission};
use kernel::id::ProductId;

use crate::domain::entities::{ActivityLogEntry, Product, ProductDetails};
use crate::domain::repository::ProductRepository;
use crate::domain::services::{ProductChange, describe_product_change};
use crate::error::{InventoryError, InventoryResult};

#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub price: i64,
    pub category: Option<String>,
    pub image: Option<String>,
}

impl ProductInput {
    fn into_details(self) -> InventoryResult<ProductDetails> {
        ProductDetails::new(&self.name, self.price, self.category, self.image)
    }
}

pub struct ManageProductsUseCase<P>
where
    P: ProductRepository,
{
    product_repo: Arc<P>,
}

impl<P> ManageProductsUseCase<P>
where
    P: ProductRepository,
{
    pub fn new(product_repo: Arc<P>) -> Self {
        Self { product_repo }
    }

    pub async fn list(&self, actor: &Actor) -> InventoryResult<Vec<Product>> {
        actor.authorize(Permission::ViewProducts)?;
        self.product_repo.list_products().await
    }

    pub async fn get(&self, actor: &Actor, product_id: &ProductId) -> InventoryResult<Product> {
        actor.authorize(Permission::ViewProducts)?;
        self.product_repo
            .find_product(product_id)
            .await?
            .ok_or(InventoryError::ProductNotFound)
    }

    /// `initial_stock` seeds both the stock and the reconciliation base.
    pub async fn create(
        &self,
        actor: &Actor,
        input: ProductInput,
        initial_stock: i64,
    ) -> InventoryResult<Product> {
        actor.authorize(Permission::ManageProducts)?;

        if initial_stock < 0 {
            return Err(InventoryError::InvalidProduct(
                "Initial stock cannot be negative".to_string(),
            ));
        }

        let product = Product::new(input.into_details()?, initial_stock);
        let activity = ActivityLogEntry::new(
            actor,
            describe_product_change(actor, ProductChange::Created, product.name.as_str()),
            product.created_at,
        );

        self.product_repo.create_product(&product, &activity).await?;

        tracing::info!(
            actor = %actor.user_id,
            product_id = %product.product_id,
            initial_stock,
            "Product created"
        );

        Ok(product)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        product_id: &ProductId,
        input: ProductInput,
    ) -> InventoryResult<Product> {
        actor.authorize(Permission::ManageProducts)?;

        let details = input.into_details()?;
        let activity = ActivityLogEntry::new(
            actor,
            describe_product_change(actor, ProductChange::Updated, details.name.as_str()),
            Utc::now(),
        );

        let product = self
            .product_repo
            .update_product(product_id, &details, &activity)
            .await?
            .ok_or(InventoryError::ProductNotFound)?;

        tracing::info!(actor = %actor.user_id, product_id = %product_id, "Product updated");

        Ok(product)
    }

    /// Products that already appear in the ledger cannot be deleted.
    pub async fn delete(&self, actor: &Actor, product_id: &ProductId) -> InventoryResult<()> {
        actor.authorize(Permission::ManageProducts)?;

        let product = self
            .product_repo
            .find_product(product_id)
            .await?
            .ok_or(InventoryError::ProductNotFound)?;

        let activity = ActivityLogEntry::new(
            actor,
            describe_product_change(actor, ProductChange::Deleted, product.name.as_str()),
            Utc::now(),
        );

        self.product_repo.delete_product(product_id, &activity).await?;

        tracing::info!(actor = %actor.user_id, product_id = %product_id, "Product deleted");

        Ok(())
    }
}
