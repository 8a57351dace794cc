//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::{ProductId, UserId};

use crate::domain::entities::{
    ActivityLogEntry, InventorySummary, LedgerEntry, Product, ProductDetails, Reconciliation,
    StockMovement, TransactionRecord,
};
use crate::domain::value_objects::StockDirection;
use crate::error::InventoryResult;

/// Product catalogue. Every write also appends its activity entry atomically.
#[trait_variant::make(ProductRepository: Send)]
pub trait LocalProductRepository {
    async fn create_product(&self, product: &Product, activity: &ActivityLogEntry)
    -> InventoryResult<()>;

    async fn find_product(&self, product_id: &ProductId) -> InventoryResult<Option<Product>>;

    /// All products ordered by name
    async fn list_products(&self) -> InventoryResult<Vec<Product>>;

    /// Replace the editable attributes. Stock is left untouched.
    /// Returns `None` when the product does not exist.
    async fn update_product(
        &self,
        product_id: &ProductId,
        details: &ProductDetails,
        activity: &ActivityLogEntry,
    ) -> InventoryResult<Option<Product>>;

    /// Fails with `ProductHasTransactions` while ledger rows reference it.
    async fn delete_product(
        &self,
        product_id: &ProductId,
        activity: &ActivityLogEntry,
    ) -> InventoryResult<()>;
}

/// Stock ledger
#[trait_variant::make(LedgerRepository: Send)]
pub trait LocalLedgerRepository {
    /// Lock the product, check the movement, then update stock and append the
    /// transaction and activity rows as one unit. Nothing is written on error.
    async fn record_movement(&self, movement: &StockMovement) -> InventoryResult<LedgerEntry>;

    /// Newest first
    async fn list_transactions(
        &self,
        direction: Option<StockDirection>,
    ) -> InventoryResult<Vec<TransactionRecord>>;

    async fn reconcile(&self, product_id: &ProductId) -> InventoryResult<Option<Reconciliation>>;

    async fn summary(&self) -> InventoryResult<InventorySummary>;
}

/// Activity log (read side; entries are written by the other repositories)
#[trait_variant::make(ActivityLogRepository: Send)]
pub trait LocalActivityLogRepository {
    /// Newest first, optionally restricted to one user
    async fn list_activity(&self, user_id: Option<&UserId>)
    -> InventoryResult<Vec<ActivityLogEntry>>;
}

/// Everything the inventory handlers need from a single store.
pub trait InventoryStore:
    ProductRepository + LedgerRepository + ActivityLogRepository + Clone + Send + Sync + 'static
{
}

impl<T> InventoryStore for T where
    T: ProductRepository + LedgerRepository + ActivityLogRepository + Clone + Send + Sync + 'static
{
}
