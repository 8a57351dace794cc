//! In-memory repository
//!
//! One mutex guards products, ledger and activity log together, so a
//! movement's check and its three writes happen as a single step.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use kernel::id::{ProductId, UserId};

use crate::domain::entities::{
    ActivityLogEntry, InventorySummary, LedgerEntry, Product, ProductDetails, Reconciliation,
    StockMovement, StockTransaction, TransactionRecord,
};
use crate::domain::repository::{ActivityLogRepository, LedgerRepository, ProductRepository};
use crate::domain::services::plan_movement;
use crate::domain::value_objects::StockDirection;
use crate::error::{InventoryError, InventoryResult};

#[derive(Default)]
struct InventoryTables {
    products: HashMap<ProductId, Product>,
    /// Append-only, oldest first
    transactions: Vec<StockTransaction>,
    /// Append-only, oldest first
    activity: Vec<ActivityLogEntry>,
}

impl InventoryTables {
    fn totals(&self, product_id: Option<&ProductId>) -> (i64, i64) {
        self.transactions
            .iter()
            .filter(|t| product_id.is_none_or(|id| t.product_id == *id))
            .fold((0, 0), |(incoming, outgoing), t| match t.direction {
                StockDirection::Incoming => (incoming + t.quantity, outgoing),
                StockDirection::Outgoing => (incoming, outgoing + t.quantity),
            })
    }
}

#[derive(Clone, Default)]
pub struct MemoryInventoryRepository {
    tables: Arc<Mutex<InventoryTables>>,
}

impl MemoryInventoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> InventoryResult<MutexGuard<'_, InventoryTables>> {
        self.tables
            .lock()
            .map_err(|_| InventoryError::Internal("Inventory store lock poisoned".to_string()))
    }
}

impl ProductRepository for MemoryInventoryRepository {
    async fn create_product(
        &self,
        product: &Product,
        activity: &ActivityLogEntry,
    ) -> InventoryResult<()> {
        let mut tables = self.lock()?;
        tables.products.insert(product.product_id, product.clone());
        tables.activity.push(activity.clone());
        Ok(())
    }

    async fn find_product(&self, product_id: &ProductId) -> InventoryResult<Option<Product>> {
        Ok(self.lock()?.products.get(product_id).cloned())
    }

    async fn list_products(&self) -> InventoryResult<Vec<Product>> {
        let mut products: Vec<Product> = self.lock()?.products.values().cloned().collect();
        products.sort_by(|a, b| {
            a.name
                .as_str()
                .cmp(b.name.as_str())
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(products)
    }

    async fn update_product(
        &self,
        product_id: &ProductId,
        details: &ProductDetails,
        activity: &ActivityLogEntry,
    ) -> InventoryResult<Option<Product>> {
        let mut tables = self.lock()?;

        let Some(product) = tables.products.get_mut(product_id) else {
            return Ok(None);
        };
        product.apply_details(details.clone(), activity.created_at);
        let product = product.clone();

        tables.activity.push(activity.clone());
        Ok(Some(product))
    }

    async fn delete_product(
        &self,
        product_id: &ProductId,
        activity: &ActivityLogEntry,
    ) -> InventoryResult<()> {
        let mut tables = self.lock()?;

        if !tables.products.contains_key(product_id) {
            return Err(InventoryError::ProductNotFound);
        }
        if tables
            .transactions
            .iter()
            .any(|t| t.product_id == *product_id)
        {
            return Err(InventoryError::ProductHasTransactions);
        }

        tables.products.remove(product_id);
        tables.activity.push(activity.clone());
        Ok(())
    }
}

impl LedgerRepository for MemoryInventoryRepository {
    async fn record_movement(&self, movement: &StockMovement) -> InventoryResult<LedgerEntry> {
        let mut tables = self.lock()?;

        let product = tables
            .products
            .get(&movement.product_id)
            .ok_or(InventoryError::ProductNotFound)?;

        let plan = plan_movement(product, movement, Utc::now())?;

        let product = tables
            .products
            .get_mut(&movement.product_id)
            .ok_or(InventoryError::ProductNotFound)?;
        product.stock = plan.new_stock;
        product.updated_at = plan.transaction.created_at;
        let product = product.clone();

        tables.transactions.push(plan.transaction.clone());
        tables.activity.push(plan.activity.clone());

        Ok(LedgerEntry {
            product,
            transaction: plan.transaction,
            activity: plan.activity,
        })
    }

    async fn list_transactions(
        &self,
        direction: Option<StockDirection>,
    ) -> InventoryResult<Vec<TransactionRecord>> {
        let tables = self.lock()?;

        tables
            .transactions
            .iter()
            .rev()
            .filter(|t| direction.is_none_or(|d| t.direction == d))
            .map(|t| {
                let product = tables.products.get(&t.product_id).ok_or_else(|| {
                    InventoryError::Internal(format!("Dangling transaction {}", t.transaction_id))
                })?;
                Ok(TransactionRecord {
                    transaction: t.clone(),
                    product_name: product.name.to_string(),
                })
            })
            .collect()
    }

    async fn reconcile(&self, product_id: &ProductId) -> InventoryResult<Option<Reconciliation>> {
        let tables = self.lock()?;

        let Some(product) = tables.products.get(product_id) else {
            return Ok(None);
        };
        let (incoming_total, outgoing_total) = tables.totals(Some(product_id));

        Ok(Some(Reconciliation {
            product_id: *product_id,
            initial_stock: product.initial_stock,
            incoming_total,
            outgoing_total,
            current_stock: product.stock,
        }))
    }

    async fn summary(&self) -> InventoryResult<InventorySummary> {
        let tables = self.lock()?;
        let (incoming_total, outgoing_total) = tables.totals(None);

        Ok(InventorySummary {
            product_count: tables.products.len() as i64,
            total_stock: tables.products.values().map(|p| p.stock).sum(),
            incoming_total,
            outgoing_total,
        })
    }
}

impl ActivityLogRepository for MemoryInventoryRepository {
    async fn list_activity(
        &self,
        user_id: Option<&UserId>,
    ) -> InventoryResult<Vec<ActivityLogEntry>> {
        Ok(self
            .lock()?
            .activity
            .iter()
            .rev()
            .filter(|entry| user_id.is_none_or(|id| entry.user_id == *id))
            .cloned()
            .collect())
    }
}
