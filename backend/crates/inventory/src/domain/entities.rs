//! Domain Entities
//!
//! Core business entities for the inventory domain.

use chrono::{DateTime, Utc};
use kernel::access::Actor;
use kernel::id::{ActivityId, ProductId, StockTransactionId, UserId};

use crate::domain::value_objects::{
    MAX_CATEGORY_LENGTH, MAX_IMAGE_LENGTH, Price, ProductName, Quantity, StockDirection,
    optional_text,
};
use crate::error::InventoryResult;

/// Editable attributes of a product. Stock is deliberately absent: it only
/// moves through the ledger.
#[derive(Debug, Clone)]
pub struct ProductDetails {
    pub name: ProductName,
    pub price: Price,
    pub category: Option<String>,
    pub image: Option<String>,
}

impl ProductDetails {
    pub fn new(
        name: &str,
        price: i64,
        category: Option<String>,
        image: Option<String>,
    ) -> InventoryResult<Self> {
        Ok(Self {
            name: ProductName::new(name)?,
            price: Price::new(price)?,
            category: optional_text(category, MAX_CATEGORY_LENGTH, "Category")?,
            image: optional_text(image, MAX_IMAGE_LENGTH, "Image reference")?,
        })
    }
}

/// Product entity
#[derive(Debug, Clone)]
pub struct Product {
    pub product_id: ProductId,
    pub name: ProductName,
    pub price: Price,
    pub stock: i64,
    /// Stock at creation; the base of the ledger reconciliation
    pub initial_stock: i64,
    pub category: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(details: ProductDetails, initial_stock: i64) -> Self {
        let now = Utc::now();
        Self {
            product_id: ProductId::new(),
            name: details.name,
            price: details.price,
            stock: initial_stock,
            initial_stock,
            category: details.category,
            image: details.image,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_details(&mut self, details: ProductDetails, now: DateTime<Utc>) {
        self.name = details.name;
        self.price = details.price;
        self.category = details.category;
        self.image = details.image;
        self.updated_at = now;
    }
}

/// A requested ledger operation, before it is checked against current stock.
#[derive(Debug, Clone)]
pub struct StockMovement {
    pub product_id: ProductId,
    pub direction: StockDirection,
    pub quantity: Quantity,
    pub actor: Actor,
}

/// Immutable ledger row
#[derive(Debug, Clone)]
pub struct StockTransaction {
    pub transaction_id: StockTransactionId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub direction: StockDirection,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

/// Audit trail entry. The actor's name is captured at write time.
#[derive(Debug, Clone)]
pub struct ActivityLogEntry {
    pub activity_id: ActivityId,
    pub user_id: UserId,
    pub user_name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityLogEntry {
    pub fn new(actor: &Actor, description: String, at: DateTime<Utc>) -> Self {
        Self {
            activity_id: ActivityId::new(),
            user_id: actor.user_id,
            user_name: actor.user_name.clone(),
            description,
            created_at: at,
        }
    }
}

/// Everything one ledger operation writes, committed together.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    /// Product as it is after the movement
    pub product: Product,
    pub transaction: StockTransaction,
    pub activity: ActivityLogEntry,
}

/// Ledger row joined with its product name, for listings.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub transaction: StockTransaction,
    pub product_name: String,
}

/// Stock of one product checked against its ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub product_id: ProductId,
    pub initial_stock: i64,
    pub incoming_total: i64,
    pub outgoing_total: i64,
    pub current_stock: i64,
}

impl Reconciliation {
    pub fn expected_stock(&self) -> i64 {
        self.initial_stock + self.incoming_total - self.outgoing_total
    }

    pub fn is_consistent(&self) -> bool {
        self.expected_stock() == self.current_stock
    }
}

/// Dashboard figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InventorySummary {
    pub product_count: i64,
    pub total_stock: i64,
    pub incoming_total: i64,
    pub outgoing_total: i64,
}
