//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::id::{ActivityId, ProductId, StockTransactionId, UserId};
use serde::{Deserialize, Serialize};

use crate::application::ProductInput;
use crate::domain::entities::{
    ActivityLogEntry, InventorySummary, LedgerEntry, Product, Reconciliation, TransactionRecord,
};
use crate::domain::value_objects::StockDirection;

// ============================================================================
// Products
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub initial_stock: i64,
    pub category: Option<String>,
    pub image: Option<String>,
}

impl CreateProductRequest {
    pub fn into_input(self) -> (ProductInput, i64) {
        (
            ProductInput {
                name: self.name,
                price: self.price,
                category: self.category,
                image: self.image,
            },
            self.initial_stock,
        )
    }
}

/// Stock is not editable here; it only moves through `/stock/*`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: String,
    pub price: i64,
    pub category: Option<String>,
    pub image: Option<String>,
}

impl From<UpdateProductRequest> for ProductInput {
    fn from(req: UpdateProductRequest) -> Self {
        Self {
            name: req.name,
            price: req.price,
            category: req.category,
            image: req.image,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub product_id: ProductId,
    pub name: String,
    pub price: i64,
    pub stock: i64,
    pub initial_stock: i64,
    pub category: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            product_id: product.product_id,
            name: product.name.to_string(),
            price: product.price.amount(),
            stock: product.stock,
            initial_stock: product.initial_stock,
            category: product.category,
            image: product.image,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
}

// ============================================================================
// Stock Ledger
// ============================================================================

/// Incoming or outgoing stock; the direction comes from the route.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub transaction_id: StockTransactionId,
    pub product_id: ProductId,
    pub product_name: String,
    pub user_id: UserId,
    pub direction: StockDirection,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl From<TransactionRecord> for TransactionResponse {
    fn from(record: TransactionRecord) -> Self {
        let t = record.transaction;
        Self {
            transaction_id: t.transaction_id,
            product_id: t.product_id,
            product_name: record.product_name,
            user_id: t.user_id,
            direction: t.direction,
            quantity: t.quantity,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryResponse {
    pub transaction: TransactionResponse,
    pub stock: i64,
    pub activity: ActivityResponse,
}

impl From<LedgerEntry> for LedgerEntryResponse {
    fn from(entry: LedgerEntry) -> Self {
        let stock = entry.product.stock;
        let product_name = entry.product.name.to_string();
        Self {
            transaction: TransactionRecord {
                transaction: entry.transaction,
                product_name,
            }
            .into(),
            stock,
            activity: entry.activity.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListResponse {
    pub transactions: Vec<TransactionResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionQuery {
    pub direction: Option<StockDirection>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResponse {
    pub product_id: ProductId,
    pub initial_stock: i64,
    pub incoming_total: i64,
    pub outgoing_total: i64,
    pub expected_stock: i64,
    pub current_stock: i64,
    pub consistent: bool,
}

impl From<Reconciliation> for ReconciliationResponse {
    fn from(r: Reconciliation) -> Self {
        Self {
            product_id: r.product_id,
            initial_stock: r.initial_stock,
            incoming_total: r.incoming_total,
            outgoing_total: r.outgoing_total,
            expected_stock: r.expected_stock(),
            current_stock: r.current_stock,
            consistent: r.is_consistent(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub product_count: i64,
    pub total_stock: i64,
    pub incoming_total: i64,
    pub outgoing_total: i64,
}

impl From<InventorySummary> for SummaryResponse {
    fn from(s: InventorySummary) -> Self {
        Self {
            product_count: s.product_count,
            total_stock: s.total_stock,
            incoming_total: s.incoming_total,
            outgoing_total: s.outgoing_total,
        }
    }
}

// ============================================================================
// Activity Log
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub activity_id: ActivityId,
    pub user_id: UserId,
    pub user_name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<ActivityLogEntry> for ActivityResponse {
    fn from(entry: ActivityLogEntry) -> Self {
        Self {
            activity_id: entry.activity_id,
            user_id: entry.user_id,
            user_name: entry.user_name,
            description: entry.description,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityListResponse {
    pub entries: Vec<ActivityResponse>,
}
