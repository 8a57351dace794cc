//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use kernel::id::{ActivityId, ProductId, StockTransactionId, UserId};

use crate::domain::entities::{
    ActivityLogEntry, InventorySummary, LedgerEntry, Product, ProductDetails, Reconciliation,
    StockMovement, StockTransaction, TransactionRecord,
};
use crate::domain::repository::{ActivityLogRepository, LedgerRepository, ProductRepository};
use crate::domain::services::plan_movement;
use crate::domain::value_objects::{Price, ProductName, StockDirection};
use crate::error::{InventoryError, InventoryResult};

const PRODUCT_COLUMNS: &str = r#"
    product_id,
    product_name,
    price,
    stock,
    initial_stock,
    category,
    image,
    created_at,
    updated_at
"#;

/// PostgreSQL-backed inventory repository
#[derive(Clone)]
pub struct PgInventoryRepository {
    pool: PgPool,
}

impl PgInventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_activity(
    tx: &mut Transaction<'_, Postgres>,
    activity: &ActivityLogEntry,
) -> InventoryResult<()> {
    sqlx::query(
        r#"
        INSERT INTO activity_log (
            activity_id,
            user_id,
            user_name,
            description,
            created_at
        ) VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(activity.activity_id.as_uuid())
    .bind(activity.user_id.as_uuid())
    .bind(&activity.user_name)
    .bind(&activity.description)
    .bind(activity.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// ============================================================================
// Product Repository Implementation
// ============================================================================

impl ProductRepository for PgInventoryRepository {
    async fn create_product(
        &self,
        product: &Product,
        activity: &ActivityLogEntry,
    ) -> InventoryResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                product_id,
                product_name,
                price,
                stock,
                initial_stock,
                category,
                image,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(product.product_id.as_uuid())
        .bind(product.name.as_str())
        .bind(product.price.amount())
        .bind(product.stock)
        .bind(product.initial_stock)
        .bind(&product.category)
        .bind(&product.image)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_activity(&mut tx, activity).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_product(&self, product_id: &ProductId) -> InventoryResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = $1"
        ))
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProductRow::into_product))
    }

    async fn list_products(&self) -> InventoryResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY product_name, created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductRow::into_product).collect())
    }

    async fn update_product(
        &self,
        product_id: &ProductId,
        details: &ProductDetails,
        activity: &ActivityLogEntry,
    ) -> InventoryResult<Option<Product>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products SET
                product_name = $2,
                price = $3,
                category = $4,
                image = $5,
                updated_at = $6
            WHERE product_id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product_id.as_uuid())
        .bind(details.name.as_str())
        .bind(details.price.amount())
        .bind(&details.category)
        .bind(&details.image)
        .bind(activity.created_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        insert_activity(&mut tx, activity).await?;

        tx.commit().await?;
        Ok(Some(row.into_product()))
    }

    async fn delete_product(
        &self,
        product_id: &ProductId,
        activity: &ActivityLogEntry,
    ) -> InventoryResult<()> {
        let mut tx = self.pool.begin().await?;

        // Row lock keeps a concurrent movement from slipping in before the delete.
        let exists = sqlx::query_scalar::<_, Uuid>(
            "SELECT product_id FROM products WHERE product_id = $1 FOR UPDATE",
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        if exists.is_none() {
            return Err(InventoryError::ProductNotFound);
        }

        let referenced = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM stock_transactions WHERE product_id = $1)",
        )
        .bind(product_id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;

        if referenced {
            return Err(InventoryError::ProductHasTransactions);
        }

        sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(product_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        insert_activity(&mut tx, activity).await?;

        tx.commit().await?;
        Ok(())
    }
}

// ============================================================================
// Ledger Repository Implementation
// ============================================================================

impl LedgerRepository for PgInventoryRepository {
    async fn record_movement(&self, movement: &StockMovement) -> InventoryResult<LedgerEntry> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = $1 FOR UPDATE"
        ))
        .bind(movement.product_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(InventoryError::ProductNotFound)?;

        let mut product = row.into_product();
        let plan = plan_movement(&product, movement, Utc::now())?;

        sqlx::query("UPDATE products SET stock = $2, updated_at = $3 WHERE product_id = $1")
            .bind(product.product_id.as_uuid())
            .bind(plan.new_stock)
            .bind(plan.transaction.created_at)
            .execute(&mut *tx)
            .await?;

        let quantity = i32::try_from(plan.transaction.quantity)
            .map_err(|_| InventoryError::InvalidQuantity)?;

        sqlx::query(
            r#"
            INSERT INTO stock_transactions (
                transaction_id,
                product_id,
                user_id,
                direction,
                quantity,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(plan.transaction.transaction_id.as_uuid())
        .bind(plan.transaction.product_id.as_uuid())
        .bind(plan.transaction.user_id.as_uuid())
        .bind(plan.transaction.direction.id())
        .bind(quantity)
        .bind(plan.transaction.created_at)
        .execute(&mut *tx)
        .await?;

        insert_activity(&mut tx, &plan.activity).await?;

        tx.commit().await?;

        product.stock = plan.new_stock;
        product.updated_at = plan.transaction.created_at;

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
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT
                t.transaction_id,
                t.product_id,
                t.user_id,
                t.direction,
                t.quantity,
                t.created_at,
                p.product_name
            FROM stock_transactions t
            JOIN products p ON p.product_id = t.product_id
            WHERE $1::SMALLINT IS NULL OR t.direction = $1
            ORDER BY t.created_at DESC, t.transaction_id
            "#,
        )
        .bind(direction.map(|d| d.id()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TransactionRow::into_record).collect()
    }

    async fn reconcile(&self, product_id: &ProductId) -> InventoryResult<Option<Reconciliation>> {
        let row = sqlx::query_as::<_, ReconciliationRow>(
            r#"
            SELECT
                p.initial_stock,
                p.stock,
                COALESCE(SUM(t.quantity) FILTER (WHERE t.direction = 0), 0)::BIGINT
                    AS incoming_total,
                COALESCE(SUM(t.quantity) FILTER (WHERE t.direction = 1), 0)::BIGINT
                    AS outgoing_total
            FROM products p
            LEFT JOIN stock_transactions t ON t.product_id = p.product_id
            WHERE p.product_id = $1
            GROUP BY p.product_id
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Reconciliation {
            product_id: *product_id,
            initial_stock: row.initial_stock,
            incoming_total: row.incoming_total,
            outgoing_total: row.outgoing_total,
            current_stock: row.stock,
        }))
    }

    async fn summary(&self) -> InventoryResult<InventorySummary> {
        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products) AS product_count,
                (SELECT COALESCE(SUM(stock), 0)::BIGINT FROM products) AS total_stock,
                (SELECT COALESCE(SUM(quantity), 0)::BIGINT
                    FROM stock_transactions WHERE direction = 0) AS incoming_total,
                (SELECT COALESCE(SUM(quantity), 0)::BIGINT
                    FROM stock_transactions WHERE direction = 1) AS outgoing_total
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(InventorySummary {
            product_count: row.product_count,
            total_stock: row.total_stock,
            incoming_total: row.incoming_total,
            outgoing_total: row.outgoing_total,
        })
    }
}

// ============================================================================
// Activity Log Repository Implementation
// ============================================================================

impl ActivityLogRepository for PgInventoryRepository {
    async fn list_activity(
        &self,
        user_id: Option<&UserId>,
    ) -> InventoryResult<Vec<ActivityLogEntry>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT
                activity_id,
                user_id,
                user_name,
                description,
                created_at
            FROM activity_log
            WHERE $1::UUID IS NULL OR user_id = $1
            ORDER BY created_at DESC, activity_id
            "#,
        )
        .bind(user_id.map(UserId::as_uuid))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ActivityRow::into_entry).collect())
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct ProductRow {
    product_id: Uuid,
    product_name: String,
    price: i64,
    stock: i64,
    initial_stock: i64,
    category: Option<String>,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self) -> Product {
        Product {
            product_id: ProductId::from_uuid(self.product_id),
            name: ProductName::from_db(self.product_name),
            price: Price::from_db(self.price),
            stock: self.stock,
            initial_stock: self.initial_stock,
            category: self.category,
            image: self.image,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    transaction_id: Uuid,
    product_id: Uuid,
    user_id: Uuid,
    direction: i16,
    quantity: i32,
    created_at: DateTime<Utc>,
    product_name: String,
}

impl TransactionRow {
    fn into_record(self) -> InventoryResult<TransactionRecord> {
        let direction = StockDirection::from_id(self.direction).ok_or_else(|| {
            InventoryError::Internal(format!("Invalid direction: {}", self.direction))
        })?;

        Ok(TransactionRecord {
            transaction: StockTransaction {
                transaction_id: StockTransactionId::from_uuid(self.transaction_id),
                product_id: ProductId::from_uuid(self.product_id),
                user_id: UserId::from_uuid(self.user_id),
                direction,
                quantity: i64::from(self.quantity),
                created_at: self.created_at,
            },
            product_name: self.product_name,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReconciliationRow {
    initial_stock: i64,
    stock: i64,
    incoming_total: i64,
    outgoing_total: i64,
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    product_count: i64,
    total_stock: i64,
    incoming_total: i64,
    outgoing_total: i64,
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    activity_id: Uuid,
    user_id: Uuid,
    user_name: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl ActivityRow {
    fn into_entry(self) -> ActivityLogEntry {
        ActivityLogEntry {
            activity_id: ActivityId::from_uuid(self.activity_id),
            user_id: UserId::from_uuid(self.user_id),
            user_name: self.user_name,
            description: self.description,
            created_at: self.created_at,
        }
    }
}
