//! HTTP Handlers
//!
//! Every route runs behind the auth crate's session middleware, which places
//! the current [`Actor`] in the request extensions.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use kernel::access::Actor;
use kernel::id::ProductId;

use crate::application::{
    ActivityLogUseCase, ManageProductsUseCase, RecordStockUseCase, ViewLedgerUseCase,
};
use crate::domain::repository::InventoryStore;
use crate::domain::value_objects::StockDirection;
use crate::error::InventoryResult;
use crate::presentation::dto::{
    ActivityListResponse, CreateProductRequest, LedgerEntryResponse, ProductListResponse,
    ProductResponse, ReconciliationResponse, StockRequest, SummaryResponse,
    TransactionListResponse, TransactionQuery, UpdateProductRequest,
};

/// Shared state for inventory handlers
#[derive(Clone)]
pub struct InventoryAppState<R>
where
    R: InventoryStore,
{
    pub repo: Arc<R>,
}

impl<R> InventoryAppState<R>
where
    R: InventoryStore,
{
    pub fn new(repo: R) -> Self {
        Self {
            repo: Arc::new(repo),
        }
    }
}

// ============================================================================
// Products
// ============================================================================

/// GET /api/inventory/products
pub async fn list_products<R>(
    State(state): State<InventoryAppState<R>>,
    Extension(actor): Extension<Actor>,
) -> InventoryResult<Json<ProductListResponse>>
where
    R: InventoryStore,
{
    let products = ManageProductsUseCase::new(state.repo.clone())
        .list(&actor)
        .await?;

    Ok(Json(ProductListResponse {
        products: products.into_iter().map(ProductResponse::from).collect(),
    }))
}

/// POST /api/inventory/products
pub async fn create_product<R>(
    State(state): State<InventoryAppState<R>>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateProductRequest>,
) -> InventoryResult<impl IntoResponse>
where
    R: InventoryStore,
{
    let (input, initial_stock) = req.into_input();
    let product = ManageProductsUseCase::new(state.repo.clone())
        .create(&actor, input, initial_stock)
        .await?;

    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

/// GET /api/inventory/products/{product_id}
pub async fn get_product<R>(
    State(state): State<InventoryAppState<R>>,
    Extension(actor): Extension<Actor>,
    Path(product_id): Path<ProductId>,
) -> InventoryResult<Json<ProductResponse>>
where
    R: InventoryStore,
{
    let product = ManageProductsUseCase::new(state.repo.clone())
        .get(&actor, &product_id)
        .await?;

    Ok(Json(product.into()))
}

/// PUT /api/inventory/products/{product_id}
pub async fn update_product<R>(
    State(state): State<InventoryAppState<R>>,
    Extension(actor): Extension<Actor>,
    Path(product_id): Path<ProductId>,
    Json(req): Json<UpdateProductRequest>,
) -> InventoryResult<Json<ProductResponse>>
where
    R: InventoryStore,
{
    let product = ManageProductsUseCase::new(state.repo.clone())
        .update(&actor, &product_id, req.into())
        .await?;

    Ok(Json(product.into()))
}

/// DELETE /api/inventory/products/{product_id}
pub async fn delete_product<R>(
    State(state): State<InventoryAppState<R>>,
    Extension(actor): Extension<Actor>,
    Path(product_id): Path<ProductId>,
) -> InventoryResult<StatusCode>
where
    R: InventoryStore,
{
    ManageProductsUseCase::new(state.repo.clone())
        .delete(&actor, &product_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/inventory/products/{product_id}/reconciliation
pub async fn reconcile_product<R>(
    State(state): State<InventoryAppState<R>>,
    Extension(actor): Extension<Actor>,
    Path(product_id): Path<ProductId>,
) -> InventoryResult<Json<ReconciliationResponse>>
where
    R: InventoryStore,
{
    let reconciliation = ViewLedgerUseCase::new(state.repo.clone())
        .reconcile(&actor, &product_id)
        .await?;

    Ok(Json(reconciliation.into()))
}

// ============================================================================
// Stock Ledger
// ============================================================================

async fn record_stock<R>(
    state: InventoryAppState<R>,
    actor: Actor,
    direction: StockDirection,
    req: StockRequest,
) -> InventoryResult<(StatusCode, Json<LedgerEntryResponse>)>
where
    R: InventoryStore,
{
    let entry = RecordStockUseCase::new(state.repo.clone())
        .execute(&actor, &req.product_id, direction, req.quantity)
        .await?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// POST /api/inventory/stock/incoming
pub async fn stock_incoming<R>(
    State(state): State<InventoryAppState<R>>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<StockRequest>,
) -> InventoryResult<(StatusCode, Json<LedgerEntryResponse>)>
where
    R: InventoryStore,
{
    record_stock(state, actor, StockDirection::Incoming, req).await
}

/// POST /api/inventory/stock/outgoing
pub async fn stock_outgoing<R>(
    State(state): State<InventoryAppState<R>>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<StockRequest>,
) -> InventoryResult<(StatusCode, Json<LedgerEntryResponse>)>
where
    R: InventoryStore,
{
    record_stock(state, actor, StockDirection::Outgoing, req).await
}

/// GET /api/inventory/transactions?direction=incoming|outgoing
pub async fn list_transactions<R>(
    State(state): State<InventoryAppState<R>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<TransactionQuery>,
) -> InventoryResult<Json<TransactionListResponse>>
where
    R: InventoryStore,
{
    let records = ViewLedgerUseCase::new(state.repo.clone())
        .list_transactions(&actor, query.direction)
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: records.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/inventory/summary
pub async fn summary<R>(
    State(state): State<InventoryAppState<R>>,
    Extension(actor): Extension<Actor>,
) -> InventoryResult<Json<SummaryResponse>>
where
    R: InventoryStore,
{
    let summary = ViewLedgerUseCase::new(state.repo.clone())
        .summary(&actor)
        .await?;

    Ok(Json(summary.into()))
}

// ============================================================================
// Activity Log
// ============================================================================

/// GET /api/inventory/activity
pub async fn list_activity<R>(
    State(state): State<InventoryAppState<R>>,
    Extension(actor): Extension<Actor>,
) -> InventoryResult<Json<ActivityListResponse>>
where
    R: InventoryStore,
{
    let entries = ActivityLogUseCase::new(state.repo.clone())
        .list_all(&actor)
        .await?;

    Ok(Json(ActivityListResponse {
        entries: entries.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/inventory/activity/mine
pub async fn list_own_activity<R>(
    State(state): State<InventoryAppState<R>>,
    Extension(actor): Extension<Actor>,
) -> InventoryResult<Json<ActivityListResponse>>
where
    R: InventoryStore,
{
    let entries = ActivityLogUseCase::new(state.repo.clone())
        .list_own(&actor)
        .await?;

    Ok(Json(ActivityListResponse {
        entries: entries.into_iter().map(Into::into).collect(),
    }))
}
