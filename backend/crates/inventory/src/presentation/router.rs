//! Inventory Router
//!
//! Handlers expect an [`kernel::access::Actor`] extension. Mount the router
//! behind `auth::middleware::require_actor`.

use axum::{
    Router,
    routing::{get, post},
};

use crate::domain::repository::InventoryStore;
use crate::infra::postgres::PgInventoryRepository;
use crate::presentation::handlers::{self, InventoryAppState};

/// Create the Inventory router with PostgreSQL repository
pub fn inventory_router(repo: PgInventoryRepository) -> Router {
    inventory_router_generic(repo)
}

/// Create a generic Inventory router for any repository implementation
pub fn inventory_router_generic<R>(repo: R) -> Router
where
    R: InventoryStore,
{
    let state = InventoryAppState::new(repo);

    Router::new()
        .route(
            "/products",
            get(handlers::list_products::<R>).post(handlers::create_product::<R>),
        )
        .route(
            "/products/{product_id}",
            get(handlers::get_product::<R>)
                .put(handlers::update_product::<R>)
                .delete(handlers::delete_product::<R>),
        )
        .route(
            "/products/{product_id}/reconciliation",
            get(handlers::reconcile_product::<R>),
        )
        .route("/stock/incoming", post(handlers::stock_incoming::<R>))
        .route("/stock/outgoing", post(handlers::stock_outgoing::<R>))
        .route("/transactions", get(handlers::list_transactions::<R>))
        .route("/summary", get(handlers::summary::<R>))
        .route("/activity", get(handlers::list_activity::<R>))
        .route("/activity/mine", get(handlers::list_own_activity::<R>))
        .with_state(state)
}
