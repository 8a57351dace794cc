//! Inventory Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, ledger rules, repository traits
//! - `application/` - Use cases
//! - `infra/` - PostgreSQL and in-memory implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Product catalogue (admin maintained, readable by every role)
//! - Incoming/outgoing stock ledger: stock, transaction row and activity
//!   entry are written in one atomic unit, and stock never goes negative
//! - Per-product reconciliation of stock against the ledger
//! - Dashboard summary and activity log

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use error::{InventoryError, InventoryResult};
pub use infra::{memory::MemoryInventoryRepository, postgres::PgInventoryRepository};
pub use presentation::router::{inventory_router, inventory_router_generic};

pub mod models {
    pub use crate::domain::entities::*;
    pub use crate::domain::value_objects::*;
    pub use crate::presentation::dto::*;
}
