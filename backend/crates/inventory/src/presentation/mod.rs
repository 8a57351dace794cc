//! Presentation Layer
//!
//! HTTP handlers, DTOs and the router.

pub mod dto;
pub mod handlers;
pub mod router;

pub use handlers::InventoryAppState;
pub use router::{inventory_router, inventory_router_generic};
