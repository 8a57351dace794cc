//! Application Layer - Use Cases
//!
//! Every use case takes the authenticated [`kernel::access::Actor`] and checks
//! its permission before touching the store.

pub mod activity;
pub mod manage_products;
pub mod record_stock;
pub mod view_ledger;

pub use activity::ActivityLogUseCase;
pub use manage_products::{ManageProductsUseCase, ProductInput};
pub use record_stock::RecordStockUseCase;
pub use view_ledger::ViewLedgerUseCase;
