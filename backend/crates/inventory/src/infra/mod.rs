//! Infrastructure Layer
//!
//! Repository implementations backed by PostgreSQL or process memory.

pub mod memory;
pub mod postgres;

pub use memory::MemoryInventoryRepository;
pub use postgres::PgInventoryRepository;
