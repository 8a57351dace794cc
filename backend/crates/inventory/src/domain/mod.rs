//! Domain Layer
//!
//! Entities, value objects, ledger rules and repository traits.

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
