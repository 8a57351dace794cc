//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of domain vocabulary:
//! - Common error types and result aliases
//! - Typed entity IDs
//! - Roles, permissions and the authenticated [`access::Actor`]
//!
//! Only things that mean the same in every domain belong here.

pub mod access;
pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
