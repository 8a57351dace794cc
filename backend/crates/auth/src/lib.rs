//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - PostgreSQL and in-memory implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Sign-up with the bootstrap role rule (first `superadmin`, second `staf`,
//!   everyone after that `pending`)
//! - Sign-in with user name + password and a temporary lockout
//! - Optional TOTP second factor (Google Authenticator compatible)
//! - Server-side sessions with signed cookie tokens
//! - Role management for admins
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - Sessions bound to client fingerprint (User-Agent)
//! - Password and one-time code failures share one lockout counter

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::{memory::MemoryAuthRepository, postgres::PgAuthRepository};
pub use presentation::router::{auth_router, auth_router_generic, auth_router_with_state};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
