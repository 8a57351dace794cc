//! Value Object Module

pub mod totp_secret;
pub mod user_name;
pub mod user_password;
pub mod user_role;

pub use kernel::id::UserId;
