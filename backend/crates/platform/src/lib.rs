//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no domain knowledge:
//! - Cryptographic utilities (SHA-256, HMAC-signed tokens)
//! - Password hashing (Argon2id with optional pepper)
//! - Cookie building and parsing
//! - Client fingerprinting for session binding

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod password;
