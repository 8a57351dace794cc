pub mod auth;
pub mod auth_session;
pub mod totp_enrollment;
pub mod user;
