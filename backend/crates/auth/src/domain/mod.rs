//! Domain Layer
//!
//! Contains entities, value objects, repository traits and role rules.

pub mod entity;
pub mod repository;
pub mod services;
pub mod value_object;

pub use entity::{
    auth::{Auth, FailureOutcome, LockoutPolicy, LoginAttempt},
    auth_session::{AuthSession, SessionStage},
    totp_enrollment::TotpEnrollment,
    user::User,
};
pub use repository::{
    AuthRepository, AuthSessionRepository, AuthStore, TotpEnrollmentRepository, UserRepository,
};
