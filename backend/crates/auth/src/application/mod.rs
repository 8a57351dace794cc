//! Application Layer
//!
//! Use cases and application services.

pub mod check_session;
pub mod config;
pub mod manage_roles;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod totp_setup;
pub mod verify_two_factor;

pub use check_session::CheckSessionUseCase;
pub use config::AuthConfig;
pub use manage_roles::{ManageRolesUseCase, SetRoleOutput};
pub use sign_in::{
    AuthOutcome, ClientFingerprint, EstablishedSession, SignInInput, SignInUseCase,
};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SeedOutcome, SignUpInput, SignUpOutput, SignUpUseCase};
pub use totp_setup::{TotpSetupOutput, TotpSetupUseCase};
pub use verify_two_factor::VerifyTwoFactorUseCase;
