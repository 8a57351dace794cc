//! Auth Error Types
//!
//! Auth-specific error variants that render through the unified
//! `kernel::error::AppError` problem-details response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::access::AccessDenied;
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::services::RoleChangeDenied;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("User name already exists")]
    UserNameTaken,

    #[error("Invalid user name: {0}")]
    UserNameValidation(String),

    #[error("Password validation failed: {0}")]
    PasswordValidation(String),

    /// Unknown user or wrong password. The two are deliberately indistinguishable.
    #[error("Invalid user name or password")]
    InvalidCredentials,

    #[error(
        "Account is temporarily locked, try again in {} minute(s)",
        .retry_after_secs.div_ceil(60)
    )]
    AccountLocked { retry_after_secs: u64 },

    #[error("Session not found or expired")]
    SessionInvalid,

    #[error("Invalid two-factor authentication code")]
    InvalidTwoFactorCode,

    #[error("Two-factor authentication is already enabled")]
    TwoFactorAlreadyEnabled,

    #[error("No two-factor enrollment is pending")]
    EnrollmentNotPending,

    #[error("You do not have permission to perform this action")]
    Forbidden(#[from] AccessDenied),

    #[error("{0}")]
    RoleChangeForbidden(RoleChangeDenied),

    #[error("The user's role was changed concurrently")]
    RoleConflict,

    #[error("Missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Lock error for the time left on a lock, rounded up to whole seconds.
    pub fn locked(remaining: chrono::Duration) -> Self {
        let millis = remaining.num_milliseconds().max(1) as u64;
        AuthError::AccountLocked {
            retry_after_secs: millis.div_ceil(1000),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::UserNameTaken
            | AuthError::TwoFactorAlreadyEnabled
            | AuthError::EnrollmentNotPending
            | AuthError::RoleConflict => ErrorKind::Conflict,
            AuthError::UserNameValidation(_)
            | AuthError::PasswordValidation(_)
            | AuthError::MissingHeader(_) => ErrorKind::BadRequest,
            AuthError::InvalidCredentials
            | AuthError::SessionInvalid
            | AuthError::InvalidTwoFactorCode => ErrorKind::Unauthorized,
            AuthError::AccountLocked { .. } => ErrorKind::Locked,
            AuthError::Forbidden(_) | AuthError::RoleChangeForbidden(_) => ErrorKind::Forbidden,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            // Never leak store details to the client
            AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::internal("An internal error occurred")
            }
            AuthError::AccountLocked { retry_after_secs } => {
                AppError::new(self.kind(), self.to_string())
                    .with_action("Wait for the lock to expire, then sign in again")
                    .with_retry_after(*retry_after_secs)
            }
            AuthError::SessionInvalid => {
                AppError::new(self.kind(), self.to_string()).with_action("Please sign in")
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::InvalidTwoFactorCode => {
                tracing::warn!("Invalid two-factor code");
            }
            AuthError::AccountLocked { retry_after_secs } => {
                tracing::warn!(retry_after_secs, "Access attempt on locked account");
            }
            AuthError::Forbidden(denied) => {
                tracing::warn!(
                    role = %denied.role,
                    permission = %denied.permission,
                    "Access denied"
                );
            }
            AuthError::RoleChangeForbidden(reason) => {
                tracing::warn!(reason = %reason, "Role change refused");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<platform::client::FingerprintError> for AuthError {
    fn from(err: platform::client::FingerprintError) -> Self {
        match err {
            platform::client::FingerprintError::MissingHeader(header) => {
                AuthError::MissingHeader(header)
            }
        }
    }
}

impl From<RoleChangeDenied> for AuthError {
    fn from(reason: RoleChangeDenied) -> Self {
        AuthError::RoleChangeForbidden(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_rounds_up() {
        let err = AuthError::locked(chrono::Duration::milliseconds(90_500));
        assert!(matches!(
            err,
            AuthError::AccountLocked {
                retry_after_secs: 91
            }
        ));
        assert_eq!(
            err.to_string(),
            "Account is temporarily locked, try again in 2 minute(s)"
        );
        assert_eq!(err.status_code(), StatusCode::LOCKED);
        assert_eq!(err.to_app_error().retry_after(), Some(91));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::UserNameTaken.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::RoleChangeForbidden(RoleChangeDenied::SelfDemotion).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::EnrollmentNotPending.status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AuthError::Internal("connection string leaked".to_string());
        assert_eq!(err.to_app_error().message(), "An internal error occurred");
    }
}
