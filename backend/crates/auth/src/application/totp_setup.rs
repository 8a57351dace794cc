//! TOTP Setup Use Case
//!
//! Two-step enrollment: `begin` generates a secret and parks it as pending,
//! `confirm` commits it once the user proves their authenticator produces a
//! valid code. Wrong confirmation codes do not touch the lockout counter.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::AuthConfig;
use crate::domain::entity::totp_enrollment::TotpEnrollment;
use crate::domain::repository::{AuthRepository, TotpEnrollmentRepository, UserRepository};
use crate::domain::value_object::{UserId, totp_secret::TotpSecret};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone)]
pub struct TotpSetupOutput {
    pub secret: TotpSecret,
    /// Label used in the provisioning URI (the user name)
    pub account_name: String,
    pub otpauth_url: String,
    pub expires_at: DateTime<Utc>,
}

pub struct TotpSetupUseCase<U, A, E>
where
    U: UserRepository,
    A: AuthRepository,
    E: TotpEnrollmentRepository,
{
    user_repo: Arc<U>,
    auth_repo: Arc<A>,
    enrollment_repo: Arc<E>,
    config: Arc<AuthConfig>,
}

impl<U, A, E> TotpSetupUseCase<U, A, E>
where
    U: UserRepository,
    A: AuthRepository,
    E: TotpEnrollmentRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        auth_repo: Arc<A>,
        enrollment_repo: Arc<E>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            auth_repo,
            enrollment_repo,
            config,
        }
    }

    /// Generate a fresh secret. Calling again replaces the pending one.
    pub async fn begin(&self, user_id: &UserId) -> AuthResult<TotpSetupOutput> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        let auth = self
            .auth_repo
            .find_credentials(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if auth.totp_enabled {
            return Err(AuthError::TwoFactorAlreadyEnabled);
        }

        let enrollment = TotpEnrollment::new(
            *user_id,
            TotpSecret::generate(),
            self.config.totp_enrollment_ttl,
        );
        let account_name = user.user_name.to_string();
        let otpauth_url = enrollment.secret.otpauth_url(&account_name)?;

        self.enrollment_repo.save_enrollment(&enrollment).await?;

        tracing::info!(user_id = %user_id, "TOTP enrollment started");

        Ok(TotpSetupOutput {
            secret: enrollment.secret,
            account_name,
            otpauth_url,
            expires_at: enrollment.expires_at,
        })
    }

    /// Verify `code` against the pending secret and enable the second factor.
    ///
    /// A wrong code keeps the enrollment pending so the user can retry.
    pub async fn confirm(&self, user_id: &UserId, code: &str) -> AuthResult<()> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        let auth = self
            .auth_repo
            .find_credentials(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if auth.totp_enabled {
            return Err(AuthError::TwoFactorAlreadyEnabled);
        }

        let now = Utc::now();
        let enrollment = self
            .enrollment_repo
            .find_enrollment(user_id)
            .await?
            .filter(|enrollment| !enrollment.is_expired(now))
            .ok_or(AuthError::EnrollmentNotPending)?;

        if !enrollment.secret.verify(code, user.user_name.as_str())? {
            tracing::debug!(user_id = %user_id, "Enrollment code rejected");
            return Err(AuthError::InvalidTwoFactorCode);
        }

        self.enrollment_repo
            .confirm_enrollment(&enrollment, now)
            .await?;

        tracing::info!(user_id = %user_id, "TOTP enabled");
        Ok(())
    }
}
