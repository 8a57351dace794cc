//! Verify Two-Factor Use Case
//!
//! Second step of a sign-in for accounts with TOTP enabled. Redeems the
//! pending session created by the password step. Wrong codes count against
//! the same lockout counter as wrong passwords.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::application::check_session::parse_session_token;
use crate::application::config::AuthConfig;
use crate::application::sign_in::{
    ClientFingerprint, EstablishedSession, establish_session, failure_error,
};
use crate::domain::entity::{auth::FailureOutcome, auth_session::SessionStage};
use crate::domain::repository::{AuthRepository, AuthSessionRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

pub struct VerifyTwoFactorUseCase<U, A, S>
where
    U: UserRepository,
    A: AuthRepository,
    S: AuthSessionRepository,
{
    user_repo: Arc<U>,
    auth_repo: Arc<A>,
    session_repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<U, A, S> VerifyTwoFactorUseCase<U, A, S>
where
    U: UserRepository,
    A: AuthRepository,
    S: AuthSessionRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        auth_repo: Arc<A>,
        session_repo: Arc<S>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            auth_repo,
            session_repo,
            config,
        }
    }

    pub async fn execute(
        &self,
        pending_token: &str,
        code: &str,
        fingerprint: &ClientFingerprint,
    ) -> AuthResult<EstablishedSession> {
        let session_id = parse_session_token(pending_token, &self.config.session_secret)?;

        let pending = self
            .session_repo
            .find_session(session_id, &fingerprint.hash)
            .await?
            .filter(|session| session.stage == SessionStage::AwaitingTwoFactor)
            .ok_or(AuthError::SessionInvalid)?;

        if pending.is_expired() {
            self.session_repo.delete_session(session_id).await?;
            return Err(AuthError::SessionInvalid);
        }

        let Some(user) = self.user_repo.find_by_id(&pending.user_id).await? else {
            self.session_repo.delete_session(session_id).await?;
            return Err(AuthError::SessionInvalid);
        };

        let auth = self
            .auth_repo
            .find_credentials(&user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credentials missing for user".to_string()))?;

        let Some(secret) = auth.active_totp_secret() else {
            self.abandon(session_id).await?;
            return Err(AuthError::SessionInvalid);
        };

        let now = Utc::now();
        let attempt = match self
            .auth_repo
            .begin_login_attempt(&user.user_id, &self.config.lockout, now)
            .await
        {
            Ok(attempt) => attempt,
            Err(e @ AuthError::AccountLocked { .. }) => {
                self.abandon(session_id).await?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        if !secret.verify(code, user.user_name.as_str())? {
            let outcome = attempt.failure_outcome(&self.config.lockout, now);
            if matches!(outcome, FailureOutcome::Locked { .. }) {
                self.abandon(session_id).await?;
                return Err(failure_error(&user, outcome, now));
            }
            tracing::warn!(user_id = %user.user_id, "Invalid second-factor code");
            return Err(AuthError::InvalidTwoFactorCode);
        }

        if let Err(e) = self
            .auth_repo
            .complete_login_attempt(&user.user_id, &attempt, now)
            .await
        {
            if matches!(e, AuthError::AccountLocked { .. }) {
                self.abandon(session_id).await?;
            }
            return Err(e);
        }

        self.session_repo.delete_session(session_id).await?;

        establish_session(
            self.user_repo.as_ref(),
            self.session_repo.as_ref(),
            &self.config,
            &user,
            fingerprint,
        )
        .await
    }

    /// Drop the pending session; the caller has to start over with a password.
    async fn abandon(&self, session_id: Uuid) -> AuthResult<()> {
        tracing::info!(%session_id, "Discarding pending second-factor session");
        self.session_repo.delete_session(session_id).await
    }
}
