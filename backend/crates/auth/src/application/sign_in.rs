//! Sign In Use Case
//!
//! Password step of authentication. Enforces the temporary lockout, and
//! either opens a full session or, when the second factor is enabled, a
//! short-lived pending one that only the OTP step can redeem.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::domain::entity::{
    auth::FailureOutcome,
    auth_session::{AuthSession, SessionStage},
    user::User,
};
use crate::domain::repository::{AuthRepository, AuthSessionRepository, UserRepository};
use crate::domain::value_object::{
    UserId, user_name::UserName, user_password::RawPassword, user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

pub use platform::client::ClientFingerprint;

pub struct SignInInput {
    pub user_name: String,
    pub password: String,
}

/// A fully authenticated session, ready to be handed to the client.
#[derive(Debug, Clone)]
pub struct EstablishedSession {
    pub session_token: String,
    pub user_id: UserId,
    pub user_name: String,
    pub user_role: UserRole,
    pub expires_at_ms: i64,
}

#[derive(Debug, Clone)]
pub enum AuthOutcome {
    Authenticated(EstablishedSession),
    /// Password accepted; the one-time code must be verified with `pending_token`.
    PendingTwoFactor {
        pending_token: String,
        user_id: UserId,
        expires_at_ms: i64,
    },
}

pub struct SignInUseCase<U, A, S>
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

impl<U, A, S> SignInUseCase<U, A, S>
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
        input: SignInInput,
        fingerprint: &ClientFingerprint,
    ) -> AuthResult<AuthOutcome> {
        // A name that could never have been registered cannot match anyone.
        let user_name =
            UserName::new(&input.user_name).map_err(|_| AuthError::InvalidCredentials)?;
        let raw_password = RawPassword::for_sign_in(input.password)?;

        let user = self
            .user_repo
            .find_by_user_name(&user_name)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let auth = self
            .auth_repo
            .find_credentials(&user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credentials missing for user".to_string()))?;

        // The attempt is charged before the password is checked. While locked
        // the password is not even looked at.
        let now = Utc::now();
        let attempt = self
            .auth_repo
            .begin_login_attempt(&user.user_id, &self.config.lockout, now)
            .await
            .inspect_err(|e| {
                if matches!(e, AuthError::AccountLocked { .. }) {
                    tracing::warn!(user_id = %user.user_id, "Sign-in attempt while locked");
                }
            })?;

        if !auth.password_hash.verify(&raw_password, self.config.pepper()) {
            let outcome = attempt.failure_outcome(&self.config.lockout, now);
            return Err(failure_error(&user, outcome, now));
        }

        self.auth_repo
            .complete_login_attempt(&user.user_id, &attempt, now)
            .await?;

        if auth.requires_2fa() {
            let pending = AuthSession::new(
                user.user_id,
                SessionStage::AwaitingTwoFactor,
                fingerprint,
                self.config.pending_two_factor_ttl,
            );
            self.session_repo.create_session(&pending).await?;

            tracing::info!(user_id = %user.user_id, "Password accepted, awaiting second factor");

            return Ok(AuthOutcome::PendingTwoFactor {
                pending_token: pending.token(&self.config.session_secret),
                user_id: user.user_id,
                expires_at_ms: pending.expires_at_ms,
            });
        }

        let established = establish_session(
            self.user_repo.as_ref(),
            self.session_repo.as_ref(),
            &self.config,
            &user,
            fingerprint,
        )
        .await?;

        Ok(AuthOutcome::Authenticated(established))
    }
}

/// Map a recorded failure to the error the caller sees.
pub(crate) fn failure_error(
    user: &User,
    outcome: FailureOutcome,
    now: chrono::DateTime<Utc>,
) -> AuthError {
    match outcome {
        FailureOutcome::Locked { locked_until } => {
            tracing::warn!(
                user_id = %user.user_id,
                %locked_until,
                "Account locked after repeated failures"
            );
            AuthError::locked(locked_until - now)
        }
        FailureOutcome::Counted { failed_count } => {
            tracing::warn!(user_id = %user.user_id, failed_count, "Failed sign-in attempt");
            AuthError::InvalidCredentials
        }
    }
}

/// Open a full session for `user` and stamp the login time.
pub(crate) async fn establish_session<U, S>(
    user_repo: &U,
    session_repo: &S,
    config: &AuthConfig,
    user: &User,
    fingerprint: &ClientFingerprint,
) -> AuthResult<EstablishedSession>
where
    U: UserRepository,
    S: AuthSessionRepository,
{
    let session = AuthSession::new(
        user.user_id,
        SessionStage::Authenticated,
        fingerprint,
        config.session_ttl,
    );
    session_repo.create_session(&session).await?;
    user_repo.record_login(&user.user_id, session.created_at).await?;

    tracing::info!(
        user_id = %user.user_id,
        session_id = %session.session_id,
        user_role = %user.user_role,
        "User signed in"
    );

    Ok(EstablishedSession {
        session_token: session.token(&config.session_secret),
        user_id: user.user_id,
        user_name: user.user_name.to_string(),
        user_role: user.user_role,
        expires_at_ms: session.expires_at_ms,
    })
}
