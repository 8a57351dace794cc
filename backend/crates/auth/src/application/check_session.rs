//! Check Session Use Case
//!
//! Resolves a session cookie into the current [`Actor`]. The role is read
//! from the identity record on every call, so role changes apply at once.

use std::sync::Arc;

use chrono::Utc;
use kernel::access::Actor;
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::entity::{auth_session::AuthSession, user::User};
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

pub struct CheckSessionUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<U, S> CheckSessionUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
        }
    }

    /// Load a fully authenticated session and its user.
    ///
    /// Pending second-factor sessions are rejected like missing ones.
    pub async fn resolve(
        &self,
        session_token: &str,
        fingerprint_hash: &[u8],
    ) -> AuthResult<(AuthSession, User)> {
        let session_id = parse_session_token(session_token, &self.config.session_secret)?;

        let session = self
            .session_repo
            .find_session(session_id, fingerprint_hash)
            .await?
            .filter(AuthSession::is_authenticated)
            .ok_or(AuthError::SessionInvalid)?;

        if session.is_expired() {
            self.session_repo.delete_session(session_id).await?;
            return Err(AuthError::SessionInvalid);
        }

        let Some(user) = self.user_repo.find_by_id(&session.user_id).await? else {
            self.session_repo.delete_session(session_id).await?;
            return Err(AuthError::SessionInvalid);
        };

        self.session_repo
            .touch_session(session_id, Utc::now())
            .await?;

        Ok((session, user))
    }

    pub async fn actor(&self, session_token: &str, fingerprint_hash: &[u8]) -> AuthResult<Actor> {
        let (_, user) = self.resolve(session_token, fingerprint_hash).await?;
        Ok(user.to_actor())
    }
}

/// Verify the token signature and extract the session id.
pub(crate) fn parse_session_token(token: &str, secret: &[u8; 32]) -> AuthResult<Uuid> {
    platform::crypto::verify_signed_token(token, secret)
        .and_then(|id| id.parse().ok())
        .ok_or(AuthError::SessionInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_token() {
        let secret = [9u8; 32];
        let id = Uuid::new_v4();
        let token = platform::crypto::sign_token(&id.to_string(), &secret);

        assert_eq!(parse_session_token(&token, &secret).unwrap(), id);
        assert!(matches!(
            parse_session_token(&token, &[1u8; 32]),
            Err(AuthError::SessionInvalid)
        ));
        let not_uuid = platform::crypto::sign_token("abc", &secret);
        assert!(parse_session_token(&not_uuid, &secret).is_err());
    }
}
