//! Sign Out Use Case

use std::sync::Arc;

use crate::application::check_session::parse_session_token;
use crate::application::config::AuthConfig;
use crate::domain::repository::AuthSessionRepository;
use crate::error::AuthResult;

pub struct SignOutUseCase<S>
where
    S: AuthSessionRepository,
{
    session_repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> SignOutUseCase<S>
where
    S: AuthSessionRepository,
{
    pub fn new(session_repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            session_repo,
            config,
        }
    }

    /// Delete the session behind `session_token`. Works for pending sessions too.
    pub async fn execute(&self, session_token: &str) -> AuthResult<()> {
        let session_id = parse_session_token(session_token, &self.config.session_secret)?;
        self.session_repo.delete_session(session_id).await?;
        tracing::info!(%session_id, "Session signed out");
        Ok(())
    }
}
