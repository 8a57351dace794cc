//! In-memory repository
//!
//! Every table sits behind one mutex, so each trait method is atomic just
//! like its single-transaction PostgreSQL counterpart. Used by tests and
//! for running the API without a database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entity::{
    auth::{Auth, LockoutPolicy, LoginAttempt},
    auth_session::{AuthSession, SessionStage},
    totp_enrollment::TotpEnrollment,
    user::User,
};
use crate::domain::repository::{
    AuthRepository, AuthSessionRepository, TotpEnrollmentRepository, UserRepository,
};
use crate::domain::value_object::{
    UserId,
    user_name::UserName,
    user_role::{RoleAssignment, UserRole},
};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct AuthTables {
    users: HashMap<UserId, User>,
    credentials: HashMap<UserId, Auth>,
    enrollments: HashMap<UserId, TotpEnrollment>,
    sessions: HashMap<Uuid, AuthSession>,
}

#[derive(Clone, Default)]
pub struct MemoryAuthRepository {
    tables: Arc<Mutex<AuthTables>>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AuthResult<MutexGuard<'_, AuthTables>> {
        self.tables
            .lock()
            .map_err(|_| AuthError::Internal("Auth store lock poisoned".to_string()))
    }
}

impl UserRepository for MemoryAuthRepository {
    async fn register(
        &self,
        user: &User,
        auth: &Auth,
        assignment: RoleAssignment,
    ) -> AuthResult<UserRole> {
        let mut tables = self.lock()?;

        if tables
            .users
            .values()
            .any(|existing| existing.user_name == user.user_name)
        {
            return Err(AuthError::UserNameTaken);
        }

        let user_role = assignment.resolve(tables.users.len() as i64);
        let mut user = user.clone();
        user.user_role = user_role;

        tables.users.insert(user.user_id, user);
        tables.credentials.insert(auth.user_id, auth.clone());

        Ok(user_role)
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.lock()?.users.get(user_id).cloned())
    }

    async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|user| &user.user_name == user_name)
            .cloned())
    }

    async fn list_users(&self) -> AuthResult<Vec<User>> {
        let mut users: Vec<User> = self.lock()?.users.values().cloned().collect();
        users.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.user_name.as_str().cmp(b.user_name.as_str()))
        });
        Ok(users)
    }

    async fn record_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()> {
        if let Some(user) = self.lock()?.users.get_mut(user_id) {
            user.last_login_at = Some(at);
            user.updated_at = at;
        }
        Ok(())
    }

    async fn update_role(
        &self,
        user_id: &UserId,
        expected: UserRole,
        new_role: UserRole,
    ) -> AuthResult<bool> {
        let mut tables = self.lock()?;
        match tables.users.get_mut(user_id) {
            Some(user) if user.user_role == expected => {
                user.user_role = new_role;
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl AuthRepository for MemoryAuthRepository {
    async fn find_credentials(&self, user_id: &UserId) -> AuthResult<Option<Auth>> {
        Ok(self.lock()?.credentials.get(user_id).cloned())
    }

    async fn begin_login_attempt(
        &self,
        user_id: &UserId,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> AuthResult<LoginAttempt> {
        let mut tables = self.lock()?;
        let auth = tables
            .credentials
            .get_mut(user_id)
            .ok_or(AuthError::UserNotFound)?;
        auth.begin_attempt(policy, now).map_err(AuthError::locked)
    }

    async fn complete_login_attempt(
        &self,
        user_id: &UserId,
        attempt: &LoginAttempt,
        now: DateTime<Utc>,
    ) -> AuthResult<()> {
        let mut tables = self.lock()?;
        let auth = tables
            .credentials
            .get_mut(user_id)
            .ok_or(AuthError::UserNotFound)?;
        auth.complete_attempt(attempt, now).map_err(AuthError::locked)
    }
}

impl TotpEnrollmentRepository for MemoryAuthRepository {
    async fn save_enrollment(&self, enrollment: &TotpEnrollment) -> AuthResult<()> {
        self.lock()?
            .enrollments
            .insert(enrollment.user_id, enrollment.clone());
        Ok(())
    }

    async fn find_enrollment(&self, user_id: &UserId) -> AuthResult<Option<TotpEnrollment>> {
        Ok(self.lock()?.enrollments.get(user_id).cloned())
    }

    async fn confirm_enrollment(
        &self,
        enrollment: &TotpEnrollment,
        now: DateTime<Utc>,
    ) -> AuthResult<()> {
        let mut tables = self.lock()?;
        let auth = tables
            .credentials
            .get_mut(&enrollment.user_id)
            .ok_or(AuthError::UserNotFound)?;
        auth.enable_totp(enrollment.secret.clone(), now)?;
        tables.enrollments.remove(&enrollment.user_id);
        Ok(())
    }

    async fn cleanup_expired_enrollments(&self) -> AuthResult<u64> {
        let now = Utc::now();
        let mut tables = self.lock()?;
        let before = tables.enrollments.len();
        tables
            .enrollments
            .retain(|_, enrollment| !enrollment.is_expired(now));
        Ok((before - tables.enrollments.len()) as u64)
    }
}

impl AuthSessionRepository for MemoryAuthRepository {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()> {
        let now_ms = session.created_at.timestamp_millis();
        let pending = session.stage == SessionStage::AwaitingTwoFactor;

        let mut tables = self.lock()?;
        tables.sessions.retain(|_, existing| {
            let replaced = existing.expires_at_ms <= now_ms
                || (pending && existing.stage == SessionStage::AwaitingTwoFactor);
            existing.user_id != session.user_id || !replaced
        });
        tables.sessions.insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_session(
        &self,
        session_id: Uuid,
        fingerprint_hash: &[u8],
    ) -> AuthResult<Option<AuthSession>> {
        match self.lock()?.sessions.get(&session_id) {
            Some(session) if session.client_fingerprint_hash != fingerprint_hash => {
                tracing::warn!(session_id = %session_id, "Auth session fingerprint mismatch");
                Ok(None)
            }
            other => Ok(other.cloned()),
        }
    }

    async fn touch_session(&self, session_id: Uuid, at: DateTime<Utc>) -> AuthResult<()> {
        if let Some(session) = self.lock()?.sessions.get_mut(&session_id) {
            session.last_activity_at = at;
        }
        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()> {
        self.lock()?.sessions.remove(&session_id);
        Ok(())
    }

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        let mut tables = self.lock()?;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, session| !session.is_expired());
        Ok((before - tables.sessions.len()) as u64)
    }
}
