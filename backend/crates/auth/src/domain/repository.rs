//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infra layer.
//! Every method that reads and then writes does so atomically inside the store.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entity::{
    auth::{Auth, LockoutPolicy, LoginAttempt},
    auth_session::AuthSession,
    totp_enrollment::TotpEnrollment,
    user::User,
};
use crate::domain::value_object::{
    UserId,
    user_name::UserName,
    user_role::{RoleAssignment, UserRole},
};
use crate::error::AuthResult;

#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert the identity and its credentials as one unit.
    ///
    /// Counting existing identities, resolving `assignment` and inserting are
    /// serialized against concurrent registrations. Fails with
    /// `UserNameTaken` when the name exists. Returns the assigned role.
    async fn register(
        &self,
        user: &User,
        auth: &Auth,
        assignment: RoleAssignment,
    ) -> AuthResult<UserRole>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>>;

    /// All identities, oldest first.
    async fn list_users(&self) -> AuthResult<Vec<User>>;

    async fn record_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()>;

    /// Compare-and-set: only applies while the stored role still equals
    /// `expected`. Returns false when it did not.
    async fn update_role(
        &self,
        user_id: &UserId,
        expected: UserRole,
        new_role: UserRole,
    ) -> AuthResult<bool>;
}

#[trait_variant::make(AuthRepository: Send)]
pub trait LocalAuthRepository {
    async fn find_credentials(&self, user_id: &UserId) -> AuthResult<Option<Auth>>;

    /// Charge one attempt to the failure counter before the secret is
    /// checked, locking when the policy threshold is reached. Fails with
    /// `AccountLocked` while a lock is active. Check and increment are one
    /// atomic step, so concurrent callers each get their own counter value.
    async fn begin_login_attempt(
        &self,
        user_id: &UserId,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> AuthResult<LoginAttempt>;

    /// Clear the counter after `attempt` succeeded. Fails with
    /// `AccountLocked` when another attempt has locked the account since.
    async fn complete_login_attempt(
        &self,
        user_id: &UserId,
        attempt: &LoginAttempt,
        now: DateTime<Utc>,
    ) -> AuthResult<()>;
}

#[trait_variant::make(TotpEnrollmentRepository: Send)]
pub trait LocalTotpEnrollmentRepository {
    /// Store the pending secret, replacing any earlier one for the user.
    async fn save_enrollment(&self, enrollment: &TotpEnrollment) -> AuthResult<()>;

    async fn find_enrollment(&self, user_id: &UserId) -> AuthResult<Option<TotpEnrollment>>;

    /// Commit the pending secret to the credentials, enable the second factor
    /// and discard the pending enrollment, all or nothing. Fails with
    /// `TwoFactorAlreadyEnabled` if it was enabled in the meantime.
    async fn confirm_enrollment(
        &self,
        enrollment: &TotpEnrollment,
        now: DateTime<Utc>,
    ) -> AuthResult<()>;

    async fn cleanup_expired_enrollments(&self) -> AuthResult<u64>;
}

#[trait_variant::make(AuthSessionRepository: Send)]
pub trait LocalAuthSessionRepository {
    /// Store a new session. The user's expired sessions are purged in the
    /// same step, and a pending second-factor session replaces any earlier
    /// pending one.
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()>;

    /// Look up a session issued to the client with `fingerprint_hash`.
    async fn find_session(
        &self,
        session_id: Uuid,
        fingerprint_hash: &[u8],
    ) -> AuthResult<Option<AuthSession>>;

    async fn touch_session(&self, session_id: Uuid, at: DateTime<Utc>) -> AuthResult<()>;

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()>;

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64>;
}

/// Everything the auth handlers need from a single store.
pub trait AuthStore:
    UserRepository
    + AuthRepository
    + TotpEnrollmentRepository
    + AuthSessionRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthStore for T where
    T: UserRepository
        + AuthRepository
        + TotpEnrollmentRepository
        + AuthSessionRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
