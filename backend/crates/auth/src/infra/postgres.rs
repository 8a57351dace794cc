//! PostgreSQL Repository Implementations

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
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
    totp_secret::TotpSecret,
    user_name::UserName,
    user_password::UserPassword,
    user_role::{RoleAssignment, UserRole},
};
use crate::error::{AuthError, AuthResult};

/// Serializes registrations so the identity count and the insert agree.
const REGISTRATION_LOCK_KEY: i64 = 0x4b6f_6e74_6572_4850;

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn register(
        &self,
        user: &User,
        auth: &Auth,
        assignment: RoleAssignment,
    ) -> AuthResult<UserRole> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(REGISTRATION_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_name = $1)",
        )
        .bind(user.user_name.as_str())
        .fetch_one(&mut *tx)
        .await?;

        if taken {
            return Err(AuthError::UserNameTaken);
        }

        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;

        let user_role = assignment.resolve(existing);

        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                user_name,
                user_role,
                last_login_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.user_name.as_str())
        .bind(user_role.id())
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        sqlx::query(
            r#"
            INSERT INTO auth_credentials (
                user_id,
                password_hash,
                totp_secret,
                totp_enabled,
                failed_login_count,
                last_failed_at,
                locked_until,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(auth.user_id.as_uuid())
        .bind(auth.password_hash.as_phc_string())
        .bind(auth.totp_secret.as_ref().map(|s| s.as_base32()))
        .bind(auth.totp_enabled)
        .bind(auth.failed_login_count as i32)
        .bind(auth.last_failed_at)
        .bind(auth.locked_until)
        .bind(auth.created_at)
        .bind(auth.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user_role)
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                user_name,
                user_role,
                last_login_at,
                created_at,
                updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                user_name,
                user_role,
                last_login_at,
                created_at,
                updated_at
            FROM users
            WHERE user_name = $1
            "#,
        )
        .bind(user_name.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn list_users(&self) -> AuthResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                user_name,
                user_role,
                last_login_at,
                created_at,
                updated_at
            FROM users
            ORDER BY created_at, user_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_user()).collect()
    }

    async fn record_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $2, updated_at = $2 WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_role(
        &self,
        user_id: &UserId,
        expected: UserRole,
        new_role: UserRole,
    ) -> AuthResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET
                user_role = $3,
                updated_at = now()
            WHERE user_id = $1 AND user_role = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(expected.id())
        .bind(new_role.id())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }
}

// ============================================================================
// Auth Repository Implementation
// ============================================================================

impl AuthRepository for PgAuthRepository {
    async fn find_credentials(&self, user_id: &UserId) -> AuthResult<Option<Auth>> {
        let row = sqlx::query_as::<_, AuthRow>(
            r#"
            SELECT
                user_id,
                password_hash,
                totp_secret,
                totp_enabled,
                failed_login_count,
                last_failed_at,
                locked_until,
                created_at,
                updated_at
            FROM auth_credentials
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_auth()).transpose()
    }

    async fn begin_login_attempt(
        &self,
        user_id: &UserId,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> AuthResult<LoginAttempt> {
        // Lock check and increment in one statement, so a burst of attempts
        // cannot all slip past the threshold.
        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            UPDATE auth_credentials SET
                failed_login_count = failed_login_count + 1,
                last_failed_at = $2,
                locked_until = CASE
                    WHEN failed_login_count + 1 >= $3 THEN $4
                    ELSE locked_until
                END,
                updated_at = $2
            WHERE user_id = $1
              AND (locked_until IS NULL OR locked_until <= $2)
            RETURNING failed_login_count, locked_until
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(now)
        .bind(policy.max_failures as i32)
        .bind(now + policy.lockout)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(LoginAttempt {
                failed_count: row.failed_login_count.max(0) as u32,
                locked_until: row.locked_until,
            }),
            None => Err(self.lock_error(user_id, now).await?),
        }
    }

    async fn complete_login_attempt(
        &self,
        user_id: &UserId,
        attempt: &LoginAttempt,
        now: DateTime<Utc>,
    ) -> AuthResult<()> {
        // An unchanged counter means any active lock was set by this attempt.
        let updated = sqlx::query(
            r#"
            UPDATE auth_credentials SET
                failed_login_count = 0,
                last_failed_at = NULL,
                locked_until = NULL,
                updated_at = $2
            WHERE user_id = $1
              AND (
                  failed_login_count = $3
                  OR locked_until IS NULL
                  OR locked_until <= $2
              )
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(now)
        .bind(attempt.failed_count as i32)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 1 {
            Ok(())
        } else {
            Err(self.lock_error(user_id, now).await?)
        }
    }
}

impl PgAuthRepository {
    /// Error for an attempt refused by the lock condition.
    async fn lock_error(&self, user_id: &UserId, now: DateTime<Utc>) -> AuthResult<AuthError> {
        let locked_until: Option<Option<DateTime<Utc>>> =
            sqlx::query_scalar("SELECT locked_until FROM auth_credentials WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        match locked_until {
            None => Ok(AuthError::UserNotFound),
            // A lock that lapsed in the meantime still refuses this attempt
            Some(until) => Ok(AuthError::locked(
                until.map_or(Duration::zero(), |until| until - now),
            )),
        }
    }
}

// ============================================================================
// TOTP Enrollment Repository Implementation
// ============================================================================

impl TotpEnrollmentRepository for PgAuthRepository {
    async fn save_enrollment(&self, enrollment: &TotpEnrollment) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO totp_enrollments (
                user_id,
                totp_secret,
                expires_at,
                created_at
            ) VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                totp_secret = EXCLUDED.totp_secret,
                expires_at = EXCLUDED.expires_at,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(enrollment.user_id.as_uuid())
        .bind(enrollment.secret.as_base32())
        .bind(enrollment.expires_at)
        .bind(enrollment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_enrollment(&self, user_id: &UserId) -> AuthResult<Option<TotpEnrollment>> {
        let row = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            SELECT
                user_id,
                totp_secret,
                expires_at,
                created_at
            FROM totp_enrollments
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_enrollment()).transpose()
    }

    async fn confirm_enrollment(
        &self,
        enrollment: &TotpEnrollment,
        now: DateTime<Utc>,
    ) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        let enabled = sqlx::query(
            r#"
            UPDATE auth_credentials SET
                totp_secret = $2,
                totp_enabled = TRUE,
                updated_at = $3
            WHERE user_id = $1 AND totp_enabled = FALSE
            "#,
        )
        .bind(enrollment.user_id.as_uuid())
        .bind(enrollment.secret.as_base32())
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if enabled == 0 {
            return Err(AuthError::TwoFactorAlreadyEnabled);
        }

        sqlx::query("DELETE FROM totp_enrollments WHERE user_id = $1")
            .bind(enrollment.user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn cleanup_expired_enrollments(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM totp_enrollments WHERE expires_at <= $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(enrollments_deleted = deleted, "Cleaned up expired TOTP enrollments");

        Ok(deleted)
    }
}

// ============================================================================
// Auth Session Repository Implementation
// ============================================================================

impl AuthSessionRepository for PgAuthRepository {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM auth_sessions
            WHERE user_id = $1
              AND (expires_at_ms <= $2 OR ($3 AND session_stage = $4))
            "#,
        )
        .bind(session.user_id.as_uuid())
        .bind(session.created_at.timestamp_millis())
        .bind(session.stage == SessionStage::AwaitingTwoFactor)
        .bind(SessionStage::AwaitingTwoFactor.id())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO auth_sessions (
                session_id,
                user_id,
                session_stage,
                expires_at_ms,
                client_fingerprint_hash,
                client_ip,
                user_agent,
                created_at,
                last_activity_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id.as_uuid())
        .bind(session.stage.id())
        .bind(session.expires_at_ms)
        .bind(&session.client_fingerprint_hash)
        .bind(&session.client_ip)
        .bind(&session.user_agent)
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn find_session(
        &self,
        session_id: Uuid,
        fingerprint_hash: &[u8],
    ) -> AuthResult<Option<AuthSession>> {
        let row = sqlx::query_as::<_, AuthSessionRow>(
            r#"
            SELECT
                session_id,
                user_id,
                session_stage,
                expires_at_ms,
                client_fingerprint_hash,
                client_ip,
                user_agent,
                created_at,
                last_activity_at
            FROM auth_sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) if r.client_fingerprint_hash != fingerprint_hash => {
                tracing::warn!(session_id = %session_id, "Auth session fingerprint mismatch");
                Ok(None)
            }
            Some(r) => Ok(Some(r.into_session()?)),
            None => Ok(None),
        }
    }

    async fn touch_session(&self, session_id: Uuid, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE auth_sessions SET last_activity_at = $2 WHERE session_id = $1")
            .bind(session_id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE expires_at_ms < $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired auth sessions");

        Ok(deleted)
    }
}

fn map_unique_violation(err: sqlx::Error) -> AuthError {
    if kernel::error::conversions::is_unique_violation(&err) {
        AuthError::UserNameTaken
    } else {
        AuthError::Database(err)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    user_name: String,
    user_role: i16,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let user_role = UserRole::from_id(self.user_role)
            .ok_or_else(|| AuthError::Internal(format!("Invalid user_role: {}", self.user_role)))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            user_name: UserName::from_db(self.user_name),
            user_role,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuthRow {
    user_id: Uuid,
    password_hash: String,
    totp_secret: Option<String>,
    totp_enabled: bool,
    failed_login_count: i32,
    last_failed_at: Option<DateTime<Utc>>,
    locked_until: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AuthRow {
    fn into_auth(self) -> AuthResult<Auth> {
        let totp_secret = self
            .totp_secret
            .map(TotpSecret::from_base32)
            .transpose()
            .map_err(|e| AuthError::Internal(format!("Invalid TOTP secret: {}", e)))?;

        Ok(Auth {
            user_id: UserId::from_uuid(self.user_id),
            password_hash: UserPassword::from_phc_string(self.password_hash)?,
            totp_secret,
            totp_enabled: self.totp_enabled,
            failed_login_count: self.failed_login_count.max(0) as u32,
            last_failed_at: self.last_failed_at,
            locked_until: self.locked_until,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AttemptRow {
    failed_login_count: i32,
    locked_until: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct EnrollmentRow {
    user_id: Uuid,
    totp_secret: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl EnrollmentRow {
    fn into_enrollment(self) -> AuthResult<TotpEnrollment> {
        Ok(TotpEnrollment {
            user_id: UserId::from_uuid(self.user_id),
            secret: TotpSecret::from_base32(self.totp_secret)?,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuthSessionRow {
    session_id: Uuid,
    user_id: Uuid,
    session_stage: i16,
    expires_at_ms: i64,
    client_fingerprint_hash: Vec<u8>,
    client_ip: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl AuthSessionRow {
    fn into_session(self) -> AuthResult<AuthSession> {
        let stage = SessionStage::from_id(self.session_stage).ok_or_else(|| {
            AuthError::Internal(format!("Invalid session_stage: {}", self.session_stage))
        })?;

        Ok(AuthSession {
            session_id: self.session_id,
            user_id: UserId::from_uuid(self.user_id),
            stage,
            expires_at_ms: self.expires_at_ms,
            client_fingerprint_hash: self.client_fingerprint_hash,
            client_ip: self.client_ip,
            user_agent: self.user_agent,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        })
    }
}
