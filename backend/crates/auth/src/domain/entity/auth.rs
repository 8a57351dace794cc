//! Auth Entity
//!
//! Credentials and lockout state for a user, kept apart from [`super::user::User`]
//! so the sensitive half is only loaded where it is needed.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{
    UserId, totp_secret::TotpSecret, user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

/// Consecutive failures allowed before a temporary lock, and the lock length.
///
/// Password and second-factor failures count against the same counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_failures: u32,
    pub lockout: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failures: 5,
            lockout: Duration::minutes(30),
        }
    }
}

impl LockoutPolicy {
    pub fn new(max_failures: u32, lockout_minutes: i64) -> Self {
        Self {
            max_failures,
            lockout: Duration::minutes(lockout_minutes),
        }
    }

    /// Interpret the counter state right after a failure was recorded.
    pub fn outcome(
        &self,
        failed_count: u32,
        locked_until: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> FailureOutcome {
        match locked_until {
            Some(until) if failed_count >= self.max_failures && until > now => {
                FailureOutcome::Locked {
                    locked_until: until,
                }
            }
            _ => FailureOutcome::Counted { failed_count },
        }
    }
}

/// Result of a rejected password or one-time code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    Counted { failed_count: u32 },
    Locked { locked_until: DateTime<Utc> },
}

/// One password or code check, charged to the failure counter before the
/// secret is compared. A rejected check needs no further write; an accepted
/// one is settled with [`Auth::complete_attempt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginAttempt {
    /// Counter value including this attempt
    pub failed_count: u32,
    pub locked_until: Option<DateTime<Utc>>,
}

impl LoginAttempt {
    pub fn failure_outcome(&self, policy: &LockoutPolicy, now: DateTime<Utc>) -> FailureOutcome {
        policy.outcome(self.failed_count, self.locked_until, now)
    }
}

#[derive(Debug, Clone)]
pub struct Auth {
    pub user_id: UserId,
    pub password_hash: UserPassword,
    /// Committed second-factor secret. Only set once enrollment is confirmed.
    pub totp_secret: Option<TotpSecret>,
    pub totp_enabled: bool,
    /// Consecutive failures. Reset by any accepted password or one-time code.
    pub failed_login_count: u32,
    pub last_failed_at: Option<DateTime<Utc>>,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Auth {
    pub fn new(user_id: UserId, password_hash: UserPassword) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            password_hash,
            totp_secret: None,
            totp_enabled: false,
            failed_login_count: 0,
            last_failed_at: None,
            locked_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Time left on an active lock.
    pub fn lock_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.locked_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }

    /// Reserve a check. Refused with the remaining lock time while locked.
    ///
    /// The attempt counts as a failure until it is completed, so concurrent
    /// checks can never exceed `max_failures` within one lock window.
    pub fn begin_attempt(
        &mut self,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> Result<LoginAttempt, Duration> {
        if let Some(remaining) = self.lock_remaining(now) {
            return Err(remaining);
        }
        self.failed_login_count = self.failed_login_count.saturating_add(1);
        self.last_failed_at = Some(now);
        self.updated_at = now;
        if self.failed_login_count >= policy.max_failures {
            self.locked_until = Some(now + policy.lockout);
        }
        Ok(LoginAttempt {
            failed_count: self.failed_login_count,
            locked_until: self.locked_until,
        })
    }

    /// Clear the counter after `attempt` succeeded.
    ///
    /// A lock is only lifted when `attempt` set it itself, i.e. no other
    /// attempt was charged since. Otherwise the remaining lock time is returned.
    pub fn complete_attempt(
        &mut self,
        attempt: &LoginAttempt,
        now: DateTime<Utc>,
    ) -> Result<(), Duration> {
        if self.failed_login_count != attempt.failed_count {
            if let Some(remaining) = self.lock_remaining(now) {
                return Err(remaining);
            }
        }
        self.reset_failures(now);
        Ok(())
    }

    fn reset_failures(&mut self, now: DateTime<Utc>) {
        self.failed_login_count = 0;
        self.last_failed_at = None;
        self.locked_until = None;
        self.updated_at = now;
    }

    /// Commit a verified secret. A secret is never replaced while enabled.
    pub fn enable_totp(&mut self, secret: TotpSecret, now: DateTime<Utc>) -> AuthResult<()> {
        if self.totp_enabled {
            return Err(AuthError::TwoFactorAlreadyEnabled);
        }
        self.totp_secret = Some(secret);
        self.totp_enabled = true;
        self.updated_at = now;
        Ok(())
    }

    /// The secret to check codes against, when second factor is on.
    pub fn active_totp_secret(&self) -> Option<&TotpSecret> {
        self.totp_secret.as_ref().filter(|_| self.totp_enabled)
    }

    pub fn requires_2fa(&self) -> bool {
        self.active_totp_secret().is_some()
    }
}
