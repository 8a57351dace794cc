//! Pending TOTP enrollment: a generated secret awaiting its first valid code.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{UserId, totp_secret::TotpSecret};

#[derive(Debug, Clone)]
pub struct TotpEnrollment {
    pub user_id: UserId,
    pub secret: TotpSecret,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TotpEnrollment {
    pub fn new(user_id: UserId, secret: TotpSecret, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            secret,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
