//! Auth Session Entity
//!
//! Server-side session referenced by a signed cookie. A session is either
//! waiting for the second factor or fully authenticated; only the latter
//! grants access.

use chrono::{DateTime, Duration, Utc};
use platform::client::ClientFingerprint;
use uuid::Uuid;

use crate::domain::value_object::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum SessionStage {
    /// Password accepted, one-time code still outstanding
    AwaitingTwoFactor = 0,
    Authenticated = 1,
}

impl SessionStage {
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    pub const fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(SessionStage::AwaitingTwoFactor),
            1 => Some(SessionStage::Authenticated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub stage: SessionStage,
    /// Unix timestamp in milliseconds
    pub expires_at_ms: i64,
    /// SHA-256 of the User-Agent the session was issued to
    pub client_fingerprint_hash: Vec<u8>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn new(
        user_id: UserId,
        stage: SessionStage,
        fingerprint: &ClientFingerprint,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            stage,
            expires_at_ms: (now + ttl).timestamp_millis(),
            client_fingerprint_hash: fingerprint.hash.to_vec(),
            client_ip: fingerprint.ip_string(),
            user_agent: Some(fingerprint.user_agent.clone()),
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }

    pub fn is_authenticated(&self) -> bool {
        self.stage == SessionStage::Authenticated
    }

    /// Cookie value: the session id signed with the server secret.
    pub fn token(&self, secret: &[u8; 32]) -> String {
        platform::crypto::sign_token(&self.session_id.to_string(), secret)
    }
}
