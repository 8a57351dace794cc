//! Application Configuration
//!
//! Configuration for the Auth application layer.

use chrono::Duration;
use platform::cookie::CookieConfig;

use crate::domain::entity::auth::LockoutPolicy;

pub use platform::cookie::SameSite;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session_cookie_name: String,
    /// Cookie that carries the pending second-factor session
    pub pending_cookie_name: String,
    /// HMAC key for session tokens (32 bytes)
    pub session_secret: [u8; 32],
    pub session_ttl: Duration,
    /// How long a password-verified sign-in may wait for its one-time code
    pub pending_two_factor_ttl: Duration,
    /// How long a generated secret waits for its confirming code
    pub totp_enrollment_ttl: Duration,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    /// Application-wide secret mixed into password hashes
    pub password_pepper: Option<Vec<u8>>,
    pub lockout: LockoutPolicy,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "konterhp_session".to_string(),
            pending_cookie_name: "konterhp_2fa".to_string(),
            session_secret: [0u8; 32],
            session_ttl: Duration::hours(12),
            pending_two_factor_ttl: Duration::minutes(5),
            totp_enrollment_ttl: Duration::minutes(10),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            password_pepper: None,
            lockout: LockoutPolicy::default(),
        }
    }
}

impl AuthConfig {
    pub fn with_random_secret() -> Self {
        Self {
            session_secret: platform::crypto::random_key(),
            ..Default::default()
        }
    }

    /// Random secret and non-Secure cookies, for local HTTP.
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn session_cookie(&self) -> CookieConfig {
        CookieConfig::new(&self.session_cookie_name, self.cookie_secure)
            .with_same_site(self.cookie_same_site)
            .with_max_age(self.session_ttl.num_seconds())
    }

    pub fn pending_cookie(&self) -> CookieConfig {
        CookieConfig::new(&self.pending_cookie_name, self.cookie_secure)
            .with_same_site(self.cookie_same_site)
            .with_max_age(self.pending_two_factor_ttl.num_seconds())
    }
}
