//! Server Configuration
//!
//! Read once at startup from the environment (after `.env` is loaded).

use std::env;
use std::net::SocketAddr;

use anyhow::{Context, bail};
use auth::AuthConfig;
use auth::domain::LockoutPolicy;
use axum::http::HeaderValue;
use base64::Engine;
use base64::engine::general_purpose;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<HeaderValue>,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok(), cfg!(debug_assertions))
    }

    /// `development` relaxes the session secret and Secure-cookie defaults.
    pub fn from_lookup<F>(lookup: F, development: bool) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let bind_addr = var("BIND_ADDR")
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address such as 0.0.0.0:31113")?;

        let frontend_origins: Vec<HeaderValue> = var("FRONTEND_ORIGINS")
            .as_deref()
            .unwrap_or(DEFAULT_FRONTEND_ORIGINS)
            .split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect();

        let mut auth = AuthConfig::default();

        auth.session_secret = match var("AUTH_SESSION_SECRET") {
            Some(encoded) => decode_secret(&encoded)?,
            None if development => {
                tracing::warn!("AUTH_SESSION_SECRET not set, using a random key");
                AuthConfig::with_random_secret().session_secret
            }
            None => bail!("AUTH_SESSION_SECRET must be set in production"),
        };

        auth.password_pepper = var("PASSWORD_PEPPER").map(String::into_bytes);

        let max_failures =
            positive(var("AUTH_MAX_FAILED_ATTEMPTS"), 5, "AUTH_MAX_FAILED_ATTEMPTS")?;
        let lockout_minutes = positive(var("AUTH_LOCKOUT_MINUTES"), 30, "AUTH_LOCKOUT_MINUTES")?;
        auth.lockout = LockoutPolicy::new(max_failures, i64::from(lockout_minutes));

        auth.cookie_secure = match var("COOKIE_SECURE") {
            Some(flag) => parse_flag(&flag).context("COOKIE_SECURE must be true or false")?,
            None => !development,
        };

        Ok(Self {
            database_url,
            bind_addr,
            frontend_origins,
            auth,
        })
    }
}

fn decode_secret(encoded: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = general_purpose::STANDARD
        .decode(encoded.trim())
        .context("AUTH_SESSION_SECRET must be base64")?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        anyhow::anyhow!(
            "AUTH_SESSION_SECRET must decode to 32 bytes, got {}",
            bytes.len()
        )
    })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn positive(value: Option<String>, default: u32, key: &str) -> anyhow::Result<u32> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => bail!("{key} must be a positive integer"),
    }
}
