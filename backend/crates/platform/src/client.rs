//! Client identification
//!
//! Sessions are bound to a fingerprint of the User-Agent so that a stolen
//! cookie replayed from another client is rejected.

use std::net::IpAddr;

use axum::http::{HeaderMap, header};

use crate::crypto::sha256;

#[derive(Debug, Clone)]
pub struct ClientFingerprint {
    /// SHA-256 of the User-Agent header
    pub hash: [u8; 32],
    pub ip: Option<IpAddr>,
    pub user_agent: String,
}

impl ClientFingerprint {
    pub fn from_user_agent(user_agent: &str, ip: Option<IpAddr>) -> Self {
        Self {
            hash: sha256(user_agent.as_bytes()),
            ip,
            user_agent: user_agent.to_string(),
        }
    }

    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FingerprintError {
    #[error("Missing required header: {0}")]
    MissingHeader(&'static str),
}

/// Build the fingerprint of a request. A User-Agent header is required.
pub fn extract_fingerprint(
    headers: &HeaderMap,
    client_ip: Option<IpAddr>,
) -> Result<ClientFingerprint, FingerprintError> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or(FingerprintError::MissingHeader("User-Agent"))?;

    Ok(ClientFingerprint::from_user_agent(user_agent, client_ip))
}

/// First address of `X-Forwarded-For`, falling back to the peer address.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .or(direct_ip)
}
