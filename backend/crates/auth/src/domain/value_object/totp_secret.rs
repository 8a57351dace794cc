//! TOTP Secret Value Object
//!
//! RFC 6238 with authenticator-app defaults: SHA-1, 6 digits, 30 s step and
//! one step of clock skew in either direction.

use std::fmt;

use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::{AuthError, AuthResult};

const TOTP_DIGITS: usize = 6;
const TOTP_STEP: u64 = 30;
const TOTP_SKEW: u8 = 1;
pub const TOTP_ISSUER: &str = "KonterHP";

/// Base32-encoded shared secret (160 bits when generated here).
#[derive(Clone, PartialEq, Eq)]
pub struct TotpSecret {
    secret_base32: String,
}

impl TotpSecret {
    pub fn generate() -> Self {
        Self {
            secret_base32: Secret::generate_secret().to_encoded().to_string(),
        }
    }

    pub fn from_base32(secret: impl Into<String>) -> AuthResult<Self> {
        let secret_base32 = secret.into();
        Secret::Encoded(secret_base32.clone())
            .to_bytes()
            .map_err(|e| AuthError::Internal(format!("Invalid TOTP secret: {e}")))?;
        Ok(Self { secret_base32 })
    }

    pub fn as_base32(&self) -> &str {
        &self.secret_base32
    }

    fn to_totp(&self, account_name: &str) -> AuthResult<TOTP> {
        let bytes = Secret::Encoded(self.secret_base32.clone())
            .to_bytes()
            .map_err(|e| AuthError::Internal(format!("Invalid TOTP secret: {e}")))?;

        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            TOTP_SKEW,
            TOTP_STEP,
            bytes,
            Some(TOTP_ISSUER.to_string()),
            account_name.to_string(),
        )
        .map_err(|e| AuthError::Internal(format!("Failed to create TOTP: {e}")))
    }

    /// Check `code` against the current time window.
    ///
    /// Anything that is not exactly six ASCII digits is simply a wrong code.
    pub fn verify(&self, code: &str, account_name: &str) -> AuthResult<bool> {
        let code = code.trim();
        if code.len() != TOTP_DIGITS || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(false);
        }
        let totp = self.to_totp(account_name)?;
        totp.check_current(code)
            .map_err(|e| AuthError::Internal(format!("System clock error: {e}")))
    }

    #[cfg(test)]
    pub fn generate_current(&self, account_name: &str) -> AuthResult<String> {
        self.to_totp(account_name)?
            .generate_current()
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// `otpauth://totp/KonterHP:<account>?secret=...&issuer=KonterHP`
    pub fn otpauth_url(&self, account_name: &str) -> AuthResult<String> {
        Ok(self.to_totp(account_name)?.get_url())
    }

    /// QR code of the provisioning URI as base64 PNG.
    pub fn qr_code_base64(&self, account_name: &str) -> AuthResult<String> {
        self.to_totp(account_name)?
            .get_qr_base64()
            .map_err(|e| AuthError::Internal(format!("Failed to render QR code: {e}")))
    }
}

impl fmt::Debug for TotpSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TotpSecret")
            .field("secret_base32", &"[REDACTED]")
            .finish()
    }
}
