//! User Password Value Object
//!
//! Domain wrapper over `platform::password`. Registration input goes through
//! [`RawPassword::new`] (policy enforced); sign-in input goes through
//! [`RawPassword::for_sign_in`] (only normalized).

use std::fmt;

use platform::password::{ClearTextPassword, HashedPassword, PasswordPolicyError};

use crate::error::{AuthError, AuthResult};

pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    pub fn new(raw: String) -> AuthResult<Self> {
        ClearTextPassword::new(raw)
            .map(Self)
            .map_err(|e| AuthError::PasswordValidation(policy_message(&e)))
    }

    /// Blank input can never match a stored hash and is rejected like a mismatch.
    pub fn for_sign_in(raw: String) -> AuthResult<Self> {
        ClearTextPassword::for_verification(raw)
            .map(Self)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

fn policy_message(err: &PasswordPolicyError) -> String {
    match err {
        PasswordPolicyError::EmptyOrWhitespace => "Password cannot be empty".to_string(),
        other => other.to_string(),
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

/// Stored Argon2id hash.
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AuthResult<Self> {
        raw.0
            .hash(pepper)
            .map(Self)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    pub fn from_phc_string(phc_string: impl Into<String>) -> AuthResult<Self> {
        HashedPassword::from_phc_string(phc_string)
            .map(Self)
            .map_err(|_| AuthError::Internal("Invalid password hash in store".to_string()))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(&raw.0, pepper)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_policy() {
        assert!(RawPassword::new("toko-konter-hp".to_string()).is_ok());
        assert!(matches!(
            RawPassword::new("short".to_string()),
            Err(AuthError::PasswordValidation(_))
        ));
        assert!(matches!(
            RawPassword::new(String::new()),
            Err(AuthError::PasswordValidation(msg)) if msg == "Password cannot be empty"
        ));
    }

    #[test]
    fn test_sign_in_input_is_not_policy_checked() {
        assert!(RawPassword::for_sign_in("short".to_string()).is_ok());
        assert!(matches!(
            RawPassword::for_sign_in(" ".to_string()),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hash_and_verify() {
        let raw = RawPassword::new("toko-konter-hp".to_string()).unwrap();
        let hashed = UserPassword::from_raw(&raw, Some(b"pepper")).unwrap();

        assert!(hashed.verify(&raw, Some(b"pepper")));
        let wrong = RawPassword::for_sign_in("toko-konter-xx".to_string()).unwrap();
        assert!(!hashed.verify(&wrong, Some(b"pepper")));

        let restored = UserPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&raw, Some(b"pepper")));
    }
}
