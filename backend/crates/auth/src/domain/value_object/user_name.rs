//! User Name Value Object
//!
//! Login identifier of an identity. Normalized with NFKC and trimmed, case is
//! preserved and uniqueness is exact. The name doubles as the TOTP account
//! label, so `:` (the otpauth label separator) is rejected.

use std::fmt;

use unicode_normalization::UnicodeNormalization;

pub const MIN_USER_NAME_LENGTH: usize = 3;
pub const MAX_USER_NAME_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserNameError {
    #[error("User name must be at least {min} characters")]
    TooShort { min: usize },

    #[error("User name must be at most {max} characters")]
    TooLong { max: usize },

    #[error("User name cannot contain whitespace")]
    Whitespace,

    #[error("User name contains an invalid character: {0:?}")]
    InvalidCharacter(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserName(String);

impl UserName {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserNameError> {
        let normalized: String = raw.as_ref().nfkc().collect();
        let name = normalized.trim();
        let len = name.chars().count();

        if len < MIN_USER_NAME_LENGTH {
            return Err(UserNameError::TooShort {
                min: MIN_USER_NAME_LENGTH,
            });
        }
        if len > MAX_USER_NAME_LENGTH {
            return Err(UserNameError::TooLong {
                max: MAX_USER_NAME_LENGTH,
            });
        }
        if name.chars().any(char::is_whitespace) {
            return Err(UserNameError::Whitespace);
        }
        if let Some(ch) = name.chars().find(|ch| ch.is_control() || *ch == ':') {
            return Err(UserNameError::InvalidCharacter(ch));
        }

        Ok(Self(name.to_string()))
    }

    /// Rehydrate a name that was validated before it was stored.
    pub fn from_db(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
