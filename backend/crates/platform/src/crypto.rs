//! Cryptographic Utilities

use base64::{Engine, engine::general_purpose};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Generate a random 256-bit key
pub fn random_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    key
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// URL-safe base64 without padding, used inside tokens and cookies
pub fn to_base64_url(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

pub fn from_base64_url(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::URL_SAFE_NO_PAD.decode(s)
}

pub fn hmac_sha256(key: &[u8; 32], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Sign `payload` as `{payload}.{base64url(hmac)}`.
///
/// The payload must not contain `.`; the signature is split off at the last dot.
pub fn sign_token(payload: &str, key: &[u8; 32]) -> String {
    let signature = hmac_sha256(key, payload.as_bytes());
    format!("{}.{}", payload, to_base64_url(&signature))
}

/// Verify a token produced by [`sign_token`] and return its payload.
///
/// The MAC comparison is constant-time (`Mac::verify_slice`).
pub fn verify_signed_token<'a>(token: &'a str, key: &[u8; 32]) -> Option<&'a str> {
    let (payload, signature) = token.rsplit_once('.')?;
    let signature = from_base64_url(signature).ok()?;

    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature).ok()?;

    Some(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_values() {
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash.to_vec(), expected);
    }

    #[test]
    fn test_token_signature_is_hmac_of_payload() {
        let key = [42u8; 32];
        let token = sign_token("abc", &key);
        let (payload, signature) = token.rsplit_once('.').unwrap();
        assert_eq!(payload, "abc");
        assert_eq!(
            from_base64_url(signature).unwrap(),
            hmac_sha256(&key, b"abc").to_vec()
        );
    }

    #[test]
    fn test_random_key() {
        let a = random_key();
        let b = random_key();
        assert_ne!(a, b);
    }

    #[test]
    fn test_signed_token_round_trip() {
        let key = [7u8; 32];
        let token = sign_token("3f1c0f5e-8a7b-4b9e-9d7e-2a1b3c4d5e6f", &key);
        assert_eq!(
            verify_signed_token(&token, &key),
            Some("3f1c0f5e-8a7b-4b9e-9d7e-2a1b3c4d5e6f")
        );
    }

    #[test]
    fn test_signed_token_rejects_tampering() {
        let key = [7u8; 32];
        let token = sign_token("session-a", &key);
        let forged = token.replacen("session-a", "session-b", 1);

        assert!(verify_signed_token(&forged, &key).is_none());
        assert!(verify_signed_token(&token, &[8u8; 32]).is_none());
        assert!(verify_signed_token("no-signature", &key).is_none());
        assert!(verify_signed_token("payload.!!!", &key).is_none());
    }
}
