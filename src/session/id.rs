//! Session identifiers — random tokens with a keyed-hash signature.
//!
//! A session cookie carries `<token>.<signature>`. The signature binds the
//! token to the configured secret, so a client cannot mint or alter session
//! identifiers; a cookie that fails verification is simply treated as absent.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

/// Number of random bytes backing a session token.
const TOKEN_BYTES: usize = 32;

/// An opaque, server-generated session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random session id.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// The raw token, without signature.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Produce the signed cookie value for this id.
    pub fn sign(&self, secret: &SecretString) -> String {
        format!("{}.{}", self.0, signature(&self.0, secret))
    }

    /// Verify a signed cookie value, returning the id if the signature holds.
    ///
    /// Any malformed or tampered value yields `None`; callers respond by
    /// minting a fresh session.
    pub fn verify(cookie_value: &str, secret: &SecretString) -> Option<Self> {
        let (token, sig) = cookie_value.split_once('.')?;
        if token.is_empty() || sig != signature(token, secret) {
            return None;
        }
        Some(Self(token.to_string()))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Logs only need to correlate requests; don't leak the full token.
        write!(f, "{}…", &self.0[..self.0.len().min(8)])
    }
}

fn signature(token: &str, secret: &SecretString) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.expose_secret().as_bytes());
    hasher.update(b".");
    hasher.update(token.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("unit-test-secret")
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn sign_verify_round_trip() {
        let id = SessionId::generate();
        let cookie = id.sign(&secret());
        assert_eq!(SessionId::verify(&cookie, &secret()), Some(id));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let cookie = SessionId::generate().sign(&secret());
        let (_, sig) = cookie.split_once('.').unwrap();
        let forged = format!("{}.{}", "forged-token", sig);
        assert_eq!(SessionId::verify(&forged, &secret()), None);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let cookie = SessionId::generate().sign(&secret());
        let other = SecretString::from("different-secret");
        assert_eq!(SessionId::verify(&cookie, &other), None);
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert_eq!(SessionId::verify("", &secret()), None);
        assert_eq!(SessionId::verify("no-dot-here", &secret()), None);
        assert_eq!(SessionId::verify(".sig-only", &secret()), None);
    }

    #[test]
    fn display_truncates_token() {
        let id = SessionId::generate();
        let shown = id.to_string();
        assert!(shown.len() < id.as_str().len());
    }
}
