//! Admin authentication for the showroom backend.
//!
//! Passwords are stored as argon2 PHC strings and verified on login. A
//! successful login issues a self-contained session token: JSON claims and an
//! HMAC-SHA256 tag, both URL-safe base64, joined by a dot. Verification is a
//! pure function of the signature and the embedded expiry - there is no
//! session table and no server-side revocation; tokens stay valid until they
//! expire naturally.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use ring::hmac;
use serde::{Deserialize, Serialize};

use crate::config::TOKEN_TTL_SECS;

/// Authentication error
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown username or wrong password (indistinguishable to the caller)
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password could not be hashed
    #[error("password hashing failed")]
    PasswordHash,
}

/// Claims embedded in a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Admin user id
    pub sub: i64,
    /// Admin username
    pub username: String,
    /// Expiry as unix seconds
    pub exp: i64,
}

/// Issue a signed session token for an admin user.
///
/// Returns the token and its expiry, a fixed eight hours from issuance. The
/// expiry is also embedded in the claims so `verify_token` needs no state.
pub fn issue_token(secret: &str, user_id: i64, username: &str) -> (String, DateTime<Utc>) {
    let expires_at = Utc::now() + Duration::seconds(TOKEN_TTL_SECS);
    let claims = TokenClaims {
        sub: user_id,
        username: username.to_string(),
        exp: expires_at.timestamp(),
    };
    (encode_token(secret, &claims), expires_at)
}

/// Verify a session token.
///
/// Returns the claims for a well-formed, correctly signed, unexpired token.
/// Any other input - malformed, tampered, signed with a different secret, or
/// past expiry - collapses to `None`; verification never fails loudly.
pub fn verify_token(secret: &str, token: &str) -> Option<TokenClaims> {
    let (payload, tag) = token.split_once('.')?;

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let tag = URL_SAFE_NO_PAD.decode(tag).ok()?;
    hmac::verify(&key, payload.as_bytes(), &tag).ok()?;

    let claims_json = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: TokenClaims = serde_json::from_slice(&claims_json).ok()?;

    if claims.exp <= Utc::now().timestamp() {
        return None;
    }

    Some(claims)
}

/// Encode and sign claims into token form
fn encode_token(secret: &str, claims: &TokenClaims) -> String {
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap_or_default());

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let tag = URL_SAFE_NO_PAD.encode(hmac::sign(&key, payload.as_bytes()).as_ref());

    format!("{payload}.{tag}")
}

/// Hash a password as an argon2 PHC string (used when seeding the admin row).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Extract a Bearer token from an Authorization header value
pub fn extract_bearer_token(authorization: &str) -> Option<&str> {
    authorization
        .strip_prefix("Bearer ")
        .or_else(|| authorization.strip_prefix("bearer "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-0123456789abcdef0123456789";

    #[test]
    fn extract_bearer_token_works() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer ABC123"), Some("ABC123"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token("abc123"), None);
    }

    #[test]
    fn token_round_trip() {
        let (token, expires_at) = issue_token(SECRET, 7, "admin");

        let claims = verify_token(SECRET, &token).expect("fresh token should verify");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.exp, expires_at.timestamp());

        // Expiry is eight hours out, give or take scheduling slack
        let ttl = expires_at.timestamp() - Utc::now().timestamp();
        assert!((TOKEN_TTL_SECS - 5..=TOKEN_TTL_SECS).contains(&ttl));
    }

    #[test]
    fn token_rejects_wrong_secret() {
        let (token, _) = issue_token(SECRET, 1, "admin");
        assert!(verify_token("another-secret-0123456789abcdef01234", &token).is_none());
    }

    #[test]
    fn token_rejects_tampered_payload() {
        let (token, _) = issue_token(SECRET, 1, "admin");
        let (_, tag) = token.split_once('.').unwrap();

        let forged = TokenClaims {
            sub: 999,
            username: "intruder".to_string(),
            exp: (Utc::now() + Duration::hours(8)).timestamp(),
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());

        assert!(verify_token(SECRET, &format!("{payload}.{tag}")).is_none());
    }

    #[test]
    fn token_rejects_expired() {
        let claims = TokenClaims {
            sub: 1,
            username: "admin".to_string(),
            exp: (Utc::now() - Duration::seconds(1)).timestamp(),
        };
        let token = encode_token(SECRET, &claims);

        assert!(verify_token(SECRET, &token).is_none());
    }

    #[test]
    fn token_rejects_malformed() {
        assert!(verify_token(SECRET, "").is_none());
        assert!(verify_token(SECRET, "no-dot-here").is_none());
        assert!(verify_token(SECRET, "not!base64.not!base64").is_none());
        assert!(verify_token(SECRET, "a.b.c").is_none());
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery staple", &hash).is_ok());
        assert!(verify_password("wrong password", &hash).is_err());
    }

    #[test]
    fn verify_password_rejects_garbage_hash() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
