//! Credential issuance and verification (component I): HS256 JWTs over a
//! shared salt, plus the password hashing scheme the rest of the user
//! lifecycle hangs off of. Access and refresh tokens are both bearer JWTs;
//! only refresh tokens get a row in storage so they can be revoked.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

type Blake2b256 = Blake2b<U32>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("malformed token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),
    #[error("token expired")]
    Expired,
    #[error("wrong audience: expected {expected}, got {actual}")]
    WrongAudience { expected: &'static str, actual: String },
}

pub type AuthResult<T> = Result<T, AuthError>;

/// The two token kinds this service issues. Carried in the `aud` claim,
/// exactly as the source stores it: the literal strings `"auth"` and
/// `"refresh"`, not a numeric discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Auth,
    Refresh,
}

impl Audience {
    pub fn as_str(self) -> &'static str {
        match self {
            Audience::Auth => "auth",
            Audience::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub aud: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Issues a matched access/refresh token pair for `subject`, signed with
/// `secret` (the shared password salt — see the crate-level storage
/// contract for why there's no separate signing key).
pub fn create_credentials(
    subject: &str,
    issuer: &str,
    access_validity_secs: u64,
    refresh_validity_secs: u64,
    secret: &str,
) -> AuthResult<Credentials> {
    let now = Utc::now().timestamp();
    let access_token = sign(subject, issuer, now, access_validity_secs, Audience::Auth, secret)?;
    let refresh_token = sign(subject, issuer, now, refresh_validity_secs, Audience::Refresh, secret)?;
    Ok(Credentials {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: access_validity_secs,
    })
}

fn sign(
    subject: &str,
    issuer: &str,
    now: i64,
    validity_secs: u64,
    aud: Audience,
    secret: &str,
) -> AuthResult<String> {
    let claims = Claims {
        iss: issuer.to_string(),
        sub: subject.to_string(),
        exp: now + validity_secs as i64,
        iat: now,
        aud: aud.as_str().to_string(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(AuthError::Malformed)
}

/// Verifies the signature and checks expiry by hand, the way the source
/// does: `jsonwebtoken`'s own `validate_exp` is turned off here so the
/// expiry comparison stays explicit and the audience claim is left for the
/// caller to inspect with [`require_audience`].
pub fn verify_token(token: &str, secret: &str) -> AuthResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)?;

    if Utc::now().timestamp() > data.claims.exp {
        return Err(AuthError::Expired);
    }
    Ok(data.claims)
}

/// Rejects claims that don't carry the expected `aud` value. Call this
/// after [`verify_token`] anywhere a specific token kind is required (e.g.
/// refresh and logout only ever accept `Audience::Refresh`).
pub fn require_audience(claims: &Claims, expected: Audience) -> AuthResult<()> {
    if claims.aud != expected.as_str() {
        return Err(AuthError::WrongAudience {
            expected: expected.as_str(),
            actual: claims.aud.clone(),
        });
    }
    Ok(())
}

/// Hex-encoded 256-bit BLAKE2b digest of `password || salt`. There is no
/// per-user salt beyond the one shared secret — a known weak scheme kept
/// for behavioural fidelity rather than strengthened here.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Blake2b256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// `^[A-Za-z0-9_]+$`, applied to both `login` and `username` at registration.
pub fn is_valid_identifier(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_password_is_deterministic_and_order_sensitive() {
        let a = hash_password("hunter2", "salt");
        let b = hash_password("hunter2", "salt");
        assert_eq!(a, b);
        assert_ne!(a, hash_password("salt", "hunter2"));
    }

    #[test]
    fn round_trips_a_fresh_access_token() {
        let creds = create_credentials("42", "local", 3600, 86_400, "shared-secret").unwrap();
        let claims = verify_token(&creds.access_token, "shared-secret").unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.aud, "auth");
        require_audience(&claims, Audience::Auth).unwrap();
        assert!(require_audience(&claims, Audience::Refresh).is_err());
    }

    #[test]
    fn rejects_a_token_signed_with_the_wrong_secret() {
        let creds = create_credentials("1", "local", 3600, 86_400, "right-secret").unwrap();
        assert!(verify_token(&creds.access_token, "wrong-secret").is_err());
    }

    #[test]
    fn rejects_an_expired_token() {
        let creds = create_credentials("1", "local", 0, 86_400, "shared-secret").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let result = verify_token(&creds.access_token, "shared-secret");
        assert!(matches!(result, Err(AuthError::Expired)));
    }

    #[test]
    fn identifier_pattern_matches_word_characters_only() {
        assert!(is_valid_identifier("player_1"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("bad name"));
        assert!(!is_valid_identifier("bad-name"));
    }
}
