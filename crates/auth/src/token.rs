//! Session token issuer: HS256-signed bearer tokens.
//!
//! The token is a stateless signed claim set; validation is a pure
//! signature + expiry check executed once per inbound request. Invalid
//! signature, expiry, and malformed input all collapse into one error so
//! callers cannot distinguish the cause.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vaultbank_core::UserId;

/// Token lifetime in days.
pub const TOKEN_TTL_DAYS: i64 = 30;

/// Claim set carried by a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the authenticated user id.
    pub sub: UserId,
    pub username: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is invalid or expired")]
    Invalid,

    #[error("failed to sign token")]
    Sign,
}

/// Issues and validates session tokens.
pub trait TokenAuthority: Send + Sync {
    fn issue(&self, user_id: UserId, username: &str) -> Result<String, TokenError>;
    fn validate(&self, token: &str) -> Result<Claims, TokenError>;
}

/// HS256 implementation over a shared secret from configuration.
pub struct Hs256Tokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256Tokens {
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, Duration::days(TOKEN_TTL_DAYS))
    }

    /// Mainly for tests that need already-expired tokens.
    pub fn with_ttl(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }
}

impl TokenAuthority for Hs256Tokens {
    fn issue(&self, user_id: UserId, username: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| TokenError::Sign)
    }

    fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_validate_round_trips_claims() {
        let tokens = Hs256Tokens::new(b"test-secret");
        let token = tokens.issue(UserId::new(7), "alice").unwrap();

        let claims = tokens.validate(&token).unwrap();
        assert_eq!(claims.sub, UserId::new(7));
        assert_eq!(claims.username, "alice");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let tokens = Hs256Tokens::new(b"test-secret");
        let token = tokens.issue(UserId::new(7), "alice").unwrap();

        let mut tampered = token.into_bytes();
        let last = tampered.len() - 1;
        tampered[last] ^= 1;
        let tampered = String::from_utf8(tampered).unwrap();

        assert_eq!(tokens.validate(&tampered), Err(TokenError::Invalid));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = Hs256Tokens::new(b"secret-a");
        let verifier = Hs256Tokens::new(b"secret-b");
        let token = issuer.issue(UserId::new(1), "mallory").unwrap();

        assert_eq!(verifier.validate(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Issue with a TTL comfortably past the validator's leeway.
        let tokens = Hs256Tokens::with_ttl(b"test-secret", Duration::seconds(-120));
        let token = tokens.issue(UserId::new(1), "alice").unwrap();

        assert_eq!(tokens.validate(&token), Err(TokenError::Invalid));
    }
}
