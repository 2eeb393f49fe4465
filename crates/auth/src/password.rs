//! Credential verifier: Argon2id with a per-password random salt.
//!
//! Digests are PHC strings, so the salt and parameters travel with the
//! digest and verification needs no out-of-band state.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("failed to derive password digest")]
    Derive,

    /// The stored digest could not be parsed. This indicates data
    /// corruption, not a wrong password.
    #[error("stored password digest is malformed")]
    MalformedDigest,
}

/// Derive a verifiable digest from a plaintext password.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|digest| digest.to_string())
        .map_err(|_| CredentialError::Derive)
}

/// Check a plaintext password against a stored digest.
///
/// A wrong password is `Ok(false)`, never an error; `Err` is reserved for a
/// digest that cannot be parsed. Comparison is constant-time.
pub fn verify_password(password: &str, digest: &str) -> Result<bool, CredentialError> {
    let parsed = PasswordHash::new(digest).map_err(|_| CredentialError::MalformedDigest)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(_) => Err(CredentialError::MalformedDigest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_accepts_the_password() {
        let digest = hash_password("pw123456").unwrap();
        assert!(verify_password("pw123456", &digest).unwrap());
    }

    #[test]
    fn wrong_password_is_false_not_an_error() {
        let digest = hash_password("pw123456").unwrap();
        assert_eq!(verify_password("pw1234567", &digest), Ok(false));
    }

    #[test]
    fn salts_are_per_password() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_digest_is_fatal() {
        let err = verify_password("pw", "not-a-phc-string").unwrap_err();
        assert_eq!(err, CredentialError::MalformedDigest);
    }
}
