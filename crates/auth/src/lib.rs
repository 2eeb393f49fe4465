//! `vaultbank-auth` — pure authentication boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: password
//! digests in, verification results out; claims in, signed tokens out.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password, CredentialError};
pub use token::{Claims, Hs256Tokens, TokenAuthority, TokenError, TOKEN_TTL_DAYS};
