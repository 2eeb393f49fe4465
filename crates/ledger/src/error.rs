//! Ledger-level error model.

use thiserror::Error;

use vaultbank_core::{Currency, DomainError};

use crate::store::StoreError;

/// Failure of a ledger operation.
///
/// Note that [`LedgerError::AccountNotFound`] deliberately covers both a
/// nonexistent account and an ownership mismatch; the two are
/// indistinguishable to callers.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("username already registered")]
    UsernameTaken,

    #[error("user not found")]
    UserNotFound,

    #[error("account not found")]
    AccountNotFound,

    #[error("no {0} account for user")]
    NoCurrencyAccount(Currency),

    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: i64, requested: i64 },

    #[error("card not found")]
    CardNotFound,

    #[error("admin access required")]
    AdminRequired,

    #[error("storage failure")]
    Storage(#[source] anyhow::Error),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<DomainError> for LedgerError {
    fn from(err: DomainError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            // Default mapping; call sites dealing with cards/users/settings
            // override this before converting.
            StoreError::NotFound => Self::AccountNotFound,
            StoreError::DuplicateUsername => Self::UsernameTaken,
            StoreError::Backend(e) => Self::Storage(e),
        }
    }
}
