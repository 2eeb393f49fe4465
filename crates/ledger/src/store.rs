//! Storage port for the ledger.
//!
//! Implementations: [`crate::memory::InMemoryBankStore`] (dev/test) and the
//! Postgres adapter in `vaultbank-infra`, selected at process startup and
//! injected — never reached through ambient global state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use vaultbank_core::{
    Account, AccountId, Card, CardId, CardSpec, Exchange, NewAccount, NewCard, NewExchange,
    NewTransaction, NewUserProfile, Settings, SettingsPatch, Transaction, User, UserId, UserStatus,
};

/// One absolute balance overwrite, owner-checked.
///
/// A write matches only the row whose id AND owner both agree; a miss on
/// either is the same `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceWrite {
    pub account_id: AccountId,
    pub user_id: UserId,
    pub new_balance: i64,
}

/// Everything created by one registration.
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub user: User,
    pub accounts: Vec<Account>,
    pub card: Card,
    pub settings: Settings,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched (including ownership mismatches).
    #[error("row not found")]
    NotFound,

    #[error("username already registered")]
    DuplicateUsername,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// The relational store behind the ledger.
///
/// Contract for every multi-row method (`provision_user`,
/// `apply_transaction`, `apply_exchange`): all writes land or none do.
#[async_trait]
pub trait BankStore: Send + Sync {
    /// Atomically create the user plus their starter accounts, card, and
    /// settings row. Ids, the account number, the masked card number, and
    /// the card expiry are assigned here, where the ids exist.
    async fn provision_user(
        &self,
        profile: NewUserProfile,
        accounts: Vec<NewAccount>,
        card: CardSpec,
        registered_at: DateTime<Utc>,
    ) -> Result<Provisioned, StoreError>;

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// All users, in insertion order.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn set_user_status(&self, id: UserId, status: UserStatus) -> Result<User, StoreError>;

    /// The user's accounts, in insertion order.
    async fn accounts_for_user(&self, user_id: UserId) -> Result<Vec<Account>, StoreError>;

    /// Overwrite one balance with an absolute value.
    async fn set_balance(&self, write: BalanceWrite) -> Result<Account, StoreError>;

    /// Atomic pair: balance write + one transaction row.
    async fn apply_transaction(
        &self,
        write: BalanceWrite,
        journal: NewTransaction,
    ) -> Result<(Account, Transaction), StoreError>;

    /// Atomic triple: two balance writes + one exchange row. If either
    /// write misses, nothing is persisted.
    async fn apply_exchange(
        &self,
        debit: BalanceWrite,
        credit: BalanceWrite,
        record: NewExchange,
    ) -> Result<Exchange, StoreError>;

    async fn transactions_for_user(&self, user_id: UserId) -> Result<Vec<Transaction>, StoreError>;

    async fn exchanges_for_user(&self, user_id: UserId) -> Result<Vec<Exchange>, StoreError>;

    async fn insert_card(&self, user_id: UserId, card: NewCard) -> Result<Card, StoreError>;

    async fn cards_for_user(&self, user_id: UserId) -> Result<Vec<Card>, StoreError>;

    async fn set_card_frozen(
        &self,
        card_id: CardId,
        user_id: UserId,
        frozen: bool,
    ) -> Result<Card, StoreError>;

    async fn settings_for_user(&self, user_id: UserId) -> Result<Settings, StoreError>;

    async fn update_settings(
        &self,
        user_id: UserId,
        patch: SettingsPatch,
    ) -> Result<Settings, StoreError>;
}
