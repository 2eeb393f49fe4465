//! In-memory store for dev/test.
//!
//! An arena of entities keyed by monotonically assigned integer ids. Every
//! trait method takes the state lock exactly once, so the multi-row applies
//! are atomic and two concurrent mutations of the same account cannot
//! interleave inside one operation. Not optimized for performance.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use vaultbank_core::{
    card, user, Account, AccountId, Card, CardId, CardSpec, Exchange, ExchangeId, NewAccount,
    NewCard, NewExchange, NewTransaction, NewUserProfile, Settings, SettingsId, SettingsPatch,
    Transaction, TransactionId, User, UserId, UserStatus,
};

use crate::store::{BalanceWrite, BankStore, Provisioned, StoreError};

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
    cards: Vec<Card>,
    exchanges: Vec<Exchange>,
    settings: Vec<Settings>,
    next_user: i64,
    next_account: i64,
    next_transaction: i64,
    next_card: i64,
    next_exchange: i64,
    next_settings: i64,
}

impl State {
    fn account_mut(&mut self, write: &BalanceWrite) -> Option<&mut Account> {
        self.accounts
            .iter_mut()
            .find(|a| a.id == write.account_id && a.user_id == write.user_id)
    }
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// In-memory [`BankStore`] implementation.
#[derive(Debug, Default)]
pub struct InMemoryBankStore {
    inner: Mutex<State>,
}

impl InMemoryBankStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend(anyhow::anyhow!("state lock poisoned")))
    }
}

#[async_trait]
impl BankStore for InMemoryBankStore {
    async fn provision_user(
        &self,
        profile: NewUserProfile,
        accounts: Vec<NewAccount>,
        card: CardSpec,
        registered_at: DateTime<Utc>,
    ) -> Result<Provisioned, StoreError> {
        let mut state = self.state()?;

        if state.users.iter().any(|u| u.username == profile.username) {
            return Err(StoreError::DuplicateUsername);
        }

        let user_id = UserId::new(next(&mut state.next_user));
        let new_user = User {
            id: user_id,
            username: profile.username,
            password_hash: profile.password_hash,
            full_name: profile.full_name,
            account_number: user::account_number(user_id),
            status: UserStatus::Active,
            member_since: registered_at,
        };
        state.users.push(new_user.clone());

        let mut created_accounts = Vec::with_capacity(accounts.len());
        for account in accounts {
            let id = AccountId::new(next(&mut state.next_account));
            let account = Account {
                id,
                user_id,
                name: account.name,
                currency: account.currency,
                balance: account.balance,
            };
            state.accounts.push(account.clone());
            created_accounts.push(account);
        }

        // The starter card references the first provisioned account.
        let card_account = created_accounts
            .first()
            .ok_or_else(|| StoreError::Backend(anyhow::anyhow!("provisioning without accounts")))?;
        let card_id = CardId::new(next(&mut state.next_card));
        let new_card = Card {
            id: card_id,
            user_id,
            account_id: card_account.id,
            name: card.name,
            card_number: card::masked_number(card_id),
            expires: card::default_expiry(registered_at),
            is_frozen: false,
            spending_limit: card.spending_limit,
        };
        state.cards.push(new_card.clone());

        let settings = Settings::provisioned(SettingsId::new(next(&mut state.next_settings)), user_id);
        state.settings.push(settings);

        Ok(Provisioned {
            user: new_user,
            accounts: created_accounts,
            card: new_card,
            settings,
        })
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let state = self.state()?;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let state = self.state()?;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let state = self.state()?;
        Ok(state.users.clone())
    }

    async fn set_user_status(&self, id: UserId, status: UserStatus) -> Result<User, StoreError> {
        let mut state = self.state()?;
        let found = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        found.status = status;
        Ok(found.clone())
    }

    async fn accounts_for_user(&self, user_id: UserId) -> Result<Vec<Account>, StoreError> {
        let state = self.state()?;
        Ok(state
            .accounts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn set_balance(&self, write: BalanceWrite) -> Result<Account, StoreError> {
        let mut state = self.state()?;
        let account = state.account_mut(&write).ok_or(StoreError::NotFound)?;
        account.balance = write.new_balance;
        Ok(account.clone())
    }

    async fn apply_transaction(
        &self,
        write: BalanceWrite,
        journal: NewTransaction,
    ) -> Result<(Account, Transaction), StoreError> {
        let mut state = self.state()?;

        let account = state.account_mut(&write).ok_or(StoreError::NotFound)?;
        account.balance = write.new_balance;
        let account = account.clone();

        let row = Transaction {
            id: TransactionId::new(next(&mut state.next_transaction)),
            user_id: journal.user_id,
            account_id: journal.account_id,
            name: journal.name,
            amount: journal.amount,
            currency: journal.currency,
            category: journal.category,
            created_at: journal.created_at,
        };
        state.transactions.push(row.clone());

        Ok((account, row))
    }

    async fn apply_exchange(
        &self,
        debit: BalanceWrite,
        credit: BalanceWrite,
        record: NewExchange,
    ) -> Result<Exchange, StoreError> {
        let mut state = self.state()?;

        // Resolve both rows before mutating either; a miss on one side must
        // leave no partial state behind.
        let debit_idx = state
            .accounts
            .iter()
            .position(|a| a.id == debit.account_id && a.user_id == debit.user_id)
            .ok_or(StoreError::NotFound)?;
        let credit_idx = state
            .accounts
            .iter()
            .position(|a| a.id == credit.account_id && a.user_id == credit.user_id)
            .ok_or(StoreError::NotFound)?;

        state.accounts[debit_idx].balance = debit.new_balance;
        state.accounts[credit_idx].balance = credit.new_balance;

        let row = Exchange {
            id: ExchangeId::new(next(&mut state.next_exchange)),
            user_id: record.user_id,
            from_currency: record.from_currency,
            to_currency: record.to_currency,
            from_amount: record.from_amount,
            to_amount: record.to_amount,
            rate: record.rate,
            created_at: record.created_at,
        };
        state.exchanges.push(row.clone());

        Ok(row)
    }

    async fn transactions_for_user(&self, user_id: UserId) -> Result<Vec<Transaction>, StoreError> {
        let state = self.state()?;
        Ok(state
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn exchanges_for_user(&self, user_id: UserId) -> Result<Vec<Exchange>, StoreError> {
        let state = self.state()?;
        Ok(state
            .exchanges
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_card(&self, user_id: UserId, card: NewCard) -> Result<Card, StoreError> {
        let mut state = self.state()?;
        let card_id = CardId::new(next(&mut state.next_card));
        let row = Card {
            id: card_id,
            user_id,
            account_id: card.account_id,
            name: card.name,
            card_number: card::masked_number(card_id),
            expires: card.expires,
            is_frozen: false,
            spending_limit: card.spending_limit,
        };
        state.cards.push(row.clone());
        Ok(row)
    }

    async fn cards_for_user(&self, user_id: UserId) -> Result<Vec<Card>, StoreError> {
        let state = self.state()?;
        Ok(state
            .cards
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn set_card_frozen(
        &self,
        card_id: CardId,
        user_id: UserId,
        frozen: bool,
    ) -> Result<Card, StoreError> {
        let mut state = self.state()?;
        let found = state
            .cards
            .iter_mut()
            .find(|c| c.id == card_id && c.user_id == user_id)
            .ok_or(StoreError::NotFound)?;
        found.is_frozen = frozen;
        Ok(found.clone())
    }

    async fn settings_for_user(&self, user_id: UserId) -> Result<Settings, StoreError> {
        let state = self.state()?;
        state
            .settings
            .iter()
            .find(|s| s.user_id == user_id)
            .copied()
            .ok_or(StoreError::NotFound)
    }

    async fn update_settings(
        &self,
        user_id: UserId,
        patch: SettingsPatch,
    ) -> Result<Settings, StoreError> {
        let mut state = self.state()?;
        let found = state
            .settings
            .iter_mut()
            .find(|s| s.user_id == user_id)
            .ok_or(StoreError::NotFound)?;
        found.apply(&patch);
        Ok(*found)
    }
}
