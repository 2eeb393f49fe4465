//! Ledger operations: the one place balance-affecting requests are decided.
//!
//! Each operation resolves the caller's own rows, computes the new absolute
//! balance, and hands the store a matched pair (balance write + journal row)
//! to persist in a single unit of work.

use std::sync::Arc;

use chrono::Utc;

use vaultbank_core::{
    Account, AccountId, Card, CardId, Currency, Exchange, NewCard, NewExchange, NewTransaction,
    NewUserProfile, Settings, SettingsPatch, Transaction, User, UserId, card,
};

use crate::error::LedgerError;
use crate::provision;
use crate::store::{BalanceWrite, BankStore, Provisioned, StoreError};

/// A peer transaction to record against one of the caller's accounts.
///
/// The sign of `amount` is caller-supplied and trusted; there is no
/// overdraft guard on this path (unlike exchanges).
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub account_id: AccountId,
    pub amount: i64,
    pub name: String,
    pub category: String,
}

/// A currency conversion order.
///
/// `to_amount` is caller-supplied and is not recomputed from `rate`; the
/// rate is kept for audit only. Clients are assumed authenticated, not
/// adversarial.
#[derive(Debug, Clone)]
pub struct ExchangeOrder {
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub from_amount: i64,
    pub to_amount: i64,
    pub rate: Option<f64>,
}

/// The ledger consistency module over an injected store.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn BankStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn BankStore>) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &Arc<dyn BankStore> {
        &self.store
    }

    /// Register a new user: one user row, three starter accounts, one card,
    /// one settings row, created atomically.
    pub async fn register(&self, profile: NewUserProfile) -> Result<Provisioned, LedgerError> {
        let username = profile.username.trim().to_string();
        let full_name = profile.full_name.trim().to_string();
        if username.is_empty() || full_name.is_empty() {
            return Err(LedgerError::validation("username and full name are required"));
        }

        let profile = NewUserProfile {
            username,
            password_hash: profile.password_hash,
            full_name,
        };

        Ok(self
            .store
            .provision_user(
                profile,
                provision::seed_accounts(),
                provision::default_card(),
                Utc::now(),
            )
            .await?)
    }

    pub async fn user(&self, id: UserId) -> Result<User, LedgerError> {
        self.store
            .user_by_id(id)
            .await?
            .ok_or(LedgerError::UserNotFound)
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>, LedgerError> {
        Ok(self.store.user_by_username(username).await?)
    }

    pub async fn accounts(&self, user_id: UserId) -> Result<Vec<Account>, LedgerError> {
        Ok(self.store.accounts_for_user(user_id).await?)
    }

    pub async fn account(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<Account, LedgerError> {
        let accounts = self.store.accounts_for_user(user_id).await?;
        accounts
            .into_iter()
            .find(|a| a.id == account_id)
            .ok_or(LedgerError::AccountNotFound)
    }

    /// Overwrite one balance with an absolute value.
    ///
    /// Ownership is checked by equality of the stored owner id; a mismatch
    /// and a nonexistent account fail identically.
    pub async fn adjust_balance(
        &self,
        user_id: UserId,
        account_id: AccountId,
        new_balance: i64,
    ) -> Result<Account, LedgerError> {
        Ok(self
            .store
            .set_balance(BalanceWrite {
                account_id,
                user_id,
                new_balance,
            })
            .await?)
    }

    /// Record a transaction: balance moves by `amount` and exactly one
    /// journal row is written, atomically.
    pub async fn record_transaction(
        &self,
        user_id: UserId,
        request: TransactionRequest,
    ) -> Result<(Account, Transaction), LedgerError> {
        if request.name.trim().is_empty() {
            return Err(LedgerError::validation("transaction name is required"));
        }

        let account = self.account(user_id, request.account_id).await?;
        let new_balance = account
            .balance
            .checked_add(request.amount)
            .ok_or_else(|| LedgerError::validation("amount overflows account balance"))?;

        Ok(self
            .store
            .apply_transaction(
                BalanceWrite {
                    account_id: account.id,
                    user_id,
                    new_balance,
                },
                NewTransaction {
                    user_id,
                    account_id: account.id,
                    name: request.name.trim().to_string(),
                    amount: request.amount,
                    currency: account.currency,
                    category: request.category,
                    created_at: Utc::now(),
                },
            )
            .await?)
    }

    /// Execute a currency exchange: both balances move and exactly one
    /// exchange row is written, or nothing is.
    pub async fn execute_exchange(
        &self,
        user_id: UserId,
        order: ExchangeOrder,
    ) -> Result<Exchange, LedgerError> {
        if order.from_currency == order.to_currency {
            return Err(LedgerError::validation(
                "cannot exchange a currency into itself",
            ));
        }
        if order.from_amount <= 0 || order.to_amount <= 0 {
            return Err(LedgerError::validation("exchange amounts must be positive"));
        }

        let accounts = self.store.accounts_for_user(user_id).await?;
        let from = accounts
            .iter()
            .find(|a| a.currency == order.from_currency)
            .ok_or_else(|| LedgerError::NoCurrencyAccount(order.from_currency.clone()))?;
        let to = accounts
            .iter()
            .find(|a| a.currency == order.to_currency)
            .ok_or_else(|| LedgerError::NoCurrencyAccount(order.to_currency.clone()))?;

        if from.balance < order.from_amount {
            return Err(LedgerError::InsufficientFunds {
                available: from.balance,
                requested: order.from_amount,
            });
        }

        let credited = to
            .balance
            .checked_add(order.to_amount)
            .ok_or_else(|| LedgerError::validation("amount overflows account balance"))?;

        let rate = order
            .rate
            .unwrap_or(order.to_amount as f64 / order.from_amount as f64);

        Ok(self
            .store
            .apply_exchange(
                BalanceWrite {
                    account_id: from.id,
                    user_id,
                    new_balance: from.balance - order.from_amount,
                },
                BalanceWrite {
                    account_id: to.id,
                    user_id,
                    new_balance: credited,
                },
                NewExchange {
                    user_id,
                    from_currency: order.from_currency,
                    to_currency: order.to_currency,
                    from_amount: order.from_amount,
                    to_amount: order.to_amount,
                    rate,
                    created_at: Utc::now(),
                },
            )
            .await?)
    }

    pub async fn transactions(&self, user_id: UserId) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.store.transactions_for_user(user_id).await?)
    }

    pub async fn exchanges(&self, user_id: UserId) -> Result<Vec<Exchange>, LedgerError> {
        Ok(self.store.exchanges_for_user(user_id).await?)
    }

    pub async fn cards(&self, user_id: UserId) -> Result<Vec<Card>, LedgerError> {
        Ok(self.store.cards_for_user(user_id).await?)
    }

    /// Issue a card against one of the caller's accounts.
    pub async fn issue_card(
        &self,
        user_id: UserId,
        account_id: AccountId,
        name: String,
    ) -> Result<Card, LedgerError> {
        if name.trim().is_empty() {
            return Err(LedgerError::validation("card name is required"));
        }

        // Ownership check before insert; the card must reference an account
        // of the same user.
        let account = self.account(user_id, account_id).await?;

        Ok(self
            .store
            .insert_card(
                user_id,
                NewCard {
                    account_id: account.id,
                    name: name.trim().to_string(),
                    expires: card::default_expiry(Utc::now()),
                    spending_limit: provision::DEFAULT_SPENDING_LIMIT,
                },
            )
            .await?)
    }

    pub async fn set_card_frozen(
        &self,
        user_id: UserId,
        card_id: CardId,
        frozen: bool,
    ) -> Result<Card, LedgerError> {
        self.store
            .set_card_frozen(card_id, user_id, frozen)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => LedgerError::CardNotFound,
                other => other.into(),
            })
    }

    pub async fn settings(&self, user_id: UserId) -> Result<Settings, LedgerError> {
        self.store
            .settings_for_user(user_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => LedgerError::UserNotFound,
                other => other.into(),
            })
    }

    pub async fn update_settings(
        &self,
        user_id: UserId,
        patch: SettingsPatch,
    ) -> Result<Settings, LedgerError> {
        self.store
            .update_settings(user_id, patch)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => LedgerError::UserNotFound,
                other => other.into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBankStore;
    use proptest::prelude::*;

    fn ledger() -> Ledger {
        Ledger::new(Arc::new(InMemoryBankStore::new()))
    }

    fn profile(username: &str) -> NewUserProfile {
        NewUserProfile {
            username: username.to_string(),
            password_hash: "$argon2id$test".to_string(),
            full_name: "Test User".to_string(),
        }
    }

    async fn register(ledger: &Ledger, username: &str) -> Provisioned {
        ledger.register(profile(username)).await.unwrap()
    }

    fn balance_of(accounts: &[Account], currency: &Currency) -> i64 {
        accounts
            .iter()
            .find(|a| &a.currency == currency)
            .expect("account for currency")
            .balance
    }

    #[tokio::test]
    async fn registration_provisions_the_seed_bundle() {
        let ledger = ledger();
        let provisioned = register(&ledger, "alice").await;

        assert_eq!(provisioned.accounts.len(), 3);
        assert_eq!(balance_of(&provisioned.accounts, &Currency::EUR), 24_856);
        assert_eq!(balance_of(&provisioned.accounts, &Currency::USD), 12_342);
        assert_eq!(balance_of(&provisioned.accounts, &Currency::GBP), 8_761);

        assert!(!provisioned.card.is_frozen);
        assert_eq!(provisioned.card.account_id, provisioned.accounts[0].id);
        assert_eq!(provisioned.settings.user_id, provisioned.user.id);
        assert!(provisioned.settings.payment_alerts);
        assert!(!provisioned.settings.two_factor);
        assert_eq!(provisioned.user.account_number, "VB-0000000001");
    }

    #[tokio::test]
    async fn registration_rejects_blank_names() {
        let ledger = ledger();
        let err = ledger
            .register(NewUserProfile {
                username: "  ".to_string(),
                password_hash: "$argon2id$test".to_string(),
                full_name: "Someone".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_username_is_surfaced() {
        let ledger = ledger();
        register(&ledger, "alice").await;

        let err = ledger.register(profile("alice")).await.unwrap_err();
        assert!(matches!(err, LedgerError::UsernameTaken));
    }

    #[tokio::test]
    async fn balance_adjustment_rejects_cross_user_access() {
        let ledger = ledger();
        let alice = register(&ledger, "alice").await;
        let bob = register(&ledger, "bob").await;

        let err = ledger
            .adjust_balance(bob.user.id, alice.accounts[0].id, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound));

        let accounts = ledger.accounts(alice.user.id).await.unwrap();
        assert_eq!(balance_of(&accounts, &Currency::EUR), 24_856);
    }

    #[tokio::test]
    async fn record_transaction_moves_balance_and_journals_once() {
        let ledger = ledger();
        let alice = register(&ledger, "alice").await;
        let eur = alice.accounts[0].clone();

        let (account, row) = ledger
            .record_transaction(
                alice.user.id,
                TransactionRequest {
                    account_id: eur.id,
                    amount: -250,
                    name: "Groceries".to_string(),
                    category: "shopping".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(account.balance, 24_606);
        assert_eq!(row.amount, -250);
        assert_eq!(row.currency, Currency::EUR);

        let journal = ledger.transactions(alice.user.id).await.unwrap();
        assert_eq!(journal.len(), 1);
    }

    #[tokio::test]
    async fn record_transaction_has_no_overdraft_guard() {
        let ledger = ledger();
        let alice = register(&ledger, "alice").await;

        let (account, _) = ledger
            .record_transaction(
                alice.user.id,
                TransactionRequest {
                    account_id: alice.accounts[2].id,
                    amount: -50_000,
                    name: "Wire out".to_string(),
                    category: "transfer".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(account.balance, 8_761 - 50_000);
    }

    #[tokio::test]
    async fn exchange_round_trip_matches_the_reference_scenario() {
        let ledger = ledger();
        let alice = register(&ledger, "alice").await;

        let exchange = ledger
            .execute_exchange(
                alice.user.id,
                ExchangeOrder {
                    from_currency: Currency::EUR,
                    to_currency: Currency::USD,
                    from_amount: 100,
                    to_amount: 106,
                    rate: Some(1.06),
                },
            )
            .await
            .unwrap();

        assert_eq!(exchange.rate, 1.06);

        let accounts = ledger.accounts(alice.user.id).await.unwrap();
        assert_eq!(balance_of(&accounts, &Currency::EUR), 24_756);
        assert_eq!(balance_of(&accounts, &Currency::USD), 12_448);

        let exchanges = ledger.exchanges(alice.user.id).await.unwrap();
        assert_eq!(exchanges.len(), 1);
    }

    #[tokio::test]
    async fn insufficient_funds_blocks_the_exchange_without_mutation() {
        let ledger = ledger();
        let alice = register(&ledger, "alice").await;

        let err = ledger
            .execute_exchange(
                alice.user.id,
                ExchangeOrder {
                    from_currency: Currency::GBP,
                    to_currency: Currency::EUR,
                    from_amount: 9_000,
                    to_amount: 10_400,
                    rate: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { available: 8_761, .. }));

        let accounts = ledger.accounts(alice.user.id).await.unwrap();
        assert_eq!(balance_of(&accounts, &Currency::GBP), 8_761);
        assert_eq!(balance_of(&accounts, &Currency::EUR), 24_856);
        assert!(ledger.exchanges(alice.user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn exchange_fails_per_missing_currency_side() {
        let ledger = ledger();
        let alice = register(&ledger, "alice").await;

        let chf = Currency::parse("CHF").unwrap();
        let err = ledger
            .execute_exchange(
                alice.user.id,
                ExchangeOrder {
                    from_currency: chf.clone(),
                    to_currency: Currency::EUR,
                    from_amount: 10,
                    to_amount: 10,
                    rate: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NoCurrencyAccount(c) if c == chf));
    }

    #[tokio::test]
    async fn exchange_into_the_same_currency_is_rejected() {
        let ledger = ledger();
        let alice = register(&ledger, "alice").await;

        let err = ledger
            .execute_exchange(
                alice.user.id,
                ExchangeOrder {
                    from_currency: Currency::EUR,
                    to_currency: Currency::EUR,
                    from_amount: 10,
                    to_amount: 10,
                    rate: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn card_freeze_is_owner_scoped() {
        let ledger = ledger();
        let alice = register(&ledger, "alice").await;
        let bob = register(&ledger, "bob").await;

        let frozen = ledger
            .set_card_frozen(alice.user.id, alice.card.id, true)
            .await
            .unwrap();
        assert!(frozen.is_frozen);

        let err = ledger
            .set_card_frozen(bob.user.id, alice.card.id, false)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::CardNotFound));
    }

    #[tokio::test]
    async fn issued_card_must_reference_own_account() {
        let ledger = ledger();
        let alice = register(&ledger, "alice").await;
        let bob = register(&ledger, "bob").await;

        let err = ledger
            .issue_card(bob.user.id, alice.accounts[0].id, "Travel Card".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound));
    }

    #[tokio::test]
    async fn settings_patch_preserves_untouched_fields() {
        let ledger = ledger();
        let alice = register(&ledger, "alice").await;

        let updated = ledger
            .update_settings(
                alice.user.id,
                SettingsPatch {
                    two_factor: Some(true),
                    ..SettingsPatch::default()
                },
            )
            .await
            .unwrap();

        assert!(updated.two_factor);
        assert!(updated.payment_alerts);

        let fetched = ledger.settings(alice.user.id).await.unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn reads_are_owner_scoped() {
        let ledger = ledger();
        let alice = register(&ledger, "alice").await;
        let bob = register(&ledger, "bob").await;

        ledger
            .record_transaction(
                alice.user.id,
                TransactionRequest {
                    account_id: alice.accounts[0].id,
                    amount: -10,
                    name: "Coffee".to_string(),
                    category: "food".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(ledger.transactions(bob.user.id).await.unwrap().is_empty());
        let accounts = ledger.accounts(bob.user.id).await.unwrap();
        assert!(accounts.iter().all(|a| a.user_id == bob.user.id));
    }

    // Property coverage runs the async ledger on a current-thread runtime
    // inside each proptest case.
    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("build runtime")
            .block_on(future)
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// For any sequence of valid EUR->USD exchanges, total EUR spent and
        /// USD received equal the journaled sums, and one row exists per
        /// exchange.
        #[test]
        fn exchange_journal_explains_balance_movement(
            orders in prop::collection::vec((1i64..200, 1i64..220), 1..12)
        ) {
            block_on(async {
                let ledger = ledger();
                let alice = register(&ledger, "alice").await;

                for (from_amount, to_amount) in &orders {
                    ledger
                        .execute_exchange(
                            alice.user.id,
                            ExchangeOrder {
                                from_currency: Currency::EUR,
                                to_currency: Currency::USD,
                                from_amount: *from_amount,
                                to_amount: *to_amount,
                                rate: None,
                            },
                        )
                        .await
                        .unwrap();
                }

                let accounts = ledger.accounts(alice.user.id).await.unwrap();
                let journal = ledger.exchanges(alice.user.id).await.unwrap();

                let spent: i64 = journal.iter().map(|e| e.from_amount).sum();
                let received: i64 = journal.iter().map(|e| e.to_amount).sum();

                prop_assert_eq!(journal.len(), orders.len());
                prop_assert_eq!(balance_of(&accounts, &Currency::EUR), 24_856 - spent);
                prop_assert_eq!(balance_of(&accounts, &Currency::USD), 12_342 + received);
                Ok(())
            })?;
        }

        /// For any sequence of signed transactions, the final balance equals
        /// the seed plus the journaled sum.
        #[test]
        fn transaction_journal_explains_balance(
            amounts in prop::collection::vec(-500i64..500, 1..16)
        ) {
            block_on(async {
                let ledger = ledger();
                let alice = register(&ledger, "alice").await;
                let eur = alice.accounts[0].id;

                for amount in &amounts {
                    ledger
                        .record_transaction(
                            alice.user.id,
                            TransactionRequest {
                                account_id: eur,
                                amount: *amount,
                                name: "entry".to_string(),
                                category: "misc".to_string(),
                            },
                        )
                        .await
                        .unwrap();
                }

                let accounts = ledger.accounts(alice.user.id).await.unwrap();
                let journal = ledger.transactions(alice.user.id).await.unwrap();
                let journaled: i64 = journal.iter().map(|t| t.amount).sum();

                prop_assert_eq!(journal.len(), amounts.len());
                prop_assert_eq!(balance_of(&accounts, &Currency::EUR), 24_856 + journaled);
                Ok(())
            })?;
        }
    }
}
