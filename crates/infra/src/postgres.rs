//! Postgres-backed bank store.
//!
//! Ownership isolation is enforced at the database level: every mutation
//! includes the owner id in its WHERE clause, so a cross-user write matches
//! zero rows and fails exactly like a nonexistent one. The multi-row
//! methods (`provision_user`, `apply_transaction`, `apply_exchange`) each
//! run inside one database transaction; a miss on any step rolls the whole
//! unit back.
//!
//! ## Error Mapping
//!
//! | SQLx error | PostgreSQL code | StoreError | Scenario |
//! |------------|-----------------|------------|----------|
//! | RowNotFound | N/A | `NotFound` | Owner-scoped lookup/write matched no row |
//! | Database (unique violation) | `23505` | `DuplicateUsername` | Username already registered |
//! | Anything else | Any | `Backend` | Connection failures, pool closed, etc. |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use vaultbank_core::{
    card, user, Account, AccountId, Card, CardId, CardSpec, Currency, Exchange, NewAccount,
    NewCard, NewExchange, NewTransaction, NewUserProfile, Settings, SettingsPatch, Transaction,
    User, UserId, UserStatus,
};
use vaultbank_ledger::{BalanceWrite, BankStore, Provisioned, StoreError};

const SCHEMA: &str = include_str!("schema.sql");

/// Postgres implementation of the ledger's storage port.
///
/// Uses the SQLx connection pool, which handles thread-safe connection
/// management; the store itself is stateless and cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresBankStore {
    pool: PgPool,
}

impl PostgresBankStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the schema if it does not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            StoreError::DuplicateUsername
        }
        _ => {
            tracing::warn!("sqlx error during {operation}: {e}");
            StoreError::Backend(anyhow::Error::new(e))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    full_name: String,
    account_number: String,
    status: String,
    member_since: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let status = UserStatus::parse(&row.status)
            .ok_or_else(|| StoreError::Backend(anyhow::anyhow!("unknown user status '{}'", row.status)))?;
        Ok(User {
            id: UserId::new(row.id),
            username: row.username,
            password_hash: row.password_hash,
            full_name: row.full_name,
            account_number: row.account_number,
            status,
            member_since: row.member_since,
        })
    }
}

#[derive(Debug, FromRow)]
struct AccountRow {
    id: i64,
    user_id: i64,
    name: String,
    currency: String,
    balance: i64,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: AccountId::new(row.id),
            user_id: UserId::new(row.user_id),
            name: row.name,
            currency: parse_currency(&row.currency)?,
            balance: row.balance,
        })
    }
}

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: i64,
    user_id: i64,
    account_id: i64,
    name: String,
    amount: i64,
    currency: String,
    category: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction {
            id: row.id.into(),
            user_id: UserId::new(row.user_id),
            account_id: AccountId::new(row.account_id),
            name: row.name,
            amount: row.amount,
            currency: parse_currency(&row.currency)?,
            category: row.category,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct CardRow {
    id: i64,
    user_id: i64,
    account_id: i64,
    name: String,
    card_number: String,
    expires: String,
    is_frozen: bool,
    spending_limit: i64,
}

impl From<CardRow> for Card {
    fn from(row: CardRow) -> Self {
        Card {
            id: CardId::new(row.id),
            user_id: UserId::new(row.user_id),
            account_id: AccountId::new(row.account_id),
            name: row.name,
            card_number: row.card_number,
            expires: row.expires,
            is_frozen: row.is_frozen,
            spending_limit: row.spending_limit,
        }
    }
}

#[derive(Debug, FromRow)]
struct ExchangeRow {
    id: i64,
    user_id: i64,
    from_currency: String,
    to_currency: String,
    from_amount: i64,
    to_amount: i64,
    rate: f64,
    created_at: DateTime<Utc>,
}

impl TryFrom<ExchangeRow> for Exchange {
    type Error = StoreError;

    fn try_from(row: ExchangeRow) -> Result<Self, Self::Error> {
        Ok(Exchange {
            id: row.id.into(),
            user_id: UserId::new(row.user_id),
            from_currency: parse_currency(&row.from_currency)?,
            to_currency: parse_currency(&row.to_currency)?,
            from_amount: row.from_amount,
            to_amount: row.to_amount,
            rate: row.rate,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SettingsRow {
    id: i64,
    user_id: i64,
    payment_alerts: bool,
    exchange_alerts: bool,
    login_alerts: bool,
    two_factor: bool,
}

impl From<SettingsRow> for Settings {
    fn from(row: SettingsRow) -> Self {
        Settings {
            id: row.id.into(),
            user_id: UserId::new(row.user_id),
            payment_alerts: row.payment_alerts,
            exchange_alerts: row.exchange_alerts,
            login_alerts: row.login_alerts,
            two_factor: row.two_factor,
        }
    }
}

fn parse_currency(code: &str) -> Result<Currency, StoreError> {
    Currency::parse(code)
        .map_err(|e| StoreError::Backend(anyhow::anyhow!("corrupt currency column: {e}")))
}

// ─────────────────────────────────────────────────────────────────────────────
// BankStore implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl BankStore for PostgresBankStore {
    async fn provision_user(
        &self,
        profile: NewUserProfile,
        accounts: Vec<NewAccount>,
        card_spec: CardSpec,
        registered_at: DateTime<Utc>,
    ) -> Result<Provisioned, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("provision_user", e))?;

        // Two-step insert: the account number is derived from the id the
        // database just assigned.
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (username, password_hash, full_name, account_number, status, member_since)
            VALUES ($1, $2, $3, '', $4, $5)
            RETURNING id, username, password_hash, full_name, account_number, status, member_since
            "#,
        )
        .bind(&profile.username)
        .bind(&profile.password_hash)
        .bind(&profile.full_name)
        .bind(UserStatus::Active.as_str())
        .bind(registered_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("provision_user", e))?;

        let user_id = UserId::new(row.id);
        let row: UserRow = sqlx::query_as(
            r#"
            UPDATE users SET account_number = $1 WHERE id = $2
            RETURNING id, username, password_hash, full_name, account_number, status, member_since
            "#,
        )
        .bind(user::account_number(user_id))
        .bind(row.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("provision_user", e))?;
        let created_user = User::try_from(row)?;

        let mut created_accounts = Vec::with_capacity(accounts.len());
        for account in accounts {
            let row: AccountRow = sqlx::query_as(
                r#"
                INSERT INTO accounts (user_id, name, currency, balance)
                VALUES ($1, $2, $3, $4)
                RETURNING id, user_id, name, currency, balance
                "#,
            )
            .bind(user_id.as_i64())
            .bind(&account.name)
            .bind(account.currency.as_str())
            .bind(account.balance)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("provision_user", e))?;
            created_accounts.push(Account::try_from(row)?);
        }

        let card_account = created_accounts
            .first()
            .ok_or_else(|| StoreError::Backend(anyhow::anyhow!("provisioning without accounts")))?;

        // Same two-step pattern for the masked card number.
        let row: CardRow = sqlx::query_as(
            r#"
            INSERT INTO cards (user_id, account_id, name, card_number, expires, is_frozen, spending_limit)
            VALUES ($1, $2, $3, '', $4, FALSE, $5)
            RETURNING id, user_id, account_id, name, card_number, expires, is_frozen, spending_limit
            "#,
        )
        .bind(user_id.as_i64())
        .bind(card_account.id.as_i64())
        .bind(&card_spec.name)
        .bind(card::default_expiry(registered_at))
        .bind(card_spec.spending_limit)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("provision_user", e))?;

        let row: CardRow = sqlx::query_as(
            r#"
            UPDATE cards SET card_number = $1 WHERE id = $2
            RETURNING id, user_id, account_id, name, card_number, expires, is_frozen, spending_limit
            "#,
        )
        .bind(card::masked_number(CardId::new(row.id)))
        .bind(row.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("provision_user", e))?;
        let created_card = Card::from(row);

        let row: SettingsRow = sqlx::query_as(
            r#"
            INSERT INTO settings (user_id, payment_alerts, exchange_alerts, login_alerts, two_factor)
            VALUES ($1, TRUE, TRUE, TRUE, FALSE)
            RETURNING id, user_id, payment_alerts, exchange_alerts, login_alerts, two_factor
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("provision_user", e))?;
        let created_settings = Settings::from(row);

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("provision_user", e))?;

        Ok(Provisioned {
            user: created_user,
            accounts: created_accounts,
            card: created_card,
            settings: created_settings,
        })
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, full_name, account_number, status, member_since FROM users WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user_by_id", e))?;
        row.map(User::try_from).transpose()
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, full_name, account_number, status, member_since FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user_by_username", e))?;
        row.map(User::try_from).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, full_name, account_number, status, member_since FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn set_user_status(&self, id: UserId, status: UserStatus) -> Result<User, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            UPDATE users SET status = $1 WHERE id = $2
            RETURNING id, username, password_hash, full_name, account_number, status, member_since
            "#,
        )
        .bind(status.as_str())
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_user_status", e))?;
        row.ok_or(StoreError::NotFound).and_then(User::try_from)
    }

    async fn accounts_for_user(&self, user_id: UserId) -> Result<Vec<Account>, StoreError> {
        let rows: Vec<AccountRow> = sqlx::query_as(
            "SELECT id, user_id, name, currency, balance FROM accounts WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("accounts_for_user", e))?;
        rows.into_iter().map(Account::try_from).collect()
    }

    async fn set_balance(&self, write: BalanceWrite) -> Result<Account, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            UPDATE accounts SET balance = $1 WHERE id = $2 AND user_id = $3
            RETURNING id, user_id, name, currency, balance
            "#,
        )
        .bind(write.new_balance)
        .bind(write.account_id.as_i64())
        .bind(write.user_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_balance", e))?;
        row.ok_or(StoreError::NotFound).and_then(Account::try_from)
    }

    async fn apply_transaction(
        &self,
        write: BalanceWrite,
        journal: NewTransaction,
    ) -> Result<(Account, Transaction), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("apply_transaction", e))?;

        let account: Option<AccountRow> = sqlx::query_as(
            r#"
            UPDATE accounts SET balance = $1 WHERE id = $2 AND user_id = $3
            RETURNING id, user_id, name, currency, balance
            "#,
        )
        .bind(write.new_balance)
        .bind(write.account_id.as_i64())
        .bind(write.user_id.as_i64())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("apply_transaction", e))?;
        let account = account
            .ok_or(StoreError::NotFound)
            .and_then(Account::try_from)?;

        let row: TransactionRow = sqlx::query_as(
            r#"
            INSERT INTO transactions (user_id, account_id, name, amount, currency, category, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, account_id, name, amount, currency, category, created_at
            "#,
        )
        .bind(journal.user_id.as_i64())
        .bind(journal.account_id.as_i64())
        .bind(&journal.name)
        .bind(journal.amount)
        .bind(journal.currency.as_str())
        .bind(&journal.category)
        .bind(journal.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("apply_transaction", e))?;
        let journaled = Transaction::try_from(row)?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("apply_transaction", e))?;

        Ok((account, journaled))
    }

    async fn apply_exchange(
        &self,
        debit: BalanceWrite,
        credit: BalanceWrite,
        record: NewExchange,
    ) -> Result<Exchange, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("apply_exchange", e))?;

        // Both writes and the journal insert share the transaction; an early
        // return drops `tx`, rolling everything back.
        for write in [&debit, &credit] {
            let updated: Option<AccountRow> = sqlx::query_as(
                r#"
                UPDATE accounts SET balance = $1 WHERE id = $2 AND user_id = $3
                RETURNING id, user_id, name, currency, balance
                "#,
            )
            .bind(write.new_balance)
            .bind(write.account_id.as_i64())
            .bind(write.user_id.as_i64())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("apply_exchange", e))?;
            if updated.is_none() {
                return Err(StoreError::NotFound);
            }
        }

        let row: ExchangeRow = sqlx::query_as(
            r#"
            INSERT INTO exchanges (user_id, from_currency, to_currency, from_amount, to_amount, rate, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, from_currency, to_currency, from_amount, to_amount, rate, created_at
            "#,
        )
        .bind(record.user_id.as_i64())
        .bind(record.from_currency.as_str())
        .bind(record.to_currency.as_str())
        .bind(record.from_amount)
        .bind(record.to_amount)
        .bind(record.rate)
        .bind(record.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("apply_exchange", e))?;
        let journaled = Exchange::try_from(row)?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("apply_exchange", e))?;

        Ok(journaled)
    }

    async fn transactions_for_user(&self, user_id: UserId) -> Result<Vec<Transaction>, StoreError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            "SELECT id, user_id, account_id, name, amount, currency, category, created_at FROM transactions WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("transactions_for_user", e))?;
        rows.into_iter().map(Transaction::try_from).collect()
    }

    async fn exchanges_for_user(&self, user_id: UserId) -> Result<Vec<Exchange>, StoreError> {
        let rows: Vec<ExchangeRow> = sqlx::query_as(
            "SELECT id, user_id, from_currency, to_currency, from_amount, to_amount, rate, created_at FROM exchanges WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("exchanges_for_user", e))?;
        rows.into_iter().map(Exchange::try_from).collect()
    }

    async fn insert_card(&self, user_id: UserId, new_card: NewCard) -> Result<Card, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("insert_card", e))?;

        let row: CardRow = sqlx::query_as(
            r#"
            INSERT INTO cards (user_id, account_id, name, card_number, expires, is_frozen, spending_limit)
            VALUES ($1, $2, $3, '', $4, FALSE, $5)
            RETURNING id, user_id, account_id, name, card_number, expires, is_frozen, spending_limit
            "#,
        )
        .bind(user_id.as_i64())
        .bind(new_card.account_id.as_i64())
        .bind(&new_card.name)
        .bind(&new_card.expires)
        .bind(new_card.spending_limit)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_card", e))?;

        let row: CardRow = sqlx::query_as(
            r#"
            UPDATE cards SET card_number = $1 WHERE id = $2
            RETURNING id, user_id, account_id, name, card_number, expires, is_frozen, spending_limit
            "#,
        )
        .bind(card::masked_number(CardId::new(row.id)))
        .bind(row.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_card", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("insert_card", e))?;

        Ok(Card::from(row))
    }

    async fn cards_for_user(&self, user_id: UserId) -> Result<Vec<Card>, StoreError> {
        let rows: Vec<CardRow> = sqlx::query_as(
            "SELECT id, user_id, account_id, name, card_number, expires, is_frozen, spending_limit FROM cards WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("cards_for_user", e))?;
        Ok(rows.into_iter().map(Card::from).collect())
    }

    async fn set_card_frozen(
        &self,
        card_id: CardId,
        user_id: UserId,
        frozen: bool,
    ) -> Result<Card, StoreError> {
        let row: Option<CardRow> = sqlx::query_as(
            r#"
            UPDATE cards SET is_frozen = $1 WHERE id = $2 AND user_id = $3
            RETURNING id, user_id, account_id, name, card_number, expires, is_frozen, spending_limit
            "#,
        )
        .bind(frozen)
        .bind(card_id.as_i64())
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_card_frozen", e))?;
        row.map(Card::from).ok_or(StoreError::NotFound)
    }

    async fn settings_for_user(&self, user_id: UserId) -> Result<Settings, StoreError> {
        let row: Option<SettingsRow> = sqlx::query_as(
            "SELECT id, user_id, payment_alerts, exchange_alerts, login_alerts, two_factor FROM settings WHERE user_id = $1",
        )
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("settings_for_user", e))?;
        row.map(Settings::from).ok_or(StoreError::NotFound)
    }

    async fn update_settings(
        &self,
        user_id: UserId,
        patch: SettingsPatch,
    ) -> Result<Settings, StoreError> {
        let row: Option<SettingsRow> = sqlx::query_as(
            r#"
            UPDATE settings SET
                payment_alerts  = COALESCE($1, payment_alerts),
                exchange_alerts = COALESCE($2, exchange_alerts),
                login_alerts    = COALESCE($3, login_alerts),
                two_factor      = COALESCE($4, two_factor)
            WHERE user_id = $5
            RETURNING id, user_id, payment_alerts, exchange_alerts, login_alerts, two_factor
            "#,
        )
        .bind(patch.payment_alerts)
        .bind(patch.exchange_alerts)
        .bind(patch.login_alerts)
        .bind(patch.two_factor)
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_settings", e))?;
        row.map(Settings::from).ok_or(StoreError::NotFound)
    }
}
