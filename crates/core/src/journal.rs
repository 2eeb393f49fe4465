//! Append-only journal entries.
//!
//! A journal row is never mutated after insert; balances are explained by
//! the union of `Transaction` and `Exchange` rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::id::{AccountId, ExchangeId, TransactionId, UserId};

/// An immutable journal entry against one account.
///
/// The sign of `amount` determines debit/credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub account_id: AccountId,
    pub name: String,
    pub amount: i64,
    pub currency: Currency,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Input for one transaction row; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub account_id: AccountId,
    pub name: String,
    pub amount: i64,
    pub currency: Currency,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// A record of one currency conversion.
///
/// Inserting an `Exchange` implies exactly two account balance mutations
/// performed in the same unit of work. `rate` is stored for audit only; it
/// is never used to recompute `to_amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub id: ExchangeId,
    pub user_id: UserId,
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub from_amount: i64,
    pub to_amount: i64,
    pub rate: f64,
    pub created_at: DateTime<Utc>,
}

/// Input for one exchange row; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewExchange {
    pub user_id: UserId,
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub from_amount: i64,
    pub to_amount: i64,
    pub rate: f64,
    pub created_at: DateTime<Utc>,
}
