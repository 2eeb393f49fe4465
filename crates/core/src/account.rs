//! Currency-denominated balance buckets.

use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::id::{AccountId, UserId};

/// A balance bucket owned by exactly one user.
///
/// Balances are whole units (no minor-unit handling anywhere in the system)
/// and may go negative; nothing in the schema enforces a floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub name: String,
    pub currency: Currency,
    pub balance: i64,
}

/// Input for creating an account; the owner and id are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub currency: Currency,
    pub balance: i64,
}
