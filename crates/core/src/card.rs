//! Payment cards linked to accounts.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{AccountId, CardId, UserId};

/// A payment card linked to one account of the same user.
///
/// Only the masked form of the card number is ever stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub user_id: UserId,
    pub account_id: AccountId,
    pub name: String,
    pub card_number: String,
    pub expires: String,
    pub is_frozen: bool,
    pub spending_limit: i64,
}

/// Input for one card row; owner, id, and the masked number are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewCard {
    pub account_id: AccountId,
    pub name: String,
    pub expires: String,
    pub spending_limit: i64,
}

/// Display attributes of a card to be issued (used by provisioning).
#[derive(Debug, Clone)]
pub struct CardSpec {
    pub name: String,
    pub spending_limit: i64,
}

/// Derive the masked card number from the assigned card id.
pub fn masked_number(id: CardId) -> String {
    format!("**** **** **** {:04}", id.as_i64() % 10_000)
}

/// Default expiry for a newly issued card: four years out, `MM/YY` form.
pub fn default_expiry(issued_at: DateTime<Utc>) -> String {
    format!("{:02}/{:02}", issued_at.month(), (issued_at.year() + 4) % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn masked_number_keeps_only_four_digits() {
        assert_eq!(masked_number(CardId::new(731_294)), "**** **** **** 1294");
        assert_eq!(masked_number(CardId::new(3)), "**** **** **** 0003");
    }

    #[test]
    fn expiry_is_four_years_out() {
        let issued = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap();
        assert_eq!(default_expiry(issued), "08/30");
    }
}
