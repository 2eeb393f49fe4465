//! Starter bundle provisioned at registration.

use vaultbank_core::{CardSpec, Currency, NewAccount};

/// Default spending limit on issued cards.
pub const DEFAULT_SPENDING_LIMIT: i64 = 5_000;

/// Category marker on admin-initiated journal rows.
pub const ADMIN_TRANSFER_CATEGORY: &str = "admin";

/// The three starter accounts every new user receives.
pub fn seed_accounts() -> Vec<NewAccount> {
    vec![
        NewAccount {
            name: "Main Account".to_string(),
            currency: Currency::EUR,
            balance: 24_856,
        },
        NewAccount {
            name: "Dollar Account".to_string(),
            currency: Currency::USD,
            balance: 12_342,
        },
        NewAccount {
            name: "Sterling Account".to_string(),
            currency: Currency::GBP,
            balance: 8_761,
        },
    ]
}

/// The starter card issued against the first seed account.
pub fn default_card() -> CardSpec {
    CardSpec {
        name: "Standard Card".to_string(),
        spending_limit: DEFAULT_SPENDING_LIMIT,
    }
}
