//! Admin adjustment layer.
//!
//! A privileged wrapper around the ledger: the caller's authenticated
//! username must equal the reserved admin literal, checked here on every
//! operation. Any other identity gets the same generic admin-required
//! error, authenticated or not.

use chrono::Utc;

use vaultbank_core::{Account, NewTransaction, Transaction, User, UserId, UserStatus};

use crate::error::LedgerError;
use crate::provision::ADMIN_TRANSFER_CATEGORY;
use crate::service::Ledger;
use crate::store::BalanceWrite;

/// Admin action label for a user status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Suspend,
    Activate,
    Freeze,
}

impl StatusAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "suspend" => Some(StatusAction::Suspend),
            "activate" => Some(StatusAction::Activate),
            "freeze" => Some(StatusAction::Freeze),
            _ => None,
        }
    }

    pub fn target_status(self) -> UserStatus {
        match self {
            StatusAction::Suspend => UserStatus::Suspended,
            StatusAction::Activate => UserStatus::Active,
            StatusAction::Freeze => UserStatus::Frozen,
        }
    }
}

/// Client tier derived from total balance across accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Standard,
    Gold,
    Platinum,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Standard => "standard",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
        }
    }
}

/// Activity risk derived from journal volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Risk {
    Low,
    Medium,
    High,
}

impl Risk {
    pub fn as_str(&self) -> &'static str {
        match self {
            Risk::Low => "low",
            Risk::Medium => "medium",
            Risk::High => "high",
        }
    }
}

/// One roster row: the user plus derived fields.
#[derive(Debug, Clone)]
pub struct UserInsight {
    pub user: User,
    pub total_balance: i64,
    pub tier: Tier,
    pub risk: Risk,
}

fn tier_for(total_balance: i64) -> Tier {
    if total_balance >= 40_000 {
        Tier::Platinum
    } else if total_balance >= 20_000 {
        Tier::Gold
    } else {
        Tier::Standard
    }
}

fn risk_for(journal_entries: usize) -> Risk {
    if journal_entries > 20 {
        Risk::High
    } else if journal_entries > 5 {
        Risk::Medium
    } else {
        Risk::Low
    }
}

/// Privileged operations, gated on the reserved admin username.
#[derive(Clone)]
pub struct AdminDesk {
    ledger: Ledger,
    admin_username: String,
}

impl AdminDesk {
    pub fn new(ledger: Ledger, admin_username: impl Into<String>) -> Self {
        Self {
            ledger,
            admin_username: admin_username.into(),
        }
    }

    pub fn is_admin(&self, username: &str) -> bool {
        username == self.admin_username
    }

    fn ensure_admin(&self, caller_username: &str) -> Result<(), LedgerError> {
        if self.is_admin(caller_username) {
            Ok(())
        } else {
            Err(LedgerError::AdminRequired)
        }
    }

    /// All users except the admin identity itself, with derived tier/risk.
    pub async fn roster(&self, caller_username: &str) -> Result<Vec<UserInsight>, LedgerError> {
        self.ensure_admin(caller_username)?;

        let users = self.ledger.store().list_users().await?;
        let mut roster = Vec::with_capacity(users.len());
        for user in users {
            if user.username == self.admin_username {
                continue;
            }

            let total_balance: i64 = self
                .ledger
                .accounts(user.id)
                .await?
                .iter()
                .map(|a| a.balance)
                .sum();
            let journal_entries = self.ledger.transactions(user.id).await?.len()
                + self.ledger.exchanges(user.id).await?.len();

            roster.push(UserInsight {
                tier: tier_for(total_balance),
                risk: risk_for(journal_entries),
                total_balance,
                user,
            });
        }

        Ok(roster)
    }

    /// Out-of-band balance mutation against the target's first account (by
    /// insertion order), journaled under the admin category.
    pub async fn transfer(
        &self,
        caller_username: &str,
        target: UserId,
        amount: i64,
        reason: &str,
    ) -> Result<(Account, Transaction), LedgerError> {
        self.ensure_admin(caller_username)?;

        let accounts = self.ledger.accounts(target).await?;
        let account = accounts.first().ok_or(LedgerError::AccountNotFound)?;

        let new_balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::validation("amount overflows account balance"))?;

        let reason = if reason.trim().is_empty() {
            "Admin adjustment"
        } else {
            reason.trim()
        };

        tracing::info!(user_id = %target, amount, "admin transfer");

        Ok(self
            .ledger
            .store()
            .apply_transaction(
                BalanceWrite {
                    account_id: account.id,
                    user_id: target,
                    new_balance,
                },
                NewTransaction {
                    user_id: target,
                    account_id: account.id,
                    name: reason.to_string(),
                    amount,
                    currency: account.currency.clone(),
                    category: ADMIN_TRANSFER_CATEGORY.to_string(),
                    created_at: Utc::now(),
                },
            )
            .await?)
    }

    /// Persist the status mapped from the action label.
    pub async fn update_status(
        &self,
        caller_username: &str,
        target: UserId,
        action: StatusAction,
    ) -> Result<User, LedgerError> {
        self.ensure_admin(caller_username)?;

        // Surface a missing target as user-not-found rather than the
        // store's generic miss.
        self.ledger.user(target).await?;

        tracing::info!(user_id = %target, action = ?action, "admin status update");

        self.ledger
            .store()
            .set_user_status(target, action.target_status())
            .await
            .map_err(|e| match e {
                crate::store::StoreError::NotFound => LedgerError::UserNotFound,
                other => other.into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBankStore;
    use crate::service::TransactionRequest;
    use std::sync::Arc;
    use vaultbank_core::NewUserProfile;

    fn desk() -> AdminDesk {
        let ledger = Ledger::new(Arc::new(InMemoryBankStore::new()));
        AdminDesk::new(ledger, "admin")
    }

    async fn register(desk: &AdminDesk, username: &str) -> crate::store::Provisioned {
        desk.ledger
            .register(NewUserProfile {
                username: username.to_string(),
                password_hash: "$argon2id$test".to_string(),
                full_name: "Test User".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn non_admin_callers_are_rejected() {
        let desk = desk();
        register(&desk, "alice").await;

        assert!(matches!(
            desk.roster("alice").await.unwrap_err(),
            LedgerError::AdminRequired
        ));
        assert!(matches!(
            desk.transfer("alice", UserId::new(1), 10, "test").await.unwrap_err(),
            LedgerError::AdminRequired
        ));
    }

    #[tokio::test]
    async fn roster_excludes_the_admin_identity() {
        let desk = desk();
        register(&desk, "admin").await;
        register(&desk, "alice").await;
        register(&desk, "bob").await;

        let roster = desk.roster("admin").await.unwrap();
        let names: Vec<&str> = roster.iter().map(|r| r.user.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn roster_derives_tier_and_risk() {
        let desk = desk();
        register(&desk, "admin").await;
        let alice = register(&desk, "alice").await;

        // Seed bundle totals 45_959 across the three accounts.
        let roster = desk.roster("admin").await.unwrap();
        assert_eq!(roster[0].total_balance, 45_959);
        assert_eq!(roster[0].tier, Tier::Platinum);
        assert_eq!(roster[0].risk, Risk::Low);

        for _ in 0..6 {
            desk.ledger
                .record_transaction(
                    alice.user.id,
                    TransactionRequest {
                        account_id: alice.accounts[0].id,
                        amount: -1,
                        name: "entry".to_string(),
                        category: "misc".to_string(),
                    },
                )
                .await
                .unwrap();
        }

        let roster = desk.roster("admin").await.unwrap();
        assert_eq!(roster[0].risk, Risk::Medium);
    }

    #[tokio::test]
    async fn transfer_hits_the_first_account_and_journals() {
        let desk = desk();
        let alice = register(&desk, "alice").await;

        let (account, row) = desk
            .transfer("admin", alice.user.id, 1_000, "Goodwill credit")
            .await
            .unwrap();

        assert_eq!(account.id, alice.accounts[0].id);
        assert_eq!(account.balance, 25_856);
        assert_eq!(row.category, ADMIN_TRANSFER_CATEGORY);
        assert_eq!(row.name, "Goodwill credit");
    }

    #[tokio::test]
    async fn transfer_without_target_accounts_fails() {
        let desk = desk();

        let err = desk
            .transfer("admin", UserId::new(404), 10, "test")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound));
    }

    #[tokio::test]
    async fn status_actions_persist() {
        let desk = desk();
        let alice = register(&desk, "alice").await;

        let updated = desk
            .update_status("admin", alice.user.id, StatusAction::Freeze)
            .await
            .unwrap();
        assert_eq!(updated.status, UserStatus::Frozen);

        let fetched = desk.ledger.user(alice.user.id).await.unwrap();
        assert_eq!(fetched.status, UserStatus::Frozen);

        let updated = desk
            .update_status("admin", alice.user.id, StatusAction::Activate)
            .await
            .unwrap();
        assert_eq!(updated.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn status_update_for_missing_user_fails() {
        let desk = desk();

        let err = desk
            .update_status("admin", UserId::new(404), StatusAction::Suspend)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::UserNotFound));
    }

    #[test]
    fn tier_thresholds() {
        assert_eq!(tier_for(19_999), Tier::Standard);
        assert_eq!(tier_for(20_000), Tier::Gold);
        assert_eq!(tier_for(40_000), Tier::Platinum);
    }

    #[test]
    fn status_actions_parse() {
        assert_eq!(StatusAction::parse("suspend"), Some(StatusAction::Suspend));
        assert_eq!(StatusAction::parse("activate"), Some(StatusAction::Activate));
        assert_eq!(StatusAction::parse("freeze"), Some(StatusAction::Freeze));
        assert_eq!(StatusAction::parse("delete"), None);
    }
}
