use serde::Deserialize;

use vaultbank_core::{
    Account, AccountId, Card, Currency, Exchange, Settings, Transaction, User, UserId,
};
use vaultbank_ledger::UserInsight;

// -------------------------
// Request DTOs
// -------------------------
//
// Unknown fields are rejected at the boundary, before anything reaches the
// ledger.

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdjustBalanceRequest {
    pub balance: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTransactionRequest {
    pub account_id: AccountId,
    pub amount: i64,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCardRequest {
    pub account_id: AccountId,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FreezeCardRequest {
    pub is_frozen: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateExchangeRequest {
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub from_amount: i64,
    pub to_amount: i64,
    /// Stored for audit only; never used to recompute `to_amount`.
    pub rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSettingsRequest {
    pub payment_alerts: Option<bool>,
    pub exchange_alerts: Option<bool>,
    pub login_alerts: Option<bool>,
    pub two_factor: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminTransferRequest {
    pub user_id: UserId,
    pub amount: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStatusRequest {
    pub action: String,
}

// -------------------------
// JSON mapping helpers
// -------------------------

/// The password hash never leaves the server.
pub fn user_to_json(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id.as_i64(),
        "username": user.username,
        "full_name": user.full_name,
        "account_number": user.account_number,
        "status": user.status.as_str(),
        "member_since": user.member_since.to_rfc3339(),
    })
}

pub fn account_to_json(account: &Account) -> serde_json::Value {
    serde_json::json!({
        "id": account.id.as_i64(),
        "user_id": account.user_id.as_i64(),
        "name": account.name,
        "currency": account.currency.as_str(),
        "balance": account.balance,
    })
}

pub fn transaction_to_json(transaction: &Transaction) -> serde_json::Value {
    serde_json::json!({
        "id": transaction.id.as_i64(),
        "account_id": transaction.account_id.as_i64(),
        "name": transaction.name,
        "amount": transaction.amount,
        "currency": transaction.currency.as_str(),
        "category": transaction.category,
        "date": transaction.created_at.to_rfc3339(),
    })
}

pub fn card_to_json(card: &Card) -> serde_json::Value {
    serde_json::json!({
        "id": card.id.as_i64(),
        "account_id": card.account_id.as_i64(),
        "name": card.name,
        "card_number": card.card_number,
        "expires": card.expires,
        "is_frozen": card.is_frozen,
        "spending_limit": card.spending_limit,
    })
}

pub fn exchange_to_json(exchange: &Exchange) -> serde_json::Value {
    serde_json::json!({
        "id": exchange.id.as_i64(),
        "from_currency": exchange.from_currency.as_str(),
        "to_currency": exchange.to_currency.as_str(),
        "from_amount": exchange.from_amount,
        "to_amount": exchange.to_amount,
        "rate": exchange.rate,
        "date": exchange.created_at.to_rfc3339(),
    })
}

pub fn settings_to_json(settings: &Settings) -> serde_json::Value {
    serde_json::json!({
        "id": settings.id.as_i64(),
        "payment_alerts": settings.payment_alerts,
        "exchange_alerts": settings.exchange_alerts,
        "login_alerts": settings.login_alerts,
        "two_factor": settings.two_factor,
    })
}

pub fn insight_to_json(insight: &UserInsight) -> serde_json::Value {
    serde_json::json!({
        "id": insight.user.id.as_i64(),
        "username": insight.user.username,
        "full_name": insight.user.full_name,
        "account_number": insight.user.account_number,
        "status": insight.user.status.as_str(),
        "member_since": insight.user.member_since.to_rfc3339(),
        "total_balance": insight.total_balance,
        "tier": insight.tier.as_str(),
        "risk": insight.risk.as_str(),
    })
}
