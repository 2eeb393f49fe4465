//! User identity records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// User account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// User is active and can authenticate/transact.
    #[default]
    Active,
    /// User is suspended and flagged for review.
    Suspended,
    /// User is frozen; funds are held pending investigation.
    Frozen,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
            UserStatus::Frozen => "frozen",
        }
    }

    /// Parse the stored representation (inverse of [`UserStatus::as_str`]).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(UserStatus::Active),
            "suspended" => Some(UserStatus::Suspended),
            "frozen" => Some(UserStatus::Frozen),
            _ => None,
        }
    }
}

impl core::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered account holder.
///
/// `password_hash` is a PHC-format digest; the plaintext password is never
/// stored anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub account_number: String,
    pub status: UserStatus,
    pub member_since: DateTime<Utc>,
}

/// Input for registering a user; ids and derived fields are assigned by the
/// store at insert time.
#[derive(Debug, Clone)]
pub struct NewUserProfile {
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
}

/// Derive the displayed account number from the assigned user id.
pub fn account_number(id: UserId) -> String {
    format!("VB-{:010}", id.as_i64())
}
