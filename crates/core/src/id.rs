//! Strongly-typed identifiers used across the domain.
//!
//! The relational schema keys every entity by a monotonically assigned
//! integer; the newtypes below keep those integers from being mixed up
//! across entities.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! impl_i64_id {
    ($t:ident, $name:literal) => {
        #[doc = concat!("Identifier of a ", $name, " row.")]
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(i64);

        impl $t {
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = i64::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", stringify!($t), e)))?;
                Ok(Self(value))
            }
        }
    };
}

impl_i64_id!(UserId, "user");
impl_i64_id!(AccountId, "account");
impl_i64_id!(TransactionId, "transaction");
impl_i64_id!(CardId, "card");
impl_i64_id!(ExchangeId, "exchange");
impl_i64_id!(SettingsId, "settings");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_and_round_trip() {
        let id: AccountId = "42".parse().unwrap();
        assert_eq!(id.as_i64(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn non_numeric_id_is_rejected() {
        let err = "abc".parse::<UserId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }
}
