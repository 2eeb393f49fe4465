//! Currency value object.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// ISO 4217 alpha code for a currency.
///
/// Validation is structural only (exactly three ASCII uppercase letters);
/// the system does not carry a currency registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(Cow<'static, str>);

impl Currency {
    pub const EUR: Currency = Currency(Cow::Borrowed("EUR"));
    pub const USD: Currency = Currency(Cow::Borrowed("USD"));
    pub const GBP: Currency = Currency(Cow::Borrowed("GBP"));

    /// Parse and validate a currency code.
    pub fn parse(code: &str) -> Result<Self, DomainError> {
        let code = code.trim();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(DomainError::validation(format!(
                "currency must be a three-letter uppercase code, got '{code}'"
            )));
        }
        Ok(Self(Cow::Owned(code.to_string())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::parse(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_parse() {
        assert_eq!(Currency::parse("EUR").unwrap(), Currency::EUR);
        assert_eq!(Currency::parse(" USD ").unwrap(), Currency::USD);
    }

    #[test]
    fn malformed_codes_are_rejected() {
        for bad in ["", "EU", "EURO", "eur", "E1R"] {
            assert!(Currency::parse(bad).is_err(), "expected '{bad}' to be rejected");
        }
    }

    #[test]
    fn serde_round_trip_validates() {
        let c: Currency = serde_json::from_str("\"GBP\"").unwrap();
        assert_eq!(c, Currency::GBP);
        assert!(serde_json::from_str::<Currency>("\"gbp\"").is_err());
    }
}
