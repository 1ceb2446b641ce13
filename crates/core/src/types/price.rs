//! Catalog price representation using decimal arithmetic.
//!
//! The catalog API sends prices either as JSON numbers (`450000`) or as
//! display strings (`"₦450,000"`). Both are kept as received in [`Price`] and
//! normalized in exactly one place, [`Price::amount`].

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// A catalog price as delivered by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Price {
    /// A numeric amount in the currency's standard unit.
    Numeric(Decimal),
    /// A locale-formatted string with symbol and separators.
    Formatted(String),
}

impl Price {
    /// Normalize to a decimal amount.
    ///
    /// Formatted strings keep only ASCII digits and `.`, then the longest
    /// prefix holding at most one `.` is parsed. Anything unparsable is zero.
    ///
    /// ```
    /// use rust_decimal::Decimal;
    /// use solar_hive_core::Price;
    ///
    /// assert_eq!(Price::Formatted("₦1,200".into()).amount(), Decimal::from(1200));
    /// assert_eq!(Price::Formatted("call us".into()).amount(), Decimal::ZERO);
    /// ```
    #[must_use]
    pub fn amount(&self) -> Decimal {
        match self {
            Self::Numeric(amount) => *amount,
            Self::Formatted(text) => parse_formatted(text),
        }
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::Numeric(Decimal::ZERO)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self::Numeric(amount)
    }
}

fn parse_formatted(text: &str) -> Decimal {
    let mut cleaned = String::with_capacity(text.len());
    let mut seen_point = false;
    for c in text.chars() {
        if c.is_ascii_digit() {
            cleaned.push(c);
        } else if c == '.' {
            if seen_point {
                break;
            }
            seen_point = true;
            cleaned.push(c);
        }
    }

    let cleaned = cleaned.trim_end_matches('.');
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(cleaned).unwrap_or(Decimal::ZERO)
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Numeric(amount) => rust_decimal::serde::float::serialize(amount, serializer),
            Self::Formatted(text) => serializer.serialize_str(text),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PriceVisitor;

        impl Visitor<'_> for PriceVisitor {
            type Value = Price;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a numeric price or a formatted price string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
                Ok(Price::Numeric(Decimal::from(v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
                Ok(Price::Numeric(Decimal::from(v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
                Ok(Price::Numeric(Decimal::try_from(v).unwrap_or(Decimal::ZERO)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
                Ok(Price::Formatted(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Price, E> {
                Ok(Price::Formatted(v))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Price, E> {
                Ok(Price::default())
            }

            fn visit_none<E: de::Error>(self) -> Result<Price, E> {
                Ok(Price::default())
            }
        }

        deserializer.deserialize_any(PriceVisitor)
    }
}

/// ISO 4217 currency codes used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    NGN,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::NGN => "₦",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Three-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NGN => "NGN",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }

    /// Format an amount for display (e.g., `₦1,234.50`).
    #[must_use]
    pub fn format(self, amount: Decimal) -> String {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let text = format!("{:.2}", rounded.abs());
        let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        format!("{sign}{}{grouped}.{fraction}", self.symbol())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when parsing an unsupported currency code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported currency: {0}")]
pub struct ParseCurrencyError(String);

impl FromStr for CurrencyCode {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NGN" => Ok(Self::NGN),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            _ => Err(ParseCurrencyError(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_formatted_price_strips_symbol_and_separators() {
        assert_eq!(Price::Formatted("₦1,200".into()).amount(), dec("1200"));
        assert_eq!(Price::Formatted("₦ 450,000.50".into()).amount(), dec("450000.50"));
        assert_eq!(Price::Formatted("NGN1 200".into()).amount(), dec("1200"));
    }

    #[test]
    fn test_formatted_price_unparsable_is_zero() {
        assert_eq!(Price::Formatted(String::new()).amount(), Decimal::ZERO);
        assert_eq!(Price::Formatted("free".into()).amount(), Decimal::ZERO);
        assert_eq!(Price::Formatted("₦.".into()).amount(), Decimal::ZERO);
    }

    #[test]
    fn test_formatted_price_stops_at_second_point() {
        assert_eq!(Price::Formatted("1.2.3".into()).amount(), dec("1.2"));
    }

    #[test]
    fn test_numeric_price_is_returned_as_is() {
        assert_eq!(Price::Numeric(dec("99.95")).amount(), dec("99.95"));
    }

    #[test]
    fn test_price_deserialize_variants() {
        let p: Price = serde_json::from_str("1500").unwrap();
        assert_eq!(p, Price::Numeric(dec("1500")));

        let p: Price = serde_json::from_str("\"₦1,500\"").unwrap();
        assert_eq!(p, Price::Formatted("₦1,500".into()));

        let p: Price = serde_json::from_str("null").unwrap();
        assert_eq!(p.amount(), Decimal::ZERO);

        let p: Price = serde_json::from_str("12.5").unwrap();
        assert_eq!(p.amount(), dec("12.5"));
    }

    #[test]
    fn test_currency_format_groups_thousands() {
        assert_eq!(CurrencyCode::NGN.format(dec("1234567.5")), "₦1,234,567.50");
        assert_eq!(CurrencyCode::NGN.format(dec("3600")), "₦3,600.00");
        assert_eq!(CurrencyCode::USD.format(dec("999")), "$999.00");
        assert_eq!(CurrencyCode::GBP.format(Decimal::ZERO), "£0.00");
    }

    #[test]
    fn test_currency_format_negative() {
        assert_eq!(CurrencyCode::EUR.format(dec("-1500.255")), "-€1,500.26");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("ngn".parse::<CurrencyCode>().unwrap(), CurrencyCode::NGN);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}
