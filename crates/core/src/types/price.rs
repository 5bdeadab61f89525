//! Decimal price representation.
//!
//! Prices are stored in the currency's standard unit (dollars, not cents)
//! using [`rust_decimal::Decimal`] to keep cart totals exact. Payment APIs
//! expect minor units (cents), so the conversion happens at that boundary
//! via [`Price::minor_units`].

use core::fmt;
use std::ops::Add;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes supported by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
}

impl Currency {
    /// The currency code (e.g. "usd") in the lowercase form payment
    /// providers expect.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::USD => "usd",
            Self::EUR => "eur",
            Self::GBP => "gbp",
        }
    }

    /// The display symbol (e.g. "$").
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD => "$",
            Self::EUR => "\u{20ac}",
            Self::GBP => "\u{00a3}",
        }
    }
}

/// A monetary amount with its currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g. dollars).
    pub amount: Decimal,
    /// The currency of `amount`.
    pub currency: Currency,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// The price multiplied by a line quantity.
    #[must_use]
    pub fn line_total(&self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency)
    }

    /// The amount in the currency's minor unit (e.g. cents).
    ///
    /// Returns `None` if the amount does not fit in an `i64` once scaled,
    /// which no catalog price will.
    #[must_use]
    pub fn minor_units(&self) -> Option<i64> {
        (self.amount * Decimal::ONE_HUNDRED).round().to_i64()
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.amount + rhs.amount, self.currency)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency.symbol(), self.amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn usd(amount: &str) -> Price {
        Price::new(amount.parse().unwrap(), Currency::USD)
    }

    #[test]
    fn test_line_total() {
        assert_eq!(usd("9.99").line_total(3), usd("29.97"));
        assert_eq!(usd("10").line_total(0), usd("0"));
    }

    #[test]
    fn test_sum() {
        let total = usd("10").line_total(2) + usd("5").line_total(1);
        assert_eq!(total, usd("25"));
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(usd("19.99").minor_units(), Some(1999));
        assert_eq!(usd("10").minor_units(), Some(1000));
        assert_eq!(usd("0.05").minor_units(), Some(5));
    }

    #[test]
    fn test_display() {
        assert_eq!(usd("12.5").to_string(), "$12.50");
        assert_eq!(
            Price::new("3".parse().unwrap(), Currency::GBP).to_string(),
            "\u{00a3}3.00"
        );
    }

    #[test]
    fn test_serde_amount_as_string() {
        let json = serde_json::to_string(&usd("10.50")).unwrap();
        assert!(json.contains("\"10.50\""));

        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, usd("10.50"));
    }
}
