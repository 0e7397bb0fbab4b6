//! Money arithmetic on top of [`rust_decimal::Decimal`].
//!
//! Prices are stored as `NUMERIC(12, 2)` and never pass through floating point.
//! Line totals are computed here so the checkout path, order reports and
//! notification copy all agree to the kobo.

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes accepted by the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// Nigerian naira, the store's settlement currency.
    #[default]
    NGN,
    USD,
}

impl CurrencyCode {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NGN => "NGN",
            Self::USD => "USD",
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::NGN => "\u{20a6}",
            Self::USD => "$",
        }
    }
}

/// An amount in a currency's major unit (naira, not kobo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub amount: Decimal,
    pub currency_code: CurrencyCode,
}

impl Price {
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A naira amount.
    #[must_use]
    pub const fn ngn(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::NGN)
    }

    /// Amount in the minor unit (kobo, cents), rounded half away from zero.
    ///
    /// Returns `None` if the value does not fit in an `i64`.
    #[must_use]
    pub fn to_minor_units(&self) -> Option<i64> {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        (rounded * Decimal::ONE_HUNDRED).to_i64()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:.2}",
            self.currency_code.symbol(),
            self.amount
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        )
    }
}

/// `unit_price * quantity`.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Sum of line totals over `(unit_price, quantity)` pairs.
pub fn order_total<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    lines
        .into_iter()
        .map(|(price, qty)| line_total(price, qty))
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(Price::ngn(dec("25.99")).to_minor_units(), Some(2599));
        assert_eq!(Price::ngn(dec("0")).to_minor_units(), Some(0));
        assert_eq!(Price::ngn(dec("10.005")).to_minor_units(), Some(1001));
    }

    #[test]
    fn test_order_total_is_exact() {
        // 3 x 0.10 must be exactly 0.30, not 0.30000000000000004
        let total = order_total([(dec("0.10"), 3), (dec("25.99"), 2)]);
        assert_eq!(total, dec("52.28"));
    }

    #[test]
    fn test_order_total_empty() {
        assert_eq!(order_total(std::iter::empty()), Decimal::ZERO);
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::ngn(dec("1500")).to_string(), "\u{20a6}1500.00");
        assert_eq!(
            Price::new(dec("89.9"), CurrencyCode::USD).to_string(),
            "$89.90"
        );
    }
}
