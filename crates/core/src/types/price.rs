//! Type-safe price representation using decimal arithmetic.
//!
//! The music API reports prices as decimal strings in rubles
//! (e.g. `"1500.00"`), occasionally as bare JSON numbers. Both forms
//! deserialize into [`Price`]; arithmetic never goes through floats.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency sign appended to every formatted amount.
pub const CURRENCY_SIGN: &str = "₽";

/// ISO 4217 code sent to the payment provider.
pub const CURRENCY_CODE: &str = "RUB";

/// A price in rubles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from whole rubles.
    #[must_use]
    pub fn from_rubles(rubles: i64) -> Self {
        Self(Decimal::from(rubles))
    }

    /// The raw decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Format for display: whole amounts drop the fraction (`"1500 ₽"`),
    /// anything else keeps two decimals (`"1499.50 ₽"`).
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self.0.round_dp(2);
        if rounded.fract().is_zero() {
            format!("{} {CURRENCY_SIGN}", rounded.normalize())
        } else {
            format!("{} {CURRENCY_SIGN}", Self::two_places(rounded))
        }
    }

    /// Format with exactly two decimals and no currency sign.
    ///
    /// This is the form sent to payment endpoints (`"1500.00"`).
    #[must_use]
    pub fn to_fixed(&self) -> String {
        Self::two_places(self.0).to_string()
    }

    fn two_places(amount: Decimal) -> Decimal {
        let mut value = amount.round_dp(2);
        value.rescale(2);
        value
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use core::str::FromStr;

    fn price(s: &str) -> Price {
        Price::new(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_deserializes_from_string_and_number() {
        let from_str: Price = serde_json::from_str("\"1500.00\"").unwrap();
        let from_num: Price = serde_json::from_str("1500").unwrap();
        assert_eq!(from_str, from_num);
    }

    #[test]
    fn test_display_whole_amount() {
        assert_eq!(price("1500.00").display(), "1500 ₽");
        assert_eq!(Price::ZERO.display(), "0 ₽");
    }

    #[test]
    fn test_display_fractional_amount() {
        assert_eq!(price("1499.5").display(), "1499.50 ₽");
        assert_eq!(price("10.255").display(), "10.26 ₽");
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(price("1500").to_fixed(), "1500.00");
        assert_eq!(price("99.9").to_fixed(), "99.90");
    }

    #[test]
    fn test_sum() {
        let total: Price = [price("100.50"), price("200"), price("0.50")].iter().sum();
        assert_eq!(total, price("301"));
    }
}
