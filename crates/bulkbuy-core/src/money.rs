//! # Money
//!
//! Integer cents for every amount a customer sees; [`Decimal`] for the tier
//! data those amounts are computed from.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tier unit price        Decimal   8.50 / 0.125      stored exactly      │
//! │        │                                                                │
//! │        ▼  × quantity                                                    │
//! │  line amount            Decimal   212.50            still exact         │
//! │        │                                                                │
//! │        ▼  Money::from_decimal     rounded to the cent here, once        │
//! │  subtotal / savings     Money     21250                                 │
//! │        │                                                                │
//! │        ▼  Σ                                                             │
//! │  cart total             Money     63250             integer addition    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```rust
//! use bulkbuy_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! let line = Money::from_decimal(Decimal::new(21_250, 2)).unwrap();
//! let total = line + Money::from_cents(42_000);
//! assert_eq!(total.to_string(), "$632.50");
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An amount in cents.
///
/// On the wire it is a dollar string with two decimal places (`"632.50"`),
/// the same unit and shape as a tier's `unitPrice`.
///
/// Signed: savings can go negative when a tier costs more than the base tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Rounds a dollar amount to whole cents, halves away from zero
    /// (`0.125 → 13`, `-0.125 → -13`).
    ///
    /// `None` if the result doesn't fit in `i64` cents.
    pub fn from_decimal(amount: Decimal) -> Option<Self> {
        amount
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Money)
    }

    /// Dollar amount with exactly two decimal places.
    #[inline]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Minor units, as payment processors take them.
    #[inline]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self.to_decimal();
        if amount.is_sign_negative() && !amount.is_zero() {
            write!(f, "-${}", amount.abs())
        } else {
            write!(f, "${}", amount)
        }
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&self.to_decimal(), serializer)
    }
}

/// Accepts a dollar amount with at most two decimal places; anything finer
/// is not a whole number of cents and is rejected rather than rounded.
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        if amount.normalize().scale() > 2 {
            return Err(D::Error::custom(format!(
                "{amount} is not a whole number of cents"
            )));
        }
        Money::from_decimal(amount)
            .ok_or_else(|| D::Error::custom(format!("{amount} is out of range")))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        Money(iter.map(|m| m.0).sum())
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_rounding_at_the_cent() {
        let cases = [
            ("212.5", 21250),
            ("0.125", 13),
            ("0.124", 12),
            ("-0.125", -13),
            ("1.005", 101),
            ("93.500", 9350),
            ("0", 0),
        ];
        for (input, cents) in cases {
            assert_eq!(Money::from_decimal(dec(input)), Some(Money(cents)), "{input}");
        }
    }

    #[test]
    fn test_unrepresentable_amount() {
        assert_eq!(Money::from_decimal(Decimal::MAX), None);
        assert_eq!(Money(i64::MAX).checked_add(Money(1)), None);
        assert_eq!(Money(1).checked_add(Money(2)), Some(Money(3)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money(63250).to_string(), "$632.50");
        assert_eq!(Money(500).to_string(), "$5.00");
        assert_eq!(Money(7).to_string(), "$0.07");
        assert_eq!(Money(-550).to_string(), "-$5.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_sums_stay_exact() {
        // 0.1 + 0.2 in floats is 0.30000000000000004
        let total: Money = [Money(10), Money(20)].iter().sum();
        assert_eq!(total.to_decimal(), dec("0.30"));
        assert_eq!(Money(1000) - Money(1250), Money(-250));
    }

    #[test]
    fn test_serializes_as_dollars() {
        assert_eq!(serde_json::to_string(&Money(63250)).unwrap(), r#""632.50""#);
        assert_eq!(serde_json::to_string(&Money(500)).unwrap(), r#""5.00""#);
        assert_eq!(serde_json::to_string(&Money(-250)).unwrap(), r#""-2.50""#);

        let back: Money = serde_json::from_str(r#""217.50""#).unwrap();
        assert_eq!(back, Money::from_cents(21750));
        let back: Money = serde_json::from_str("8.5").unwrap();
        assert_eq!(back, Money::from_cents(850));
    }

    #[test]
    fn test_rejects_fractional_cents() {
        assert!(serde_json::from_str::<Money>(r#""0.125""#).is_err());
        assert!(serde_json::from_str::<Money>(r#""1.500""#).is_ok());
    }
}
