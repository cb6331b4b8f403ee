//! Monetary amount value object with two-place precision.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use super::ValidationError;

/// A monetary amount held as integer cents.
///
/// On the wire it is a plain JSON number in monetary units (`12.5`), so
/// viewers never see the cent representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Self = Self(0);

    /// Creates an amount from integer cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates an amount from monetary units, rounding to the nearest cent.
    pub fn from_units(units: f64) -> Result<Self, ValidationError> {
        if !units.is_finite() {
            return Err(ValidationError::invalid_format("amount", "must be a finite number"));
        }
        let cents = (units * 100.0).round();
        if cents.abs() > i64::MAX as f64 {
            return Err(ValidationError::invalid_format("amount", "out of range"));
        }
        Ok(Self(cents as i64))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn as_units(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Subtraction floored at zero.
    pub fn saturating_remaining(self, spent: Amount) -> Amount {
        Amount((self.0 - spent.0).max(0))
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_units())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let units = f64::deserialize(deserializer)?;
        Amount::from_units(units).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_units_rounds_to_cents() {
        assert_eq!(Amount::from_units(12.345).unwrap().cents(), 1235);
        assert_eq!(Amount::from_units(0.1 + 0.2).unwrap().cents(), 30);
    }

    #[test]
    fn from_units_rejects_non_finite() {
        assert!(Amount::from_units(f64::NAN).is_err());
        assert!(Amount::from_units(f64::INFINITY).is_err());
    }

    #[test]
    fn display_uses_two_places() {
        assert_eq!(Amount::from_cents(650_000).to_string(), "6500.00");
        assert_eq!(Amount::from_cents(5).to_string(), "0.05");
        assert_eq!(Amount::from_cents(-150).to_string(), "-1.50");
    }

    #[test]
    fn serializes_as_units() {
        let json = serde_json::to_string(&Amount::from_cents(1250)).unwrap();
        assert_eq!(json, "12.5");
        let back: Amount = serde_json::from_str("12.5").unwrap();
        assert_eq!(back, Amount::from_cents(1250));
    }

    #[test]
    fn saturating_remaining_floors_at_zero() {
        let goal = Amount::from_cents(1_000_000);
        assert_eq!(
            goal.saturating_remaining(Amount::from_cents(650_000)),
            Amount::from_cents(350_000)
        );
        assert_eq!(
            goal.saturating_remaining(Amount::from_cents(2_000_000)),
            Amount::ZERO
        );
    }

    #[test]
    fn sums_amounts() {
        let total: Amount = [100, 250, 5].into_iter().map(Amount::from_cents).sum();
        assert_eq!(total.cents(), 355);
    }
}
