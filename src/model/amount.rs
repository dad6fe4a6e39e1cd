//! Amount type for handling whole-unit money values.
//!
//! This module provides the `Amount` type which wraps `Decimal`. Recorded expenses are always whole
//! units, but derived values such as the half of an odd total are not, so the decimal type is
//! kept for every amount.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// Characters accepted as thousands separators when parsing user input.
const GROUP_SEPARATORS: &[char] = &[',', '.', ' ', '_'];

/// Represents a non-negative amount of money in whole currency units.
///
/// # Examples
///
/// Parsing user input with group separators:
/// ```
/// # use split_expenses::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("100,000").unwrap();
/// assert_eq!(amount, Amount::from_units(100_000));
/// ```
///
/// Display uses `.` for thousands and `,` for the decimal part:
/// ```
/// # use split_expenses::model::Amount;
/// let amount = Amount::from_units(1_234_567);
/// assert_eq!(amount.to_string(), "1.234.567");
/// assert_eq!(Amount::from_units(101).half().to_string(), "50,5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Creates an amount of `units` whole currency units.
    pub fn from_units(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    /// Creates an amount from any non-negative `Decimal`.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative(value));
        }
        Ok(Self(value.normalize()))
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount has no fractional part.
    pub fn is_whole(&self) -> bool {
        self.0.fract().is_zero()
    }

    /// Returns the amount as an integer number of units, or `None` if it is fractional or too
    /// large.
    pub fn units(&self) -> Option<i64> {
        if self.is_whole() {
            self.0.to_i64()
        } else {
            None
        }
    }

    /// Exact half of the amount. `101` becomes `50.5`, nothing is truncated.
    pub fn half(&self) -> Amount {
        Amount((self.0 / Decimal::TWO).normalize())
    }

    /// The absolute difference between two amounts.
    pub fn difference(&self, other: Amount) -> Amount {
        Amount((self.0 - other.0).abs().normalize())
    }
}

/// An error that can occur when parsing or constructing an `Amount`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AmountError {
    Empty,
    InvalidCharacter(char),
    Negative(Decimal),
    TooLarge,
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Empty => write!(f, "An amount is required"),
            AmountError::InvalidCharacter(c) => {
                write!(f, "Invalid character '{c}' in amount, only digits are allowed")
            }
            AmountError::Negative(v) => write!(f, "Amounts cannot be negative, got {v}"),
            AmountError::TooLarge => write!(f, "The amount is too large"),
        }
    }
}

impl std::error::Error for AmountError {}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parses a whole amount as typed into the form, e.g. `100,000` or `100000`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(after_minus) = trimmed.strip_prefix('-') {
            if after_minus.chars().any(|c| c.is_ascii_digit()) {
                return Err(AmountError::Negative(Decimal::NEGATIVE_ONE));
            }
        }

        let mut digits = String::with_capacity(trimmed.len());
        for c in trimmed.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
            } else if !GROUP_SEPARATORS.contains(&c) {
                return Err(AmountError::InvalidCharacter(c));
            }
        }
        if digits.is_empty() {
            return Err(AmountError::Empty);
        }

        let units: u64 = digits.parse().map_err(|_| AmountError::TooLarge)?;
        Ok(Amount::from_units(units))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // '.' groups thousands and ',' separates decimals. The digits come straight from the
        // decimal so that large amounts are shown exactly.
        let plain = self.0.normalize().abs().to_string();
        let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), ""));
        write!(f, "{}", group_thousands(int_part))?;
        let frac_part = frac_part.trim_end_matches('0');
        if !frac_part.is_empty() {
            write!(f, ",{frac_part}")?;
        }
        Ok(())
    }
}

/// Inserts a '.' between every group of three digits, counting from the right.
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // The plain decimal value, without group separators, so that it reads back losslessly.
        serializer.serialize_str(&self.0.normalize().to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let value = Decimal::from_str(s.trim()).map_err(serde::de::Error::custom)?;
        Amount::new(value).map_err(serde::de::Error::custom)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
