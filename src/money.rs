//! Fixed-point money amounts.

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Sub},
    str::FromStr,
};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// A sum of money with exactly two decimal places.
///
/// Amounts travel as decimal strings (`"1200.00"`) on the wire and in the
/// database so that they never pass through floating point. Parsed and stored
/// amounts are limited to [Amount::MAX] in either direction; sums computed for
/// reports may go past it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

/// The number of decimal places kept by an [Amount].
const SCALE: u32 = 2;

impl Amount {
    /// Zero dollars.
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// The largest amount that can be parsed or stored, 999 999 999 999 999.99.
    pub const MAX: Amount = Amount(Decimal::from_parts(
        0x5D89_FFFF,
        0x0163_4578,
        0,
        false,
        SCALE,
    ));

    /// Create an amount from `value`, rounding to two decimal places.
    pub fn new(value: Decimal) -> Self {
        let mut value = value.round_dp(SCALE);
        value.rescale(SCALE);
        Self(value)
    }

    /// The underlying decimal value.
    pub fn value(self) -> Decimal {
        self.0
    }

    /// Whether the amount is greater than zero.
    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Subtract `rhs`, stopping at zero instead of going negative.
    pub fn saturating_sub(self, rhs: Amount) -> Amount {
        (self - rhs).max(Amount::ZERO)
    }

    /// Add `rhs`, or `None` if the result could not be stored.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0
            .checked_add(rhs.0)
            .map(Amount::new)
            .filter(|sum| sum.is_storable())
    }

    /// Whether the amount is within [Amount::MAX] of zero.
    pub fn is_storable(self) -> bool {
        self.0.abs() <= Amount::MAX.0
    }
}

/// The reasons a string cannot be parsed as an [Amount].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseAmountError {
    /// The text is not a decimal number.
    #[error("\"{0}\" is not a valid decimal number")]
    Invalid(String),
    /// The number has more than two significant decimal places.
    #[error("\"{0}\" has more than two decimal places")]
    TooPrecise(String),
    /// The number is further from zero than [Amount::MAX].
    #[error("\"{0}\" is larger than the maximum amount of 999999999999999.99")]
    TooLarge(String),
}

impl FromStr for Amount {
    type Err = ParseAmountError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        let value = Decimal::from_str_exact(trimmed)
            .map_err(|_| ParseAmountError::Invalid(trimmed.to_owned()))?;

        if value.normalize().scale() > SCALE {
            return Err(ParseAmountError::TooPrecise(trimmed.to_owned()));
        }

        let amount = Amount::new(value);
        if !amount.is_storable() {
            return Err(ParseAmountError::TooLarge(trimmed.to_owned()));
        }

        Ok(amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Self::Output {
        Amount::new(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Self::Output {
        Amount::new(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        if !self.is_storable() {
            return Err(rusqlite::Error::ToSqlConversionFailure(Box::new(
                ParseAmountError::TooLarge(self.to_string()),
            )));
        }

        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}
