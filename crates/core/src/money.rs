use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Converts a float, returning `None` for NaN, infinities and values
    /// outside the decimal range.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Decimal::from_f64(value).map(Money)
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    /// Parses a US-style currency string: `$1,234.50`, `-12`, `(500.00)`.
    ///
    /// A wrapping parenthesis pair marks an accounting negative. Returns
    /// `None` for blank or non-numeric input.
    pub fn parse(raw: &str) -> Option<Money> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }

        let wrapped_negative = text.starts_with('(') && text.ends_with(')');
        let text = text.strip_prefix('(').unwrap_or(text);
        let text = text.strip_suffix(')').unwrap_or(text);
        let normalized: String = text
            .chars()
            .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
            .collect();
        if normalized.is_empty() {
            return None;
        }

        let value = Decimal::from_str(&normalized)
            .or_else(|_| Decimal::from_scientific(&normalized))
            .ok()?;
        Some(if wrapped_negative { Money(-value) } else { Money(value) })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.0.abs().round_dp(2);
        let text = format!("{rounded:.2}");
        let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        let sign = if self.is_negative() && !rounded.is_zero() { "-" } else { "" };
        write!(f, "{sign}${grouped}.{cents}")
    }
}

/// Saturates at the decimal bounds instead of overflowing.
impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
