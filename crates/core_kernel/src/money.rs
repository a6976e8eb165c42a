//! Money with precise decimal arithmetic
//!
//! This module provides a type-safe representation of monetary values using
//! rust_decimal. All amounts are in BRL and carry exactly two decimal places;
//! rounding happens once, at construction.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use thiserror::Error;

/// Number of decimal places carried by every amount.
pub const DECIMAL_PLACES: u32 = 2;

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Amount would become negative: {0}")]
    NegativeAmount(Decimal),
}

/// A monetary amount in BRL
///
/// Amounts are stored with exactly two decimal places. The half-up rounding
/// at construction matches the `quantize(Decimal('0.01'))` behaviour of the
/// transactional store feeding this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a new amount, rounding to two decimal places
    pub fn new(amount: Decimal) -> Self {
        Self(amount.round_dp(DECIMAL_PLACES))
    }

    /// Creates an amount from an integer number of centavos
    pub fn from_minor(minor_units: i64) -> Self {
        Self(Decimal::new(minor_units, DECIMAL_PLACES))
    }

    /// The zero amount
    pub fn zero() -> Self {
        Self(dec!(0))
    }

    /// Returns the underlying decimal value
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Adds two amounts, rounding the sum to two decimal places
    pub fn add_rounded(&self, other: &Money) -> Money {
        Self::new(self.0 + other.0)
    }

    /// Subtraction that refuses to go below zero
    ///
    /// Balances are never negative; any operation that would violate this
    /// must fail instead of clamping.
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        let result = self.0 - other.0;
        if result.is_sign_negative() && !result.is_zero() {
            return Err(MoneyError::NegativeAmount(result));
        }
        Ok(Self::new(result))
    }

    /// Multiplies by a scalar (e.g. distance x rate), rounding the result
    pub fn multiply(&self, factor: Decimal) -> Self {
        Self::new(self.0 * factor)
    }

    /// Splits the total into `n` equal parts, rounded to two decimal places
    ///
    /// This is the per-installment amount for deferred-settlement methods.
    pub fn split(&self, n: u32) -> Result<Money, MoneyError> {
        if n == 0 {
            return Err(MoneyError::DivisionByZero);
        }
        Ok(Self::new(self.0 / Decimal::from(n)))
    }

    /// Formats the amount with exactly two decimal places and no separators,
    /// as required by the instant-payment payload
    pub fn to_wire(&self) -> String {
        format!("{:.2}", self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R$ {:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.add_rounded(&other)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.0 - other.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_rounds_at_construction() {
        let m = Money::new(dec!(10.555));
        assert_eq!(m.amount(), dec!(10.56));
    }

    #[test]
    fn test_money_from_minor() {
        let m = Money::from_minor(10050);
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(dec!(100.00));
        let b = Money::new(dec!(50.00));

        assert_eq!((a + b).amount(), dec!(150.00));
        assert_eq!((a - b).amount(), dec!(50.00));
    }

    #[test]
    fn test_add_rounded_is_total() {
        let a = Money::new(dec!(0.10));
        let b = Money::new(dec!(0.25));
        assert_eq!(a.add_rounded(&b).amount(), dec!(0.35));
    }

    #[test]
    fn test_checked_sub_refuses_negative() {
        let a = Money::new(dec!(10.00));
        let b = Money::new(dec!(10.01));

        let result = a.checked_sub(&b);
        assert!(matches!(result, Err(MoneyError::NegativeAmount(_))));
    }

    #[test]
    fn test_multiply_rounds() {
        // 10 km at 5.00/km
        let rate = Money::new(dec!(5.00));
        let total = rate.multiply(dec!(10));
        assert_eq!(total.amount(), dec!(50.00));

        // 3.3 km at 1.99/km = 6.567 -> 6.57
        let rate = Money::new(dec!(1.99));
        assert_eq!(rate.multiply(dec!(3.3)).amount(), dec!(6.57));
    }

    #[test]
    fn test_split_installments() {
        let total = Money::new(dec!(100.00));
        assert_eq!(total.split(3).unwrap().amount(), dec!(33.33));
        assert_eq!(total.split(1).unwrap().amount(), dec!(100.00));
        assert!(matches!(total.split(0), Err(MoneyError::DivisionByZero)));
    }

    #[test]
    fn test_wire_format() {
        assert_eq!(Money::new(dec!(123.45)).to_wire(), "123.45");
        assert_eq!(Money::new(dec!(7)).to_wire(), "7.00");
        assert_eq!(Money::new(dec!(0.5)).to_wire(), "0.50");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn addition_is_commutative(a in 0i64..1_000_000_000i64, b in 0i64..1_000_000_000i64) {
            let ma = Money::from_minor(a);
            let mb = Money::from_minor(b);
            prop_assert_eq!(ma + mb, mb + ma);
        }

        #[test]
        fn split_never_exceeds_total(total in 1i64..1_000_000_000i64, n in 1u32..=12u32) {
            let money = Money::from_minor(total);
            let part = money.split(n).unwrap();
            // Each rounded part stays within half a centavo of total/n.
            let exact = money.amount() / Decimal::from(n);
            prop_assert!((part.amount() - exact).abs() <= Decimal::new(5, 3));
        }
    }
}
