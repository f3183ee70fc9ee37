use crate::error::CartError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

/// A monetary total (subtotals, fees, order totals).
///
/// Wraps `rust_decimal::Decimal` so cart arithmetic never goes through
/// floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Money(pub Decimal);

/// The price of a single seat.
///
/// Always within `0..=Price::MAX`; constructed through [`Price::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    pub const MAX: Decimal = dec!(1000000000);

    pub fn new(value: Decimal) -> Result<Self, CartError> {
        if value < Decimal::ZERO {
            return Err(CartError::InvalidOfferingData(format!(
                "price must not be negative, got {value}"
            )));
        }
        if value > Self::MAX {
            return Err(CartError::InvalidOfferingData(format!(
                "price {value} exceeds {}",
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = CartError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Money {
    fn from(price: Price) -> Self {
        Self(price.0)
    }
}

impl Mul<u32> for Price {
    type Output = Money;
    fn mul(self, seats: u32) -> Money {
        Money(self.0.saturating_mul(Decimal::from(seats)))
    }
}

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl Add for Money {
    type Output = Self;
    // Saturates at `Decimal::MAX` instead of panicking.
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_validation() {
        assert!(Price::new(dec!(450.0)).is_ok());
        assert!(Price::new(dec!(0)).is_ok());
        assert!(matches!(
            Price::new(dec!(-1.0)),
            Err(CartError::InvalidOfferingData(_))
        ));
    }

    #[test]
    fn test_price_upper_bound() {
        assert!(Price::new(Price::MAX).is_ok());
        assert!(matches!(
            Price::new(dec!(79228162514264337593543950335)),
            Err(CartError::InvalidOfferingData(_))
        ));
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::new(Decimal::MAX);
        assert_eq!(huge + Money::new(dec!(50)), Money::new(Decimal::MAX));

        let mut total = huge;
        total += huge;
        assert_eq!(total, Money::new(Decimal::MAX));

        let top = Price::new(Price::MAX).unwrap();
        assert_eq!(top * u32::MAX, Money::new(Price::MAX * Decimal::from(u32::MAX)));
    }

    #[test]
    fn test_price_times_seats() {
        let price = Price::new(dec!(450.50)).unwrap();
        assert_eq!(price * 3, Money::new(dec!(1351.50)));
        assert_eq!(price * 0, Money::ZERO);
    }

    #[test]
    fn test_money_sum_and_display() {
        let total: Money = [Money::new(dec!(10.10)), Money::new(dec!(5.40))]
            .into_iter()
            .sum();
        assert_eq!(total, Money::new(dec!(15.5)));
        assert_eq!(total.to_string(), "15.5");
        assert_eq!(Money::new(dec!(1000.00)).to_string(), "1000");
    }
}
