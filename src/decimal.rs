use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};
use std::str::FromStr;

/// Money type with 8 decimal places internal precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    pub const ONE: Money = Money(Decimal::ONE);

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d.round_dp(8))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money(Decimal::from_str(s)?.round_dp(8)))
    }

    /// create from integer amount (euros, dollars, etc)
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// create from minor amount (cents, etc)
    pub fn from_minor(amount: i64, scale: u32) -> Self {
        let d = Decimal::from(amount) / Decimal::from(10_u64.pow(scale));
        Money(d.round_dp(8))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn round_dp(&self, dp: u32) -> Self {
        Money(self.0.round_dp(dp))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// strictly below zero
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// spread an amount over a distance, e.g. fuel spend per kilometre
    pub fn per_distance(&self, distance: Distance) -> DistanceRate {
        if !distance.is_positive() {
            return DistanceRate::ZERO;
        }
        DistanceRate::from_decimal(self.0 / distance.as_decimal())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<i32> for Money {
    fn from(i: i32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money((self.0 + other.0).round_dp(8))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = (self.0 + other.0).round_dp(8);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money((self.0 - other.0).round_dp(8))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 = (self.0 - other.0).round_dp(8);
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, other: Decimal) -> Money {
        Money((self.0 * other).round_dp(8))
    }
}

impl Div<Decimal> for Money {
    type Output = Money;

    fn div(self, other: Decimal) -> Money {
        Money((self.0 / other).round_dp(8))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

/// distance travelled or an odometer reading, in the pool's distance unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Distance(Decimal);

impl Distance {
    pub const ZERO: Distance = Distance(Decimal::ZERO);

    pub fn from_decimal(d: Decimal) -> Self {
        Distance(d)
    }

    /// whole distance units (km, mi)
    pub fn from_units(units: i64) -> Self {
        Distance(Decimal::from(units))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn max(self, other: Self) -> Self {
        Distance(self.0.max(other.0))
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Distance {
    fn from(units: i64) -> Self {
        Distance::from_units(units)
    }
}

impl Add for Distance {
    type Output = Distance;

    fn add(self, other: Distance) -> Distance {
        Distance(self.0 + other.0)
    }
}

impl AddAssign for Distance {
    fn add_assign(&mut self, other: Distance) {
        self.0 += other.0;
    }
}

impl Sub for Distance {
    type Output = Distance;

    fn sub(self, other: Distance) -> Distance {
        Distance(self.0 - other.0)
    }
}

impl Mul<DistanceRate> for Distance {
    type Output = Money;

    fn mul(self, rate: DistanceRate) -> Money {
        Money::from_decimal(self.0 * rate.as_decimal())
    }
}

impl std::iter::Sum for Distance {
    fn sum<I: Iterator<Item = Distance>>(iter: I) -> Self {
        iter.fold(Distance::ZERO, |acc, d| acc + d)
    }
}

/// price charged per distance unit driven (e.g. 0.25 per km)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct DistanceRate(Decimal);

impl DistanceRate {
    pub const ZERO: DistanceRate = DistanceRate(Decimal::ZERO);

    pub fn from_decimal(d: Decimal) -> Self {
        DistanceRate(d)
    }

    /// create from minor units per distance unit (e.g. 25 cents per km)
    pub fn from_minor(amount: i64, scale: u32) -> Self {
        DistanceRate(Decimal::from(amount) / Decimal::from(10_u64.pow(scale)))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// round to the smallest billable unit (2 dp = cents)
    pub fn round_to_unit(&self, scale: u32) -> Self {
        DistanceRate(self.0.round_dp(scale))
    }
}

impl fmt::Display for DistanceRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/unit", self.0)
    }
}

impl From<Decimal> for DistanceRate {
    fn from(d: Decimal) -> Self {
        DistanceRate::from_decimal(d)
    }
}

impl Add for DistanceRate {
    type Output = DistanceRate;

    fn add(self, other: DistanceRate) -> DistanceRate {
        DistanceRate(self.0 + other.0)
    }
}

impl Sub for DistanceRate {
    type Output = DistanceRate;

    fn sub(self, other: DistanceRate) -> DistanceRate {
        DistanceRate(self.0 - other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_precision() {
        let m = Money::from_str_exact("100.123456789").unwrap();
        assert_eq!(m.to_string(), "100.12345679"); // rounded to 8 places
    }

    #[test]
    fn test_trip_cost() {
        let distance = Distance::from_units(120);
        let rate = DistanceRate::from_minor(25, 2);

        assert_eq!(distance * rate, Money::from_major(30));
    }

    #[test]
    fn test_per_distance_guards_zero() {
        let fuel = Money::from_major(1_500);

        assert_eq!(fuel.per_distance(Distance::from_units(10_000)).as_decimal(), dec!(0.15));
        assert_eq!(fuel.per_distance(Distance::ZERO), DistanceRate::ZERO);
    }

    #[test]
    fn test_rate_rounds_to_cents() {
        let rate = DistanceRate::from_decimal(dec!(0.3249));
        assert_eq!(rate.round_to_unit(2).as_decimal(), dec!(0.32));

        let rate = DistanceRate::from_decimal(dec!(0.3251));
        assert_eq!(rate.round_to_unit(2).as_decimal(), dec!(0.33));
    }
}
