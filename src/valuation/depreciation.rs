use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Distance, DistanceRate, Money};
use crate::errors::{PoolError, Result};

/// lifecycle figures of a single vehicle at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationInput {
    pub current_year: i32,
    pub build_year: i32,
    pub residual_value: Money,
    pub end_of_life_distance: Distance,
    pub end_of_life_age_years: i32,
    pub estimated_annual_distance: Distance,
    pub current_odometer: Distance,
}

impl ValuationInput {
    pub fn validate(&self) -> Result<()> {
        if !self.estimated_annual_distance.is_positive() {
            return Err(PoolError::valuation("estimated annual distance must be positive"));
        }
        if self.residual_value.is_negative() {
            return Err(PoolError::valuation("residual value cannot be negative"));
        }
        if self.current_odometer.is_negative() {
            return Err(PoolError::valuation("odometer reading cannot be negative"));
        }
        if !self.end_of_life_distance.is_positive() {
            return Err(PoolError::valuation("end-of-life distance must be positive"));
        }
        if self.end_of_life_age_years <= 0 {
            return Err(PoolError::valuation("end-of-life age must be positive"));
        }
        if self.current_year < self.build_year {
            return Err(PoolError::valuation(format!(
                "current year {} precedes build year {}",
                self.current_year, self.build_year
            )));
        }
        Ok(())
    }
}

/// remaining economic life and the resulting value loss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationOutput {
    pub age_years: i32,
    pub remaining_years_by_age: Decimal,
    pub remaining_distance: Distance,
    pub remaining_years_by_distance: Decimal,
    /// whichever life boundary is hit first
    pub remaining_years: Decimal,
    pub annual_depreciation: Money,
    pub monthly_depreciation: Money,
    pub effective_remaining_distance: Distance,
    pub depreciation_per_distance: DistanceRate,
}

impl DepreciationOutput {
    pub fn is_end_of_life(&self) -> bool {
        self.remaining_years.is_zero()
    }
}

/// linear write-off of the residual value over the remaining life
pub struct ValuationEngine;

impl ValuationEngine {
    pub fn compute_depreciation(input: &ValuationInput) -> Result<DepreciationOutput> {
        input.validate()?;

        let age_years = input.current_year - input.build_year;
        let remaining_years_by_age = Decimal::from((input.end_of_life_age_years - age_years).max(0));

        let remaining_distance = (input.end_of_life_distance - input.current_odometer).max(Distance::ZERO);
        let remaining_years_by_distance =
            remaining_distance.as_decimal() / input.estimated_annual_distance.as_decimal();

        let remaining_years = if remaining_years_by_age.is_zero() || remaining_years_by_distance.is_zero() {
            Decimal::ZERO
        } else {
            remaining_years_by_age.min(remaining_years_by_distance)
        };

        let annual_depreciation = if remaining_years > Decimal::ZERO {
            input.residual_value / remaining_years
        } else {
            Money::ZERO
        };
        let monthly_depreciation = annual_depreciation / dec!(12);

        let effective_remaining_distance =
            Distance::from_decimal(input.estimated_annual_distance.as_decimal() * remaining_years);

        let depreciation_per_distance = input.residual_value.per_distance(effective_remaining_distance);

        Ok(DepreciationOutput {
            age_years,
            remaining_years_by_age,
            remaining_distance,
            remaining_years_by_distance,
            remaining_years,
            annual_depreciation,
            monthly_depreciation,
            effective_remaining_distance,
            depreciation_per_distance,
        })
    }
}
