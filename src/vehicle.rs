use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Distance, DistanceRate, Money};
use crate::types::{MemberId, VehicleId};
use crate::valuation::ValuationInput;

/// economic lifecycle parameters of a vehicle, all optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifecycleParams {
    pub build_year: Option<i32>,
    /// value still to be written off over the remaining life
    pub residual_value: Option<Money>,
    pub end_of_life_distance: Option<Distance>,
    pub end_of_life_age_years: Option<i32>,
    pub estimated_annual_distance: Option<Distance>,
}

impl LifecycleParams {
    /// build a valuation input when every parameter is present
    pub fn valuation_input(&self, current_year: i32, current_odometer: Distance) -> Option<ValuationInput> {
        Some(ValuationInput {
            current_year,
            build_year: self.build_year?,
            residual_value: self.residual_value?,
            end_of_life_distance: self.end_of_life_distance?,
            end_of_life_age_years: self.end_of_life_age_years?,
            estimated_annual_distance: self.estimated_annual_distance?,
            current_odometer,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.build_year.is_some()
            && self.residual_value.is_some()
            && self.end_of_life_distance.is_some()
            && self.end_of_life_age_years.is_some()
            && self.estimated_annual_distance.is_some()
    }
}

/// a vehicle shared in the pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    pub owner: MemberId,
    /// last known odometer reading, written only by trip completion and trip edits
    pub current_odometer: Distance,
    /// cache of the currently effective rate history entry
    pub cached_rate: DistanceRate,
    pub lifecycle: LifecycleParams,
    /// only emergency (quick) bookings are accepted
    pub emergency_only: bool,
}

impl Vehicle {
    pub fn new(name: impl Into<String>, owner: MemberId, odometer: Distance, rate: DistanceRate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner,
            current_odometer: odometer,
            cached_rate: rate,
            lifecycle: LifecycleParams::default(),
            emergency_only: false,
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: LifecycleParams) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn emergency_only(mut self, emergency_only: bool) -> Self {
        self.emergency_only = emergency_only;
        self
    }

    pub fn is_owned_by(&self, member: MemberId) -> bool {
        self.owner == member
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valuation_input_requires_all_params() {
        let mut lifecycle = LifecycleParams {
            build_year: Some(2017),
            residual_value: Some(Money::from_major(7_000)),
            end_of_life_distance: Some(Distance::from_units(250_000)),
            end_of_life_age_years: Some(15),
            estimated_annual_distance: None,
        };
        assert!(!lifecycle.is_complete());
        assert!(lifecycle.valuation_input(2025, Distance::from_units(150_000)).is_none());

        lifecycle.estimated_annual_distance = Some(Distance::from_units(15_000));
        let input = lifecycle.valuation_input(2025, Distance::from_units(150_000)).unwrap();
        assert_eq!(input.build_year, 2017);
        assert_eq!(input.current_odometer, Distance::from_units(150_000));
    }
}
