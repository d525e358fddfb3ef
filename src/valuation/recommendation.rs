use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RateConfig;
use crate::decimal::{Distance, DistanceRate, Money};
use crate::errors::{PoolError, Result};
use crate::payments::Payment;
use crate::types::{RateDecision, VehicleId};
use crate::valuation::{DepreciationOutput, ValuationEngine};
use crate::vehicle::LifecycleParams;

/// cost figures and usage observed over a window of months
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationInput {
    pub current_rate: DistanceRate,
    pub current_odometer: Distance,
    pub fuel_cost: Money,
    /// maintenance, repair and care spend
    pub maintenance_cost: Money,
    pub insurance_annual: Money,
    pub tax_annual: Money,
    pub current_year: i32,
    pub lifecycle: LifecycleParams,
    pub distance_driven: Distance,
    pub window_months: i32,
}

/// projected revenue if the observed distance recurs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueProjection {
    pub at_current_rate: Money,
    pub at_recommended_rate: Money,
    pub difference: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecommendation {
    pub fuel_per_distance: DistanceRate,
    pub fixed_per_distance: DistanceRate,
    pub maintenance_per_distance: DistanceRate,
    pub depreciation_per_distance: DistanceRate,
    pub depreciation_available: bool,
    pub depreciation: Option<DepreciationOutput>,
    pub annual_distance_basis: Distance,
    pub total_per_distance: DistanceRate,
    pub recommended_rate: DistanceRate,
    pub current_rate: DistanceRate,
    pub delta: DistanceRate,
    /// `None` when the current rate is zero
    pub delta_percent: Option<Decimal>,
    pub decision: RateDecision,
    pub revenue: RevenueProjection,
}

/// confirmed spend on a vehicle, split the way the recommendation needs it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostTotals {
    pub fuel: Money,
    pub maintenance: Money,
}

impl CostTotals {
    /// sum confirmed payments for `vehicle_id` recorded at or after `since`
    pub fn from_payments<'a>(
        payments: impl IntoIterator<Item = &'a Payment>,
        vehicle_id: VehicleId,
        since: DateTime<Utc>,
    ) -> Self {
        payments
            .into_iter()
            .filter(|p| p.vehicle_id == vehicle_id && p.is_confirmed() && p.created_at >= since)
            .fold(CostTotals::default(), |mut totals, p| {
                if p.category.is_fuel() {
                    totals.fuel += p.amount;
                } else if p.category.is_upkeep() {
                    totals.maintenance += p.amount;
                }
                totals
            })
    }
}

/// composes running costs and depreciation into a per-distance rate
pub struct RateRecommendationEngine {
    pub rate_scale: u32,
    pub decision_band_percent: Decimal,
}

impl Default for RateRecommendationEngine {
    fn default() -> Self {
        Self::new(&RateConfig::default())
    }
}

impl RateRecommendationEngine {
    pub fn new(config: &RateConfig) -> Self {
        Self {
            rate_scale: config.rate_scale,
            decision_band_percent: config.decision_band_percent,
        }
    }

    pub fn recommend(&self, input: &RecommendationInput) -> Result<RateRecommendation> {
        if !input.distance_driven.is_positive() || input.window_months <= 0 {
            return Err(PoolError::InvalidObservationWindow {
                distance_driven: input.distance_driven,
                window_months: input.window_months,
            });
        }

        let fuel_per_distance = input.fuel_cost.per_distance(input.distance_driven);

        let annual_distance_basis = input.lifecycle.estimated_annual_distance.unwrap_or_else(|| {
            Distance::from_decimal(
                input.distance_driven.as_decimal() * dec!(12) / Decimal::from(input.window_months),
            )
        });

        let fixed_per_distance = (input.insurance_annual + input.tax_annual).per_distance(annual_distance_basis);
        let maintenance_per_distance = input.maintenance_cost.per_distance(input.distance_driven);

        let depreciation = input
            .lifecycle
            .valuation_input(input.current_year, input.current_odometer)
            .and_then(|valuation| match ValuationEngine::compute_depreciation(&valuation) {
                Ok(output) => Some(output),
                Err(e) => {
                    debug!(error = %e, "lifecycle parameters unusable, depreciation skipped");
                    None
                }
            });
        let depreciation_per_distance = depreciation
            .as_ref()
            .map(|d| d.depreciation_per_distance)
            .unwrap_or(DistanceRate::ZERO);

        let total_per_distance =
            fuel_per_distance + fixed_per_distance + maintenance_per_distance + depreciation_per_distance;
        let recommended_rate = total_per_distance.round_to_unit(self.rate_scale);

        let delta = recommended_rate - input.current_rate;
        let delta_percent = if input.current_rate.is_zero() {
            None
        } else {
            Some(delta.as_decimal() / input.current_rate.as_decimal() * dec!(100))
        };
        let decision = self.decide(delta_percent, recommended_rate);

        let at_current_rate = input.distance_driven * input.current_rate;
        let at_recommended_rate = input.distance_driven * recommended_rate;

        Ok(RateRecommendation {
            fuel_per_distance,
            fixed_per_distance,
            maintenance_per_distance,
            depreciation_per_distance,
            depreciation_available: depreciation.is_some(),
            depreciation,
            annual_distance_basis,
            total_per_distance,
            recommended_rate,
            current_rate: input.current_rate,
            delta,
            delta_percent,
            decision,
            revenue: RevenueProjection {
                at_current_rate,
                at_recommended_rate,
                difference: at_recommended_rate - at_current_rate,
            },
        })
    }

    fn decide(&self, delta_percent: Option<Decimal>, recommended_rate: DistanceRate) -> RateDecision {
        match delta_percent {
            Some(p) if p > self.decision_band_percent => RateDecision::Increase,
            Some(p) if p < -self.decision_band_percent => RateDecision::Decrease,
            Some(_) => RateDecision::Keep,
            // no active rate yet
            None if recommended_rate.as_decimal() > Decimal::ZERO => RateDecision::Increase,
            None => RateDecision::Keep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentCategory;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn input() -> RecommendationInput {
        RecommendationInput {
            current_rate: DistanceRate::from_minor(25, 2),
            current_odometer: Distance::from_units(60_000),
            fuel_cost: Money::from_major(1_500),
            maintenance_cost: Money::from_major(500),
            insurance_annual: Money::from_major(800),
            tax_annual: Money::from_major(400),
            current_year: 2025,
            lifecycle: LifecycleParams::default(),
            distance_driven: Distance::from_units(10_000),
            window_months: 12,
        }
    }

    #[test]
    fn test_recommendation_without_lifecycle() {
        let engine = RateRecommendationEngine::default();
        let result = engine.recommend(&input()).unwrap();

        assert_eq!(result.fuel_per_distance.as_decimal(), dec!(0.15));
        assert_eq!(result.fixed_per_distance.as_decimal(), dec!(0.12));
        assert_eq!(result.maintenance_per_distance.as_decimal(), dec!(0.05));
        assert_eq!(result.depreciation_per_distance, DistanceRate::ZERO);
        assert!(!result.depreciation_available);
        assert_eq!(result.recommended_rate.as_decimal(), dec!(0.32));
        assert_eq!(result.delta_percent, Some(dec!(28)));
        assert_eq!(result.decision, RateDecision::Increase);
        assert_eq!(result.revenue.at_current_rate, Money::from_major(2_500));
        assert_eq!(result.revenue.at_recommended_rate, Money::from_major(3_200));
        assert_eq!(result.revenue.difference, Money::from_major(700));
    }

    #[test]
    fn test_short_window_is_annualized() {
        let engine = RateRecommendationEngine::default();
        let mut input = input();
        input.distance_driven = Distance::from_units(2_500);
        input.window_months = 3;
        input.fuel_cost = Money::from_major(375);
        input.maintenance_cost = Money::from_major(125);

        let result = engine.recommend(&input).unwrap();

        assert_eq!(result.annual_distance_basis, Distance::from_units(10_000));
        assert_eq!(result.recommended_rate.as_decimal(), dec!(0.32));
    }

    #[test]
    fn test_depreciation_included_with_full_lifecycle() {
        let engine = RateRecommendationEngine::default();
        let mut input = input();
        input.current_odometer = Distance::from_units(150_000);
        input.lifecycle = LifecycleParams {
            build_year: Some(2017),
            residual_value: Some(Money::from_major(7_000)),
            end_of_life_distance: Some(Distance::from_units(250_000)),
            end_of_life_age_years: Some(15),
            estimated_annual_distance: Some(Distance::from_units(15_000)),
        };

        let result = engine.recommend(&input).unwrap();

        assert!(result.depreciation_available);
        assert_eq!(result.depreciation_per_distance.round_to_unit(4).as_decimal(), dec!(0.07));
        // fixed costs spread over the estimated 15000 per year
        assert_eq!(result.fixed_per_distance.as_decimal(), dec!(0.08));
        // 0.15 + 0.08 + 0.05 + 0.07
        assert_eq!(result.recommended_rate.as_decimal(), dec!(0.35));
    }

    #[test]
    fn test_invalid_lifecycle_flags_depreciation_unavailable() {
        let engine = RateRecommendationEngine::default();
        let mut input = input();
        input.lifecycle = LifecycleParams {
            build_year: Some(2030),
            residual_value: Some(Money::from_major(7_000)),
            end_of_life_distance: Some(Distance::from_units(250_000)),
            end_of_life_age_years: Some(15),
            estimated_annual_distance: Some(Distance::from_units(10_000)),
        };

        let result = engine.recommend(&input).unwrap();
        assert!(!result.depreciation_available);
        assert_eq!(result.depreciation_per_distance, DistanceRate::ZERO);
    }

    #[test]
    fn test_dead_band_keeps_rate() {
        let engine = RateRecommendationEngine::default();
        let mut input = input();
        input.current_rate = DistanceRate::from_minor(31, 2);

        let result = engine.recommend(&input).unwrap();
        assert_eq!(result.decision, RateDecision::Keep);

        input.current_rate = DistanceRate::from_minor(40, 2);
        let result = engine.recommend(&input).unwrap();
        assert_eq!(result.decision, RateDecision::Decrease);
    }

    #[test]
    fn test_zero_current_rate() {
        let engine = RateRecommendationEngine::default();
        let mut input = input();
        input.current_rate = DistanceRate::ZERO;

        let result = engine.recommend(&input).unwrap();
        assert_eq!(result.delta_percent, None);
        assert_eq!(result.decision, RateDecision::Increase);
    }

    #[test]
    fn test_invalid_observation_window() {
        let engine = RateRecommendationEngine::default();

        let mut input = input();
        input.distance_driven = Distance::ZERO;
        assert!(matches!(
            engine.recommend(&input),
            Err(PoolError::InvalidObservationWindow { .. })
        ));

        let mut input = self::input();
        input.window_months = 0;
        assert!(matches!(
            engine.recommend(&input),
            Err(PoolError::InvalidObservationWindow { .. })
        ));
    }

    #[test]
    fn test_cost_totals_from_confirmed_payments() {
        let vehicle_id = Uuid::new_v4();
        let payer = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();

        let mut fuel = Payment::new(payer, vehicle_id, Money::from_major(60), PaymentCategory::Fuel, at);
        fuel.driver_confirmed = true;
        fuel.owner_confirmed = true;
        fuel.refresh_status(at);

        let mut repair = Payment::new(payer, vehicle_id, Money::from_major(200), PaymentCategory::Repair, at);
        repair.driver_confirmed = true;
        repair.owner_confirmed = true;
        repair.refresh_status(at);

        let pending = Payment::new(payer, vehicle_id, Money::from_major(80), PaymentCategory::Fuel, at);
        let cash = {
            let mut p = Payment::new(payer, vehicle_id, Money::from_major(30), PaymentCategory::Cash, at);
            p.driver_confirmed = true;
            p.owner_confirmed = true;
            p.refresh_status(at);
            p
        };

        let totals = CostTotals::from_payments(&[fuel, repair, pending, cash], vehicle_id, at);
        assert_eq!(totals.fuel, Money::from_major(60));
        assert_eq!(totals.maintenance, Money::from_major(200));
    }
}
