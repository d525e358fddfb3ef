/// rate recommendation - what should a kilometre cost?
use vehicle_pool_rs::{
    Distance, DistanceRate, LifecycleParams, Money, RateRecommendationEngine, RecommendationInput,
    ValuationEngine,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== rate recommendation example ===\n");

    let lifecycle = LifecycleParams {
        build_year: Some(2017),
        residual_value: Some(Money::from_major(7_000)),
        end_of_life_distance: Some(Distance::from_units(250_000)),
        end_of_life_age_years: Some(15),
        estimated_annual_distance: Some(Distance::from_units(15_000)),
    };
    let odometer = Distance::from_units(150_000);

    if let Some(input) = lifecycle.valuation_input(2025, odometer) {
        let depreciation = ValuationEngine::compute_depreciation(&input)?;
        println!("remaining years:      {}", depreciation.remaining_years.round_dp(2));
        println!("annual depreciation:  {}", depreciation.annual_depreciation.round_dp(2));
        println!("monthly depreciation: {}", depreciation.monthly_depreciation.round_dp(2));
        println!("per km:               {}\n", depreciation.depreciation_per_distance.round_to_unit(4));
    }

    let engine = RateRecommendationEngine::default();
    let recommendation = engine.recommend(&RecommendationInput {
        current_rate: DistanceRate::from_minor(25, 2),
        current_odometer: odometer,
        fuel_cost: Money::from_major(1_500),
        maintenance_cost: Money::from_major(500),
        insurance_annual: Money::from_major(800),
        tax_annual: Money::from_major(400),
        current_year: 2025,
        lifecycle,
        distance_driven: Distance::from_units(10_000),
        window_months: 12,
    })?;

    println!("fuel:         {}", recommendation.fuel_per_distance);
    println!("fixed:        {}", recommendation.fixed_per_distance);
    println!("maintenance:  {}", recommendation.maintenance_per_distance);
    println!("depreciation: {}", recommendation.depreciation_per_distance);
    println!("recommended:  {} ({:?})", recommendation.recommended_rate, recommendation.decision);
    println!("revenue delta over the window: {}", recommendation.revenue.difference);

    Ok(())
}
