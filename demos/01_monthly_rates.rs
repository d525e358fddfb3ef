/// monthly rates - schedule rate changes and watch them take effect
use vehicle_pool_rs::{
    Distance, DistanceRate, PoolError, SafeTimeProvider, TimeSource, Uuid, Vehicle, VehiclePool,
};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    println!("=== monthly rates example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let mut pool = VehiclePool::default();
    let van = pool.add_vehicle(Vehicle::new(
        "Transporter",
        Uuid::new_v4(),
        Distance::from_units(91_000),
        DistanceRate::from_minor(30, 2),
    ));

    // raise from march, then correct the same month again
    pool.set_rate(van, DistanceRate::from_minor(33, 2), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), &time)?;
    let change = pool.set_rate(van, DistanceRate::from_minor(32, 2), NaiveDate::from_ymd_opt(2025, 3, 20).unwrap(), &time)?;
    println!("march entry replaced {:?} with {}", change.replaced, change.entry.rate);

    // december of last year is closed
    match pool.set_rate(van, DistanceRate::from_minor(10, 2), NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(), &time) {
        Err(PoolError::RetroactiveRateChange { requested, current }) => {
            println!("rejected change for {} (current month {})", requested, current);
        }
        other => println!("unexpected: {:?}", other),
    }

    for _ in 0..3 {
        pool.refresh_rates(&time);
        println!(
            "{}: active rate {}",
            time.now().format("%Y-%m"),
            pool.vehicle(van)?.cached_rate
        );
        controller.advance(Duration::days(31));
    }

    Ok(())
}
