/// settlement - two drivers, one car, dual-confirmed payments
use vehicle_pool_rs::{
    CompleteTrip, ConfirmingParty, CreateBooking, Distance, DistanceRate, Money, PaymentCategory,
    RecordPayment, SafeTimeProvider, SharedVehiclePool, StartTrip, TimeSource, Uuid, Vehicle,
    VehiclePool,
};
use chrono::{Duration, TimeZone, Utc};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    println!("=== settlement example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 4, 1, 8, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let owner = Uuid::new_v4();
    let (anna, ben) = (Uuid::new_v4(), Uuid::new_v4());

    let shared = SharedVehiclePool::new(VehiclePool::default());
    let car = shared.with_pool(|pool| {
        Ok(pool.add_vehicle(Vehicle::new(
            "Golf",
            owner,
            Distance::from_units(60_000),
            DistanceRate::from_minor(28, 2),
        )))
    })?;

    for (driver, km) in [(anna, 120), (ben, 45), (anna, 300)] {
        shared.with_pool(|pool| {
            let booking = pool.create_booking(
                CreateBooking {
                    vehicle_id: car,
                    requester: driver,
                    start: time.now(),
                    end: time.now() + Duration::hours(6),
                    emergency: false,
                },
                &time,
            )?;
            let start = pool.vehicle(car)?.current_odometer;
            let trip = pool
                .start_trip(
                    StartTrip {
                        booking_id: booking.id,
                        driver,
                        start_odometer: Some(start),
                    },
                    &time,
                )?
                .trip;
            pool.complete_trip(
                CompleteTrip {
                    trip_id: trip.id,
                    end_odometer: start + Distance::from_units(km),
                    notes: None,
                },
                &time,
            )?;
            Ok(())
        })?;
        controller.advance(Duration::days(2));
    }

    // anna pays back part of her debt, ben paid for fuel
    shared.with_pool(|pool| {
        for (payer, amount, category) in [
            (anna, 100, PaymentCategory::Cash),
            (ben, 40, PaymentCategory::Fuel),
        ] {
            let payment = pool.record_payment(
                RecordPayment {
                    payer,
                    vehicle_id: car,
                    amount: Money::from_major(amount),
                    category,
                },
                &time,
            )?;
            pool.confirm_payment(payment.id, payer, ConfirmingParty::Driver, &time)?;
            pool.confirm_payment(payment.id, owner, ConfirmingParty::Owner, &time)?;
        }
        Ok(())
    })?;

    let report = shared.with_pool(|pool| {
        for ((driver, _), entry) in pool.compute_balances() {
            let name = if driver == anna { "anna" } else { "ben" };
            println!("{:>4}: debt {} credit {} balance {}", name, entry.debt, entry.credit, entry.balance);
        }
        let summary = pool.vehicle_summary(car)?;
        println!("\noutstanding on the golf: {}", summary.outstanding);

        pool.to_json_pretty(time.now()).map_err(|e| vehicle_pool_rs::PoolError::Unavailable {
            message: e.to_string(),
        })
    })?;
    println!("\n{}", report);

    Ok(())
}
