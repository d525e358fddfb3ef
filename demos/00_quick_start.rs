/// quick start - book a car, drive it, settle up
use vehicle_pool_rs::{
    CompleteTrip, CreateBooking, Distance, DistanceRate, StartTrip, Uuid, Vehicle, VehiclePool,
    SafeTimeProvider, TimeSource,
};
use chrono::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let mut pool = VehiclePool::default();

    // one car, 0.25 per km
    let owner = Uuid::new_v4();
    let car = pool.add_vehicle(Vehicle::new(
        "Clio",
        owner,
        Distance::from_units(48_200),
        DistanceRate::from_minor(25, 2),
    ));

    // reserve it for the afternoon
    let driver = Uuid::new_v4();
    let booking = pool.create_booking(
        CreateBooking {
            vehicle_id: car,
            requester: driver,
            start: time.now() + Duration::hours(1),
            end: time.now() + Duration::hours(5),
            emergency: false,
        },
        &time,
    )?;

    // drive 64 km
    let trip = pool
        .start_trip(
            StartTrip {
                booking_id: booking.id,
                driver,
                start_odometer: Some(Distance::from_units(48_200)),
            },
            &time,
        )?
        .trip;
    let done = pool.complete_trip(
        CompleteTrip {
            trip_id: trip.id,
            end_odometer: Distance::from_units(48_264),
            notes: Some("groceries".to_string()),
        },
        &time,
    )?;

    println!("trip cost: {}", done.trip.cost.unwrap_or_default());
    println!("driver owes: {}", pool.balance_for(driver, car)?.balance);
    println!("{}", pool.to_json_pretty(time.now())?);

    Ok(())
}
