use hourglass_rs::SafeTimeProvider;

use crate::booking::Booking;
use crate::errors::{PoolError, Result};
use crate::events::Event;
use crate::rates::RateHistory;
use crate::trips::{CompleteTrip, EditTrip, StartTrip, Trip, TripOutcome};
use crate::types::{BookingStatus, TripStatus};
use crate::vehicle::Vehicle;

/// state machine NoTrip -> Started -> Completed.
/// every transition validates before touching any of its arguments.
pub struct TripLifecycle;

impl TripLifecycle {
    /// open a trip on `booking`; `existing` is the booking's trip, if any
    pub fn start(
        booking: &mut Booking,
        vehicle: &Vehicle,
        existing: Option<&Trip>,
        rates: &RateHistory,
        input: &StartTrip,
        time_provider: &SafeTimeProvider,
    ) -> Result<TripOutcome> {
        let start_odometer = input.start_odometer.ok_or(PoolError::StartOdometerRequired)?;

        if booking.status == BookingStatus::Cancelled {
            return Err(PoolError::BookingCancelled {
                booking_id: booking.id,
            });
        }

        if let Some(trip) = existing {
            return Err(PoolError::TripAlreadyExists {
                booking_id: booking.id,
                trip_id: trip.id,
            });
        }

        let now = time_provider.now();
        let locked_rate = rates.resolve_rate(vehicle, now);
        let conflict = start_odometer != vehicle.current_odometer;

        let trip = Trip::new(
            booking.id,
            vehicle.id,
            input.driver,
            start_odometer,
            locked_rate,
            conflict,
            now,
        );

        let mut effects = vec![Event::TripStarted {
            trip_id: trip.id,
            booking_id: booking.id,
            driver: trip.driver,
            start_odometer,
            timestamp: now,
        }];

        if conflict {
            effects.push(Event::OdometerConflictRecorded {
                trip_id: trip.id,
                vehicle_id: vehicle.id,
                expected: vehicle.current_odometer,
                reported: start_odometer,
                timestamp: now,
            });
        }

        effects.push(booking.transition(BookingStatus::Active, now));

        Ok(TripOutcome { trip, effects })
    }

    /// close a started trip, write the odometer and finish the booking
    pub fn complete(
        trip: &mut Trip,
        booking: &mut Booking,
        vehicle: &mut Vehicle,
        input: &CompleteTrip,
        time_provider: &SafeTimeProvider,
    ) -> Result<TripOutcome> {
        if trip.status != TripStatus::Started {
            return Err(PoolError::InvalidTripState {
                trip_id: trip.id,
                status: trip.status,
                expected: TripStatus::Started,
            });
        }

        if input.end_odometer <= trip.start_odometer {
            return Err(PoolError::EndOdometerNotGreaterThanStart {
                start: trip.start_odometer,
                end: input.end_odometer,
            });
        }

        let now = time_provider.now();
        trip.record_completion(input.end_odometer, input.notes.clone(), now);

        let old_reading = vehicle.current_odometer;
        vehicle.current_odometer = input.end_odometer;

        let mut effects = vec![Event::TripCompleted {
            trip_id: trip.id,
            distance: trip.distance.unwrap_or_default(),
            rate: trip.locked_rate,
            cost: trip.cost.unwrap_or_default(),
            timestamp: now,
        }];

        if old_reading != input.end_odometer {
            effects.push(Event::OdometerUpdated {
                vehicle_id: vehicle.id,
                old_reading,
                new_reading: input.end_odometer,
                timestamp: now,
            });
        }

        effects.push(booking.transition(BookingStatus::Completed, now));

        Ok(TripOutcome {
            trip: trip.clone(),
            effects,
        })
    }

    /// correct the readings of a completed trip. the edit is authoritative:
    /// the conflict flag is recomputed against the vehicle's odometer as it
    /// is now, and the odometer takes the new end reading.
    pub fn edit(
        trip: &mut Trip,
        vehicle: &mut Vehicle,
        input: &EditTrip,
        time_provider: &SafeTimeProvider,
    ) -> Result<TripOutcome> {
        if input.actor != trip.driver {
            return Err(PoolError::NotTripOwner {
                trip_id: trip.id,
                actor: input.actor,
            });
        }

        if trip.status != TripStatus::Completed {
            return Err(PoolError::InvalidTripState {
                trip_id: trip.id,
                status: trip.status,
                expected: TripStatus::Completed,
            });
        }

        if input.new_end <= input.new_start {
            return Err(PoolError::EndOdometerNotGreaterThanStart {
                start: input.new_start,
                end: input.new_end,
            });
        }

        let now = time_provider.now();
        let (distance, cost) = trip.price(input.new_start, input.new_end);
        let conflict = input.new_start != vehicle.current_odometer;

        trip.start_odometer = input.new_start;
        trip.end_odometer = Some(input.new_end);
        trip.distance = Some(distance);
        trip.cost = Some(cost);
        trip.odometer_conflict = conflict;
        trip.conflict_resolved = !conflict;
        if input.notes.is_some() {
            trip.notes = input.notes.clone();
        }

        let mut effects = vec![Event::TripEdited {
            trip_id: trip.id,
            distance,
            cost,
            timestamp: now,
        }];

        if conflict {
            effects.push(Event::OdometerConflictRecorded {
                trip_id: trip.id,
                vehicle_id: vehicle.id,
                expected: vehicle.current_odometer,
                reported: input.new_start,
                timestamp: now,
            });
        }

        let old_reading = vehicle.current_odometer;
        vehicle.current_odometer = input.new_end;
        if old_reading != input.new_end {
            effects.push(Event::OdometerUpdated {
                vehicle_id: vehicle.id,
                old_reading,
                new_reading: input.new_end,
                timestamp: now,
            });
        }

        Ok(TripOutcome {
            trip: trip.clone(),
            effects,
        })
    }

    /// mark a recorded odometer conflict as handled by a human
    pub fn resolve_conflict(trip: &mut Trip, time_provider: &SafeTimeProvider) -> Result<TripOutcome> {
        if !trip.has_open_conflict() {
            return Err(PoolError::NoOpenConflict { trip_id: trip.id });
        }

        trip.conflict_resolved = true;

        Ok(TripOutcome {
            trip: trip.clone(),
            effects: vec![Event::OdometerConflictResolved {
                trip_id: trip.id,
                timestamp: time_provider.now(),
            }],
        })
    }
}
