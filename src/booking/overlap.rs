use chrono::{DateTime, Utc};

use crate::booking::Booking;
use crate::errors::{PoolError, Result};
use crate::types::Availability;
use crate::vehicle::Vehicle;

/// rejects reservations that intersect a planned or active booking
pub struct BookingOverlapValidator;

impl BookingOverlapValidator {
    /// checks [start, end) against the vehicle's blocking bookings.
    /// must run in the same exclusive step as the insert that follows it.
    pub fn check_availability<'a>(
        vehicle: &Vehicle,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        emergency: bool,
        bookings: impl IntoIterator<Item = &'a Booking>,
    ) -> Result<Availability> {
        if start >= end {
            return Err(PoolError::InvalidBookingWindow { start, end });
        }

        if vehicle.emergency_only && !emergency {
            return Err(PoolError::NotBookable {
                vehicle_id: vehicle.id,
            });
        }

        let conflict = bookings
            .into_iter()
            .filter(|b| b.blocks(vehicle.id, start, end))
            .min_by_key(|b| b.start);

        Ok(match conflict {
            Some(booking) => Availability::Conflict {
                booking_id: booking.id,
            },
            None => Availability::Available,
        })
    }
}
