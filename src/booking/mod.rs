pub mod overlap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{PoolError, Result};
use crate::events::Event;
use crate::types::{BookingId, BookingStatus, MemberId, VehicleId};

pub use overlap::BookingOverlapValidator;

/// request to reserve a vehicle for [start, end)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBooking {
    pub vehicle_id: VehicleId,
    pub requester: MemberId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// created through the quick/emergency path
    pub emergency: bool,
}

impl CreateBooking {
    pub fn validate(&self) -> Result<()> {
        if self.start >= self.end {
            return Err(PoolError::InvalidBookingWindow {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// emergency booking starting now
    pub fn quick(vehicle_id: VehicleId, requester: MemberId, now: DateTime<Utc>, duration: Duration) -> Result<Self> {
        let end = now
            .checked_add_signed(duration)
            .ok_or(PoolError::InvalidBookingWindow { start: now, end: now })?;

        Ok(Self {
            vehicle_id,
            requester,
            start: now,
            end,
            emergency: true,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub vehicle_id: VehicleId,
    pub requester: MemberId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: BookingStatus,
    pub emergency: bool,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn from_request(request: &CreateBooking, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id: request.vehicle_id,
            requester: request.requester,
            start: request.start,
            end: request.end,
            status: BookingStatus::Planned,
            emergency: request.emergency,
            created_at,
        }
    }

    /// half-open interval overlap with [start, end)
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }

    pub fn blocks(&self, vehicle_id: VehicleId, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.vehicle_id == vehicle_id && self.status.blocks_vehicle() && self.overlaps(start, end)
    }

    /// move to `status`, returning the transition event
    pub(crate) fn transition(&mut self, status: BookingStatus, now: DateTime<Utc>) -> Event {
        let old_status = self.status;
        self.status = status;
        Event::BookingStatusChanged {
            booking_id: self.id,
            old_status,
            new_status: status,
            timestamp: now,
        }
    }

    /// only planned bookings can be withdrawn
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<Event> {
        if self.status != BookingStatus::Planned {
            return Err(PoolError::BookingNotCancellable {
                booking_id: self.id,
                status: self.status,
            });
        }
        Ok(self.transition(BookingStatus::Cancelled, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 4, hour, 0, 0).unwrap()
    }

    fn booking() -> Booking {
        let request = CreateBooking {
            vehicle_id: Uuid::new_v4(),
            requester: Uuid::new_v4(),
            start: at(9),
            end: at(12),
            emergency: false,
        };
        Booking::from_request(&request, at(8))
    }

    #[test]
    fn test_empty_window_rejected() {
        let request = CreateBooking {
            vehicle_id: Uuid::new_v4(),
            requester: Uuid::new_v4(),
            start: at(10),
            end: at(10),
            emergency: false,
        };
        assert!(matches!(request.validate(), Err(PoolError::InvalidBookingWindow { .. })));
    }

    #[test]
    fn test_cancel_only_when_planned() {
        let mut booking = booking();
        booking.cancel(at(8)).unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);

        let mut active = self::booking();
        active.status = BookingStatus::Active;
        assert!(matches!(
            active.cancel(at(9)),
            Err(PoolError::BookingNotCancellable { status: BookingStatus::Active, .. })
        ));
    }

    #[test]
    fn test_quick_booking_starts_now() {
        let request = CreateBooking::quick(Uuid::new_v4(), Uuid::new_v4(), at(14), Duration::minutes(90)).unwrap();
        assert!(request.emergency);
        assert_eq!(request.end - request.start, Duration::minutes(90));
    }

    #[test]
    fn test_quick_booking_out_of_range_duration() {
        let result = CreateBooking::quick(Uuid::new_v4(), Uuid::new_v4(), at(14), Duration::MAX);
        assert!(matches!(result, Err(PoolError::InvalidBookingWindow { .. })));
    }
}
