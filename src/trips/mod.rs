pub mod lifecycle;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Distance, DistanceRate, Money};
use crate::events::Event;
use crate::types::{BookingId, MemberId, TripId, TripStatus, VehicleId};

pub use lifecycle::TripLifecycle;

/// request to start the trip of a booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartTrip {
    pub booking_id: BookingId,
    pub driver: MemberId,
    pub start_odometer: Option<Distance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteTrip {
    pub trip_id: TripId,
    pub end_odometer: Distance,
    pub notes: Option<String>,
}

/// correction of a completed trip's odometer readings by its driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditTrip {
    pub trip_id: TripId,
    pub actor: MemberId,
    pub new_start: Distance,
    pub new_end: Distance,
    pub notes: Option<String>,
}

/// a trip after a lifecycle transition and the events it produced
#[derive(Debug, Clone, PartialEq)]
pub struct TripOutcome {
    pub trip: Trip,
    pub effects: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub booking_id: BookingId,
    pub vehicle_id: VehicleId,
    pub driver: MemberId,
    pub start_odometer: Distance,
    pub end_odometer: Option<Distance>,
    pub distance: Option<Distance>,
    pub cost: Option<Money>,
    pub status: TripStatus,
    /// start reading differed from the vehicle's odometer
    pub odometer_conflict: bool,
    pub conflict_resolved: bool,
    /// rate in force when the trip was created
    pub locked_rate: DistanceRate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Trip {
    pub fn new(
        booking_id: BookingId,
        vehicle_id: VehicleId,
        driver: MemberId,
        start_odometer: Distance,
        locked_rate: DistanceRate,
        odometer_conflict: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id,
            vehicle_id,
            driver,
            start_odometer,
            end_odometer: None,
            distance: None,
            cost: None,
            status: TripStatus::Started,
            odometer_conflict,
            conflict_resolved: !odometer_conflict,
            locked_rate,
            notes: None,
            created_at,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TripStatus::Completed
    }

    pub fn has_open_conflict(&self) -> bool {
        self.odometer_conflict && !self.conflict_resolved
    }

    /// distance and cost for the given readings at the locked rate
    pub fn price(&self, start: Distance, end: Distance) -> (Distance, Money) {
        let distance = end - start;
        (distance, distance * self.locked_rate)
    }

    /// readings must already be validated
    pub(crate) fn record_completion(&mut self, end_odometer: Distance, notes: Option<String>, at: DateTime<Utc>) {
        let (distance, cost) = self.price(self.start_odometer, end_odometer);

        self.end_odometer = Some(end_odometer);
        self.distance = Some(distance);
        self.cost = Some(cost);
        self.status = TripStatus::Completed;
        self.completed_at = Some(at);
        if notes.is_some() {
            self.notes = notes;
        }
    }
}
