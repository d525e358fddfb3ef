use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Distance, DistanceRate, Money};
use crate::types::{
    BookingId, BookingStatus, ConfirmingParty, MemberId, PaymentId, RateDecision, TripId, VehicleId,
};

/// all events that can be emitted by the pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // rate events
    RateScheduled {
        vehicle_id: VehicleId,
        rate: DistanceRate,
        effective_from: NaiveDate,
        replaced: Option<DistanceRate>,
        timestamp: DateTime<Utc>,
    },
    ActiveRateChanged {
        vehicle_id: VehicleId,
        old_rate: DistanceRate,
        new_rate: DistanceRate,
        timestamp: DateTime<Utc>,
    },
    RateRecommended {
        vehicle_id: VehicleId,
        current_rate: DistanceRate,
        recommended_rate: DistanceRate,
        decision: RateDecision,
        timestamp: DateTime<Utc>,
    },

    // booking events
    BookingCreated {
        booking_id: BookingId,
        vehicle_id: VehicleId,
        requester: MemberId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        emergency: bool,
    },
    BookingStatusChanged {
        booking_id: BookingId,
        old_status: BookingStatus,
        new_status: BookingStatus,
        timestamp: DateTime<Utc>,
    },

    // trip events
    TripStarted {
        trip_id: TripId,
        booking_id: BookingId,
        driver: MemberId,
        start_odometer: Distance,
        timestamp: DateTime<Utc>,
    },
    TripCompleted {
        trip_id: TripId,
        distance: Distance,
        rate: DistanceRate,
        cost: Money,
        timestamp: DateTime<Utc>,
    },
    TripEdited {
        trip_id: TripId,
        distance: Distance,
        cost: Money,
        timestamp: DateTime<Utc>,
    },
    OdometerConflictRecorded {
        trip_id: TripId,
        vehicle_id: VehicleId,
        expected: Distance,
        reported: Distance,
        timestamp: DateTime<Utc>,
    },
    OdometerConflictResolved {
        trip_id: TripId,
        timestamp: DateTime<Utc>,
    },
    OdometerUpdated {
        vehicle_id: VehicleId,
        old_reading: Distance,
        new_reading: Distance,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentRecorded {
        payment_id: PaymentId,
        payer: MemberId,
        vehicle_id: VehicleId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentPartyConfirmed {
        payment_id: PaymentId,
        party: ConfirmingParty,
        overridden: bool,
        timestamp: DateTime<Utc>,
    },
    PaymentConfirmed {
        payment_id: PaymentId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// append a batch of derived effects returned by an operation
    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
