use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for a vehicle
pub type VehicleId = Uuid;

/// unique identifier for a pool member (driver, owner, payer)
pub type MemberId = Uuid;

pub type BookingId = Uuid;

pub type TripId = Uuid;

pub type PaymentId = Uuid;

/// booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    /// reserved, trip not yet started
    Planned,
    /// trip in progress
    Active,
    /// trip finished
    Completed,
    /// withdrawn before a trip started
    Cancelled,
}

impl BookingStatus {
    /// statuses that hold the vehicle and block new bookings
    pub fn blocks_vehicle(&self) -> bool {
        matches!(self, BookingStatus::Planned | BookingStatus::Active)
    }
}

/// trip status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TripStatus {
    Started,
    Completed,
}

/// what a payment was made for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentCategory {
    /// direct settlement of trip costs
    Cash,
    Fuel,
    /// cleaning, washing, small consumables
    Care,
    Maintenance,
    Repair,
}

impl PaymentCategory {
    /// counts towards the fuel component of a rate recommendation
    pub fn is_fuel(&self) -> bool {
        matches!(self, PaymentCategory::Fuel)
    }

    /// counts towards the maintenance/repair component of a rate recommendation
    pub fn is_upkeep(&self) -> bool {
        matches!(
            self,
            PaymentCategory::Maintenance | PaymentCategory::Repair | PaymentCategory::Care
        )
    }
}

/// payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// at least one party has not confirmed yet
    Pending,
    /// driver and owner both confirmed
    Confirmed,
}

/// party confirming a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfirmingParty {
    /// the member who paid
    Driver,
    /// the owner of the vehicle receiving the payment
    Owner,
}

/// outcome of comparing a recommended rate with the active one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateDecision {
    Increase,
    Decrease,
    Keep,
}

/// result of an availability check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Available,
    Conflict { booking_id: BookingId },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}
