use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::decimal::{Distance, DistanceRate, Money};
use crate::types::{BookingId, BookingStatus, MemberId, PaymentId, TripId, TripStatus, VehicleId};

/// how a failure should be surfaced to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// malformed or out-of-range input
    Validation,
    /// the request would break a domain invariant
    InvariantViolation,
    /// referenced entity does not exist
    NotFound,
    /// the pool could not be reached (poisoned lock)
    Unavailable,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    #[error("vehicle not found: {id}")]
    VehicleNotFound {
        id: VehicleId,
    },

    #[error("booking not found: {id}")]
    BookingNotFound {
        id: BookingId,
    },

    #[error("trip not found: {id}")]
    TripNotFound {
        id: TripId,
    },

    #[error("payment not found: {id}")]
    PaymentNotFound {
        id: PaymentId,
    },

    #[error("invalid rate: {rate}")]
    InvalidRate {
        rate: DistanceRate,
    },

    #[error("retroactive rate change: effective month {requested} is before current month {current}")]
    RetroactiveRateChange {
        requested: NaiveDate,
        current: NaiveDate,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("invalid valuation input: {message}")]
    ValuationInput {
        message: String,
    },

    #[error("invalid observation window: distance {distance_driven} over {window_months} months")]
    InvalidObservationWindow {
        distance_driven: Distance,
        window_months: i32,
    },

    #[error("invalid booking window: start {start} is not before end {end}")]
    InvalidBookingWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("vehicle {vehicle_id} already booked by {conflicting_booking}")]
    BookingConflict {
        vehicle_id: VehicleId,
        conflicting_booking: BookingId,
    },

    #[error("vehicle {vehicle_id} only accepts emergency bookings")]
    NotBookable {
        vehicle_id: VehicleId,
    },

    #[error("booking {booking_id} cannot be cancelled in status {status:?}")]
    BookingNotCancellable {
        booking_id: BookingId,
        status: BookingStatus,
    },

    #[error("booking {booking_id} is cancelled")]
    BookingCancelled {
        booking_id: BookingId,
    },

    #[error("start odometer reading required")]
    StartOdometerRequired,

    #[error("end odometer {end} must be greater than start odometer {start}")]
    EndOdometerNotGreaterThanStart {
        start: Distance,
        end: Distance,
    },

    #[error("booking {booking_id} already has trip {trip_id}")]
    TripAlreadyExists {
        booking_id: BookingId,
        trip_id: TripId,
    },

    #[error("trip {trip_id} is {status:?}, expected {expected:?}")]
    InvalidTripState {
        trip_id: TripId,
        status: TripStatus,
        expected: TripStatus,
    },

    #[error("member {actor} is not the driver of trip {trip_id}")]
    NotTripOwner {
        trip_id: TripId,
        actor: MemberId,
    },

    #[error("trip {trip_id} has no open odometer conflict")]
    NoOpenConflict {
        trip_id: TripId,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("member {actor} is not the {party} party of payment {payment_id}")]
    NotPaymentParty {
        payment_id: PaymentId,
        actor: MemberId,
        party: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("pool unavailable: {message}")]
    Unavailable {
        message: String,
    },
}

impl PoolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PoolError::VehicleNotFound { .. }
            | PoolError::BookingNotFound { .. }
            | PoolError::TripNotFound { .. }
            | PoolError::PaymentNotFound { .. } => ErrorKind::NotFound,

            PoolError::InvalidRate { .. }
            | PoolError::InvalidDate { .. }
            | PoolError::ValuationInput { .. }
            | PoolError::InvalidObservationWindow { .. }
            | PoolError::InvalidBookingWindow { .. }
            | PoolError::StartOdometerRequired
            | PoolError::InvalidPaymentAmount { .. }
            | PoolError::InvalidConfiguration { .. } => ErrorKind::Validation,

            PoolError::RetroactiveRateChange { .. }
            | PoolError::BookingConflict { .. }
            | PoolError::NotBookable { .. }
            | PoolError::BookingNotCancellable { .. }
            | PoolError::BookingCancelled { .. }
            | PoolError::EndOdometerNotGreaterThanStart { .. }
            | PoolError::TripAlreadyExists { .. }
            | PoolError::InvalidTripState { .. }
            | PoolError::NotTripOwner { .. }
            | PoolError::NoOpenConflict { .. }
            | PoolError::NotPaymentParty { .. } => ErrorKind::InvariantViolation,

            PoolError::Unavailable { .. } => ErrorKind::Unavailable,
        }
    }

    pub(crate) fn valuation(message: impl Into<String>) -> Self {
        PoolError::ValuationInput {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PoolError>;
