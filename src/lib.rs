pub mod booking;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod payments;
pub mod pool;
pub mod rates;
pub mod serialization;
pub mod trips;
pub mod types;
pub mod valuation;
pub mod vehicle;

// re-export key types
pub use booking::{Booking, BookingOverlapValidator, CreateBooking};
pub use config::{BookingConfig, PoolConfig, RateConfig};
pub use decimal::{Distance, DistanceRate, Money};
pub use errors::{ErrorKind, PoolError, Result};
pub use events::{Event, EventStore};
pub use payments::{LedgerAggregator, LedgerEntry, Payment, RecordPayment, VehicleLedgerSummary};
pub use pool::{FixedCosts, SharedVehiclePool, VehiclePool};
pub use rates::{RateChange, RateHistory, RateHistoryEntry};
pub use serialization::{LedgerView, PoolView, VehicleView};
pub use trips::{CompleteTrip, EditTrip, StartTrip, Trip, TripLifecycle, TripOutcome};
pub use types::{
    Availability, BookingId, BookingStatus, ConfirmingParty, MemberId, PaymentCategory, PaymentId,
    PaymentStatus, RateDecision, TripId, TripStatus, VehicleId,
};
pub use valuation::{
    CostTotals, DepreciationOutput, RateRecommendation, RateRecommendationEngine, RecommendationInput,
    RevenueProjection, ValuationEngine, ValuationInput,
};
pub use vehicle::{LifecycleParams, Vehicle};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
