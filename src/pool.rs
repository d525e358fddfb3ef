use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use hourglass_rs::SafeTimeProvider;
use tracing::{debug, info, warn};

use crate::booking::{Booking, BookingOverlapValidator, CreateBooking};
use crate::config::PoolConfig;
use crate::decimal::{Distance, DistanceRate, Money};
use crate::errors::{PoolError, Result};
use crate::events::{Event, EventStore};
use crate::payments::{LedgerAggregator, LedgerEntry, Payment, RecordPayment, VehicleLedgerSummary};
use crate::rates::{next_month_start, RateChange, RateHistory};
use crate::trips::{CompleteTrip, EditTrip, StartTrip, Trip, TripLifecycle, TripOutcome};
use crate::types::{
    Availability, BookingId, ConfirmingParty, MemberId, PaymentId, TripId, VehicleId,
};
use crate::valuation::{CostTotals, RateRecommendation, RateRecommendationEngine, RecommendationInput};
use crate::vehicle::Vehicle;

/// annual fixed costs the pool does not track as payments
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedCosts {
    pub insurance_annual: Money,
    pub tax_annual: Money,
}

/// the shared vehicle pool: vehicles, their rate history, bookings, trips and payments.
/// every method is one all-or-nothing step over the whole pool.
pub struct VehiclePool {
    pub config: PoolConfig,
    pub events: EventStore,
    vehicles: BTreeMap<VehicleId, Vehicle>,
    rates: RateHistory,
    bookings: BTreeMap<BookingId, Booking>,
    trips: BTreeMap<TripId, Trip>,
    trip_by_booking: HashMap<BookingId, TripId>,
    payments: BTreeMap<PaymentId, Payment>,
}

impl Default for VehiclePool {
    fn default() -> Self {
        Self::with_config(PoolConfig::default())
    }
}

impl VehiclePool {
    /// create a pool, rejecting an invalid configuration
    pub fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: PoolConfig) -> Self {
        Self {
            config,
            events: EventStore::new(),
            vehicles: BTreeMap::new(),
            rates: RateHistory::new(),
            bookings: BTreeMap::new(),
            trips: BTreeMap::new(),
            trip_by_booking: HashMap::new(),
            payments: BTreeMap::new(),
        }
    }

    // vehicles

    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> VehicleId {
        let id = vehicle.id;
        info!(vehicle_id = %id, name = %vehicle.name, "vehicle added to pool");
        self.vehicles.insert(id, vehicle);
        id
    }

    pub fn vehicle(&self, id: VehicleId) -> Result<&Vehicle> {
        self.vehicles.get(&id).ok_or(PoolError::VehicleNotFound { id })
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    // rates

    pub fn rate_history(&self) -> &RateHistory {
        &self.rates
    }

    pub fn resolve_rate(&self, vehicle_id: VehicleId, at: DateTime<Utc>) -> Result<DistanceRate> {
        let vehicle = self.vehicle(vehicle_id)?;
        Ok(self.rates.resolve_rate(vehicle, at))
    }

    pub fn set_rate(
        &mut self,
        vehicle_id: VehicleId,
        rate: DistanceRate,
        effective_date: chrono::NaiveDate,
        time_provider: &SafeTimeProvider,
    ) -> Result<RateChange> {
        let vehicle = self
            .vehicles
            .get_mut(&vehicle_id)
            .ok_or(PoolError::VehicleNotFound { id: vehicle_id })?;

        let change = self.rates.set_rate(vehicle, rate, effective_date, time_provider)?;

        info!(
            %vehicle_id,
            %rate,
            effective_from = %change.entry.effective_from,
            immediate = change.cache_updated,
            "rate scheduled"
        );
        self.events.extend(change.effects.iter().cloned());

        Ok(change)
    }

    /// bring every cached rate in line with the month at `time_provider`
    pub fn refresh_rates(&mut self, time_provider: &SafeTimeProvider) -> usize {
        let mut refreshed = 0;
        for vehicle in self.vehicles.values_mut() {
            if let Some(event) = self.rates.refresh_cached_rate(vehicle, time_provider) {
                debug!(vehicle_id = %vehicle.id, rate = %vehicle.cached_rate, "active rate refreshed");
                self.events.emit(event);
                refreshed += 1;
            }
        }
        refreshed
    }

    // bookings

    pub fn booking(&self, id: BookingId) -> Result<&Booking> {
        self.bookings.get(&id).ok_or(PoolError::BookingNotFound { id })
    }

    pub fn bookings_for(&self, vehicle_id: VehicleId) -> Vec<&Booking> {
        let mut bookings: Vec<&Booking> = self
            .bookings
            .values()
            .filter(|b| b.vehicle_id == vehicle_id)
            .collect();
        bookings.sort_by_key(|b| b.start);
        bookings
    }

    pub fn check_availability(
        &self,
        vehicle_id: VehicleId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        emergency: bool,
    ) -> Result<Availability> {
        let vehicle = self.vehicle(vehicle_id)?;
        BookingOverlapValidator::check_availability(vehicle, start, end, emergency, self.bookings.values())
    }

    /// overlap check and insert in one step
    pub fn create_booking(&mut self, request: CreateBooking, time_provider: &SafeTimeProvider) -> Result<Booking> {
        request.validate()?;

        match self.check_availability(request.vehicle_id, request.start, request.end, request.emergency)? {
            Availability::Available => {}
            Availability::Conflict { booking_id } => {
                warn!(
                    vehicle_id = %request.vehicle_id,
                    conflicting_booking = %booking_id,
                    "booking rejected, vehicle already reserved"
                );
                return Err(PoolError::BookingConflict {
                    vehicle_id: request.vehicle_id,
                    conflicting_booking: booking_id,
                });
            }
        }

        let booking = Booking::from_request(&request, time_provider.now());

        info!(
            booking_id = %booking.id,
            vehicle_id = %booking.vehicle_id,
            start = %booking.start,
            end = %booking.end,
            emergency = booking.emergency,
            "booking created"
        );
        self.events.emit(Event::BookingCreated {
            booking_id: booking.id,
            vehicle_id: booking.vehicle_id,
            requester: booking.requester,
            start: booking.start,
            end: booking.end,
            emergency: booking.emergency,
        });
        self.bookings.insert(booking.id, booking.clone());

        Ok(booking)
    }

    /// emergency booking from now, for `duration` or the configured default
    pub fn create_quick_booking(
        &mut self,
        vehicle_id: VehicleId,
        requester: MemberId,
        duration: Option<Duration>,
        time_provider: &SafeTimeProvider,
    ) -> Result<Booking> {
        let duration = match duration {
            Some(duration) => duration,
            None => self.config.booking_config.quick_booking_duration()?,
        };
        let request = CreateBooking::quick(vehicle_id, requester, time_provider.now(), duration)?;
        self.create_booking(request, time_provider)
    }

    pub fn cancel_booking(&mut self, booking_id: BookingId, time_provider: &SafeTimeProvider) -> Result<Booking> {
        let booking = self
            .bookings
            .get_mut(&booking_id)
            .ok_or(PoolError::BookingNotFound { id: booking_id })?;

        let event = booking.cancel(time_provider.now())?;

        info!(%booking_id, "booking cancelled");
        self.events.emit(event);

        Ok(booking.clone())
    }

    /// vehicles free for [start, end); emergency-only vehicles are offered for emergencies only
    pub fn available_vehicles(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        emergency: bool,
    ) -> Result<Vec<&Vehicle>> {
        if start >= end {
            return Err(PoolError::InvalidBookingWindow { start, end });
        }

        let mut available = Vec::new();
        for vehicle in self.vehicles.values() {
            match BookingOverlapValidator::check_availability(vehicle, start, end, emergency, self.bookings.values()) {
                Ok(Availability::Available) => available.push(vehicle),
                Ok(Availability::Conflict { .. }) | Err(PoolError::NotBookable { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(available)
    }

    // trips

    pub fn trip(&self, id: TripId) -> Result<&Trip> {
        self.trips.get(&id).ok_or(PoolError::TripNotFound { id })
    }

    pub fn trip_for_booking(&self, booking_id: BookingId) -> Option<&Trip> {
        self.trip_by_booking
            .get(&booking_id)
            .and_then(|id| self.trips.get(id))
    }

    pub fn trips(&self) -> impl Iterator<Item = &Trip> {
        self.trips.values()
    }

    pub fn start_trip(&mut self, input: StartTrip, time_provider: &SafeTimeProvider) -> Result<TripOutcome> {
        let booking = self
            .bookings
            .get_mut(&input.booking_id)
            .ok_or(PoolError::BookingNotFound { id: input.booking_id })?;
        let vehicle = self
            .vehicles
            .get(&booking.vehicle_id)
            .ok_or(PoolError::VehicleNotFound { id: booking.vehicle_id })?;
        let existing = self
            .trip_by_booking
            .get(&input.booking_id)
            .and_then(|id| self.trips.get(id));

        let outcome = TripLifecycle::start(booking, vehicle, existing, &self.rates, &input, time_provider)?;
        let trip = &outcome.trip;

        if trip.odometer_conflict {
            warn!(
                trip_id = %trip.id,
                vehicle_id = %trip.vehicle_id,
                expected = %vehicle.current_odometer,
                reported = %trip.start_odometer,
                "odometer mismatch recorded at trip start"
            );
        }
        info!(trip_id = %trip.id, booking_id = %trip.booking_id, rate = %trip.locked_rate, "trip started");

        self.trip_by_booking.insert(trip.booking_id, trip.id);
        self.trips.insert(trip.id, trip.clone());
        self.events.extend(outcome.effects.iter().cloned());

        Ok(outcome)
    }

    /// trip completion, odometer write and booking completion in one step
    pub fn complete_trip(&mut self, input: CompleteTrip, time_provider: &SafeTimeProvider) -> Result<TripOutcome> {
        let trip = self
            .trips
            .get_mut(&input.trip_id)
            .ok_or(PoolError::TripNotFound { id: input.trip_id })?;
        let booking = self
            .bookings
            .get_mut(&trip.booking_id)
            .ok_or(PoolError::BookingNotFound { id: trip.booking_id })?;
        let vehicle = self
            .vehicles
            .get_mut(&trip.vehicle_id)
            .ok_or(PoolError::VehicleNotFound { id: trip.vehicle_id })?;

        let outcome = TripLifecycle::complete(trip, booking, vehicle, &input, time_provider)?;

        info!(
            trip_id = %outcome.trip.id,
            distance = %outcome.trip.distance.unwrap_or_default(),
            cost = %outcome.trip.cost.unwrap_or_default(),
            "trip completed"
        );
        self.events.extend(outcome.effects.iter().cloned());

        Ok(outcome)
    }

    pub fn edit_trip(&mut self, input: EditTrip, time_provider: &SafeTimeProvider) -> Result<TripOutcome> {
        let trip = self
            .trips
            .get_mut(&input.trip_id)
            .ok_or(PoolError::TripNotFound { id: input.trip_id })?;
        let vehicle = self
            .vehicles
            .get_mut(&trip.vehicle_id)
            .ok_or(PoolError::VehicleNotFound { id: trip.vehicle_id })?;

        let outcome = TripLifecycle::edit(trip, vehicle, &input, time_provider)?;

        if outcome.trip.has_open_conflict() {
            warn!(trip_id = %outcome.trip.id, "odometer mismatch recorded on trip edit");
        }
        info!(trip_id = %outcome.trip.id, actor = %input.actor, "trip edited");
        self.events.extend(outcome.effects.iter().cloned());

        Ok(outcome)
    }

    pub fn resolve_conflict(&mut self, trip_id: TripId, time_provider: &SafeTimeProvider) -> Result<TripOutcome> {
        let trip = self
            .trips
            .get_mut(&trip_id)
            .ok_or(PoolError::TripNotFound { id: trip_id })?;

        let outcome = TripLifecycle::resolve_conflict(trip, time_provider)?;

        info!(%trip_id, "odometer conflict resolved");
        self.events.extend(outcome.effects.iter().cloned());

        Ok(outcome)
    }

    /// trips with an odometer mismatch nobody has looked at yet
    pub fn open_conflicts(&self) -> Vec<&Trip> {
        self.trips.values().filter(|t| t.has_open_conflict()).collect()
    }

    // payments

    pub fn payment(&self, id: PaymentId) -> Result<&Payment> {
        self.payments.get(&id).ok_or(PoolError::PaymentNotFound { id })
    }

    pub fn payments(&self) -> impl Iterator<Item = &Payment> {
        self.payments.values()
    }

    pub fn record_payment(&mut self, request: RecordPayment, time_provider: &SafeTimeProvider) -> Result<Payment> {
        request.validate()?;
        self.vehicle(request.vehicle_id)?;

        let now = time_provider.now();
        let payment = Payment::new(request.payer, request.vehicle_id, request.amount, request.category, now);

        info!(
            payment_id = %payment.id,
            payer = %payment.payer,
            vehicle_id = %payment.vehicle_id,
            amount = %payment.amount,
            category = ?payment.category,
            "payment recorded"
        );
        self.events.emit(Event::PaymentRecorded {
            payment_id: payment.id,
            payer: payment.payer,
            vehicle_id: payment.vehicle_id,
            amount: payment.amount,
            timestamp: now,
        });
        self.payments.insert(payment.id, payment.clone());

        Ok(payment)
    }

    /// `actor` sets their own flag: the payer as driver, the vehicle owner as owner
    pub fn confirm_payment(
        &mut self,
        payment_id: PaymentId,
        actor: MemberId,
        party: ConfirmingParty,
        time_provider: &SafeTimeProvider,
    ) -> Result<Payment> {
        let payment = self.payment(payment_id)?;
        let is_party = match party {
            ConfirmingParty::Driver => payment.payer == actor,
            ConfirmingParty::Owner => self.vehicle(payment.vehicle_id)?.is_owned_by(actor),
        };

        if !is_party {
            return Err(PoolError::NotPaymentParty {
                payment_id,
                actor,
                party: party_name(party).to_string(),
            });
        }

        self.update_payment(payment_id, |payment| payment.confirm(party, false, time_provider.now()))
    }

    /// administrative confirmation on behalf of either party
    pub fn override_confirmation(
        &mut self,
        payment_id: PaymentId,
        party: ConfirmingParty,
        time_provider: &SafeTimeProvider,
    ) -> Result<Payment> {
        let payment = self.update_payment(payment_id, |payment| payment.confirm(party, true, time_provider.now()))?;
        warn!(%payment_id, party = party_name(party), "payment confirmation overridden");
        Ok(payment)
    }

    fn update_payment<F>(&mut self, payment_id: PaymentId, update: F) -> Result<Payment>
    where
        F: FnOnce(&mut Payment) -> Vec<Event>,
    {
        let payment = self
            .payments
            .get_mut(&payment_id)
            .ok_or(PoolError::PaymentNotFound { id: payment_id })?;

        let effects = update(payment);
        if payment.is_confirmed() && effects.iter().any(|e| matches!(e, Event::PaymentConfirmed { .. })) {
            info!(%payment_id, amount = %payment.amount, "payment confirmed by both parties");
        }
        self.events.extend(effects);

        Ok(payment.clone())
    }

    // ledger

    pub fn compute_balances(&self) -> BTreeMap<(MemberId, VehicleId), LedgerEntry> {
        LedgerAggregator::compute_balances(self.trips.values(), self.payments.values())
    }

    /// balance of one driver on one vehicle, zero when they never drove or paid
    pub fn balance_for(&self, driver: MemberId, vehicle_id: VehicleId) -> Result<LedgerEntry> {
        self.vehicle(vehicle_id)?;
        let trips = self
            .trips
            .values()
            .filter(|t| t.driver == driver && t.vehicle_id == vehicle_id);
        let payments = self
            .payments
            .values()
            .filter(|p| p.payer == driver && p.vehicle_id == vehicle_id);

        Ok(LedgerAggregator::compute_balances(trips, payments)
            .remove(&(driver, vehicle_id))
            .unwrap_or_else(|| LedgerEntry::new(driver, vehicle_id)))
    }

    pub fn vehicle_summary(&self, vehicle_id: VehicleId) -> Result<VehicleLedgerSummary> {
        self.vehicle(vehicle_id)?;
        Ok(LedgerAggregator::vehicle_summary(&self.compute_balances(), vehicle_id))
    }

    // recommendation

    /// recommend a rate from the configured observation window of pool activity
    pub fn recommend_rate(
        &mut self,
        vehicle_id: VehicleId,
        fixed_costs: FixedCosts,
        time_provider: &SafeTimeProvider,
    ) -> Result<RateRecommendation> {
        let vehicle = self.vehicle(vehicle_id)?;
        let now = time_provider.now();
        let window_months = self.config.rate_config.observation_window_months;

        let since = u32::try_from(window_months)
            .ok()
            .and_then(|months| now.checked_sub_months(Months::new(months)))
            .ok_or_else(|| PoolError::InvalidConfiguration {
                message: format!("observation window of {} months", window_months),
            })?;

        let distance_driven: Distance = self
            .trips
            .values()
            .filter(|t| t.vehicle_id == vehicle_id && t.is_completed())
            .filter(|t| t.completed_at.map(|at| at >= since).unwrap_or(false))
            .filter_map(|t| t.distance)
            .sum();
        let costs = CostTotals::from_payments(self.payments.values(), vehicle_id, since);

        let input = RecommendationInput {
            current_rate: vehicle.cached_rate,
            current_odometer: vehicle.current_odometer,
            fuel_cost: costs.fuel,
            maintenance_cost: costs.maintenance,
            insurance_annual: fixed_costs.insurance_annual,
            tax_annual: fixed_costs.tax_annual,
            current_year: now.year(),
            lifecycle: vehicle.lifecycle.clone(),
            distance_driven,
            window_months,
        };

        let recommendation = RateRecommendationEngine::new(&self.config.rate_config).recommend(&input)?;

        info!(
            %vehicle_id,
            current = %recommendation.current_rate,
            recommended = %recommendation.recommended_rate,
            decision = ?recommendation.decision,
            "rate recommended"
        );
        self.events.emit(Event::RateRecommended {
            vehicle_id,
            current_rate: recommendation.current_rate,
            recommended_rate: recommendation.recommended_rate,
            decision: recommendation.decision,
            timestamp: now,
        });

        Ok(recommendation)
    }

    /// schedule the recommended rate from the next month boundary
    pub fn accept_recommendation(
        &mut self,
        vehicle_id: VehicleId,
        recommendation: &RateRecommendation,
        time_provider: &SafeTimeProvider,
    ) -> Result<RateChange> {
        let effective = next_month_start(time_provider.now().date_naive())?;
        self.set_rate(vehicle_id, recommendation.recommended_rate, effective, time_provider)
    }

    /// get events
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }
}

fn party_name(party: ConfirmingParty) -> &'static str {
    match party {
        ConfirmingParty::Driver => "driver",
        ConfirmingParty::Owner => "owner",
    }
}

/// a pool shared between threads; each call holds the lock for one whole operation
#[derive(Clone)]
pub struct SharedVehiclePool {
    inner: Arc<Mutex<VehiclePool>>,
}

impl SharedVehiclePool {
    pub fn new(pool: VehiclePool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    /// run `op` with exclusive access to the pool
    pub fn with_pool<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut VehiclePool) -> Result<T>,
    {
        let mut pool = self.inner.lock().map_err(|_| PoolError::Unavailable {
            message: "pool lock poisoned".to_string(),
        })?;
        op(&mut *pool)
    }
}
