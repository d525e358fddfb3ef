use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::payments::Payment;
use crate::trips::Trip;
use crate::types::{MemberId, VehicleId};

/// what one driver owes on one vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub driver: MemberId,
    pub vehicle_id: VehicleId,
    /// sum of completed trip costs
    pub debt: Money,
    /// sum of confirmed payments
    pub credit: Money,
    /// positive means the driver owes the vehicle owner
    pub balance: Money,
}

impl LedgerEntry {
    pub(crate) fn new(driver: MemberId, vehicle_id: VehicleId) -> Self {
        Self {
            driver,
            vehicle_id,
            debt: Money::ZERO,
            credit: Money::ZERO,
            balance: Money::ZERO,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.balance.is_zero()
    }
}

/// totals across all drivers of one vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleLedgerSummary {
    pub vehicle_id: VehicleId,
    pub total_debt: Money,
    pub total_credit: Money,
    pub outstanding: Money,
    pub drivers: usize,
}

pub struct LedgerAggregator;

impl LedgerAggregator {
    /// balances per (driver, vehicle) from completed trips and confirmed payments
    pub fn compute_balances<'a>(
        trips: impl IntoIterator<Item = &'a Trip>,
        payments: impl IntoIterator<Item = &'a Payment>,
    ) -> BTreeMap<(MemberId, VehicleId), LedgerEntry> {
        let mut ledger: BTreeMap<(MemberId, VehicleId), LedgerEntry> = BTreeMap::new();

        for trip in trips.into_iter().filter(|t| t.is_completed()) {
            let entry = ledger
                .entry((trip.driver, trip.vehicle_id))
                .or_insert_with(|| LedgerEntry::new(trip.driver, trip.vehicle_id));
            entry.debt += trip.cost.unwrap_or(Money::ZERO);
        }

        for payment in payments.into_iter().filter(|p| p.is_confirmed()) {
            let entry = ledger
                .entry((payment.payer, payment.vehicle_id))
                .or_insert_with(|| LedgerEntry::new(payment.payer, payment.vehicle_id));
            entry.credit += payment.amount;
        }

        for entry in ledger.values_mut() {
            entry.balance = entry.debt - entry.credit;
        }

        ledger
    }

    pub fn vehicle_summary(
        balances: &BTreeMap<(MemberId, VehicleId), LedgerEntry>,
        vehicle_id: VehicleId,
    ) -> VehicleLedgerSummary {
        let entries: Vec<&LedgerEntry> = balances
            .values()
            .filter(|e| e.vehicle_id == vehicle_id)
            .collect();

        let total_debt: Money = entries.iter().map(|e| e.debt).sum();
        let total_credit: Money = entries.iter().map(|e| e.credit).sum();

        VehicleLedgerSummary {
            vehicle_id,
            total_debt,
            total_credit,
            outstanding: total_debt - total_credit,
            drivers: entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Distance, DistanceRate};
    use crate::types::{ConfirmingParty, PaymentCategory};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn completed_trip(driver: MemberId, vehicle_id: VehicleId, km: i64) -> Trip {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let mut trip = Trip::new(
            Uuid::new_v4(),
            vehicle_id,
            driver,
            Distance::from_units(1_000),
            DistanceRate::from_minor(25, 2),
            false,
            at,
        );
        trip.record_completion(Distance::from_units(1_000 + km), None, at);
        trip
    }

    fn confirmed_payment(payer: MemberId, vehicle_id: VehicleId, amount: i64) -> Payment {
        let at = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();
        let mut payment = Payment::new(payer, vehicle_id, Money::from_major(amount), PaymentCategory::Cash, at);
        payment.confirm(ConfirmingParty::Driver, false, at);
        payment.confirm(ConfirmingParty::Owner, false, at);
        payment
    }

    #[test]
    fn test_balances_per_driver_and_vehicle() {
        let (anna, ben) = (Uuid::new_v4(), Uuid::new_v4());
        let vehicle_id = Uuid::new_v4();

        let trips = vec![
            completed_trip(anna, vehicle_id, 100),
            completed_trip(anna, vehicle_id, 40),
            completed_trip(ben, vehicle_id, 200),
        ];
        let payments = vec![confirmed_payment(anna, vehicle_id, 20)];

        let balances = LedgerAggregator::compute_balances(&trips, &payments);

        let anna_entry = &balances[&(anna, vehicle_id)];
        assert_eq!(anna_entry.debt, Money::from_major(35));
        assert_eq!(anna_entry.credit, Money::from_major(20));
        assert_eq!(anna_entry.balance, Money::from_major(15));

        let ben_entry = &balances[&(ben, vehicle_id)];
        assert_eq!(ben_entry.balance, Money::from_major(50));

        let summary = LedgerAggregator::vehicle_summary(&balances, vehicle_id);
        assert_eq!(summary.total_debt, Money::from_major(85));
        assert_eq!(summary.outstanding, Money::from_major(65));
        assert_eq!(summary.drivers, 2);
    }

    #[test]
    fn test_pending_payments_and_started_trips_ignored() {
        let driver = Uuid::new_v4();
        let vehicle_id = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();

        let started = Trip::new(
            Uuid::new_v4(),
            vehicle_id,
            driver,
            Distance::from_units(1_000),
            DistanceRate::from_minor(25, 2),
            false,
            at,
        );
        let mut pending = Payment::new(driver, vehicle_id, Money::from_major(10), PaymentCategory::Fuel, at);
        pending.confirm(ConfirmingParty::Driver, false, at);

        let balances = LedgerAggregator::compute_balances(&[started], &[pending]);
        assert!(balances.is_empty());
    }

    #[test]
    fn test_overpayment_gives_negative_balance() {
        let driver = Uuid::new_v4();
        let vehicle_id = Uuid::new_v4();

        let trips = vec![completed_trip(driver, vehicle_id, 40)];
        let payments = vec![confirmed_payment(driver, vehicle_id, 25)];

        let balances = LedgerAggregator::compute_balances(&trips, &payments);
        assert_eq!(balances[&(driver, vehicle_id)].balance, Money::from_major(-15));
        assert!(!balances[&(driver, vehicle_id)].is_settled());
    }
}
