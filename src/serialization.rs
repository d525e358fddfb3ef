/// serialization support for the pool
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Distance, DistanceRate, Money};
use crate::pool::VehiclePool;
use crate::types::{MemberId, VehicleId};
use crate::vehicle::Vehicle;

/// serializable view of a vehicle and its rate schedule
#[derive(Debug, Serialize, Deserialize)]
pub struct VehicleView {
    pub id: VehicleId,
    pub name: String,
    pub owner: MemberId,
    pub current_odometer: Distance,
    pub active_rate: DistanceRate,
    pub emergency_only: bool,
    pub rate_schedule: Vec<RateView>,
    pub bookings: BookingCounts,
    pub open_conflicts: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RateView {
    pub effective_from: NaiveDate,
    pub rate: DistanceRate,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BookingCounts {
    pub planned: usize,
    pub active: usize,
    pub completed: usize,
    pub cancelled: usize,
}

/// serializable view of the per-driver balances of one vehicle
#[derive(Debug, Serialize, Deserialize)]
pub struct LedgerView {
    pub vehicle_id: VehicleId,
    pub total_debt: Money,
    pub total_credit: Money,
    pub outstanding: Money,
    pub drivers: Vec<DriverBalanceView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DriverBalanceView {
    pub driver: MemberId,
    pub debt: Money,
    pub credit: Money,
    pub balance: Money,
}

/// everything a report needs, captured at one instant
#[derive(Debug, Serialize, Deserialize)]
pub struct PoolView {
    pub generated_at: DateTime<Utc>,
    pub vehicles: Vec<VehicleView>,
    pub ledgers: Vec<LedgerView>,
}

impl VehicleView {
    pub fn from_vehicle(pool: &VehiclePool, vehicle: &Vehicle) -> Self {
        use crate::types::BookingStatus;

        let mut bookings = BookingCounts::default();
        for booking in pool.bookings_for(vehicle.id) {
            match booking.status {
                BookingStatus::Planned => bookings.planned += 1,
                BookingStatus::Active => bookings.active += 1,
                BookingStatus::Completed => bookings.completed += 1,
                BookingStatus::Cancelled => bookings.cancelled += 1,
            }
        }

        VehicleView {
            id: vehicle.id,
            name: vehicle.name.clone(),
            owner: vehicle.owner,
            current_odometer: vehicle.current_odometer,
            active_rate: vehicle.cached_rate,
            emergency_only: vehicle.emergency_only,
            rate_schedule: pool
                .rate_history()
                .entries(vehicle.id)
                .into_iter()
                .map(|entry| RateView {
                    effective_from: entry.effective_from,
                    rate: entry.rate,
                })
                .collect(),
            bookings,
            open_conflicts: pool
                .open_conflicts()
                .iter()
                .filter(|t| t.vehicle_id == vehicle.id)
                .count(),
        }
    }
}

impl LedgerView {
    pub fn from_pool(pool: &VehiclePool, vehicle_id: VehicleId) -> Self {
        let balances = pool.compute_balances();
        let summary = crate::payments::LedgerAggregator::vehicle_summary(&balances, vehicle_id);

        LedgerView {
            vehicle_id,
            total_debt: summary.total_debt,
            total_credit: summary.total_credit,
            outstanding: summary.outstanding,
            drivers: balances
                .values()
                .filter(|entry| entry.vehicle_id == vehicle_id)
                .map(|entry| DriverBalanceView {
                    driver: entry.driver,
                    debt: entry.debt,
                    credit: entry.credit,
                    balance: entry.balance,
                })
                .collect(),
        }
    }
}

impl PoolView {
    pub fn from_pool(pool: &VehiclePool, generated_at: DateTime<Utc>) -> Self {
        PoolView {
            generated_at,
            vehicles: pool.vehicles().map(|v| VehicleView::from_vehicle(pool, v)).collect(),
            ledgers: pool.vehicles().map(|v| LedgerView::from_pool(pool, v.id)).collect(),
        }
    }
}

impl VehiclePool {
    /// pretty json report of every vehicle and its ledger
    pub fn to_json_pretty(&self, generated_at: DateTime<Utc>) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&PoolView::from_pool(self, generated_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    #[test]
    fn test_pool_report_json() {
        let mut pool = VehiclePool::default();
        let vehicle = Vehicle::new("Berlingo", Uuid::new_v4(), Distance::from_units(5_000), DistanceRate::from_minor(22, 2));
        let id = pool.add_vehicle(vehicle);

        let json = pool
            .to_json_pretty(Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["vehicles"][0]["id"], serde_json::json!(id.to_string()));
        assert_eq!(value["vehicles"][0]["name"], "Berlingo");
        assert_eq!(value["ledgers"][0]["drivers"].as_array().map(|d| d.len()), Some(0));
    }
}
