use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::decimal::DistanceRate;
use crate::errors::{PoolError, Result};
use crate::events::Event;
use crate::rates::month_start;
use crate::types::VehicleId;
use crate::vehicle::Vehicle;

/// a rate valid from the first day of a month until superseded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateHistoryEntry {
    pub vehicle_id: VehicleId,
    pub rate: DistanceRate,
    /// always the first day of a calendar month
    pub effective_from: NaiveDate,
    pub recorded_at: DateTime<Utc>,
}

/// result of a rate change request
#[derive(Debug, Clone, PartialEq)]
pub struct RateChange {
    pub entry: RateHistoryEntry,
    /// rate of the entry that was overwritten for the same month
    pub replaced: Option<DistanceRate>,
    /// whether the vehicle's active rate changed immediately
    pub cache_updated: bool,
    pub effects: Vec<Event>,
}

/// time-versioned per-distance rates, one entry per vehicle and month
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateHistory {
    entries: BTreeMap<VehicleId, BTreeMap<NaiveDate, RateHistoryEntry>>,
}

impl RateHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// rate in force at `at`, falling back to the vehicle's cached rate
    pub fn resolve_rate(&self, vehicle: &Vehicle, at: DateTime<Utc>) -> DistanceRate {
        let month = month_start(at.date_naive());

        self.entries
            .get(&vehicle.id)
            .and_then(|history| history.range(..=month).next_back())
            .map(|(_, entry)| entry.rate)
            .unwrap_or(vehicle.cached_rate)
    }

    /// schedule `new_rate` from the month containing `requested_effective_date`
    pub fn set_rate(
        &mut self,
        vehicle: &mut Vehicle,
        new_rate: DistanceRate,
        requested_effective_date: NaiveDate,
        time_provider: &SafeTimeProvider,
    ) -> Result<RateChange> {
        if new_rate.is_negative() {
            return Err(PoolError::InvalidRate { rate: new_rate });
        }

        let now = time_provider.now();
        let current_month = month_start(now.date_naive());
        let effective_from = month_start(requested_effective_date);

        if effective_from < current_month {
            return Err(PoolError::RetroactiveRateChange {
                requested: effective_from,
                current: current_month,
            });
        }

        let entry = RateHistoryEntry {
            vehicle_id: vehicle.id,
            rate: new_rate,
            effective_from,
            recorded_at: now,
        };

        let replaced = self
            .entries
            .entry(vehicle.id)
            .or_default()
            .insert(effective_from, entry.clone())
            .map(|old| old.rate);

        let mut effects = vec![Event::RateScheduled {
            vehicle_id: vehicle.id,
            rate: new_rate,
            effective_from,
            replaced,
            timestamp: now,
        }];

        let cache_updated = effective_from == current_month;
        if cache_updated && vehicle.cached_rate != new_rate {
            effects.push(Event::ActiveRateChanged {
                vehicle_id: vehicle.id,
                old_rate: vehicle.cached_rate,
                new_rate,
                timestamp: now,
            });
        }
        if cache_updated {
            vehicle.cached_rate = new_rate;
        }

        Ok(RateChange {
            entry,
            replaced,
            cache_updated,
            effects,
        })
    }

    /// re-resolve the vehicle's cached rate once a scheduled month has arrived
    pub fn refresh_cached_rate(
        &self,
        vehicle: &mut Vehicle,
        time_provider: &SafeTimeProvider,
    ) -> Option<Event> {
        let now = time_provider.now();
        let resolved = self.resolve_rate(vehicle, now);

        if resolved == vehicle.cached_rate {
            return None;
        }

        let old_rate = vehicle.cached_rate;
        vehicle.cached_rate = resolved;

        Some(Event::ActiveRateChanged {
            vehicle_id: vehicle.id,
            old_rate,
            new_rate: resolved,
            timestamp: now,
        })
    }

    /// history of a vehicle in effective order
    pub fn entries(&self, vehicle_id: VehicleId) -> Vec<&RateHistoryEntry> {
        self.entries
            .get(&vehicle_id)
            .map(|history| history.values().collect())
            .unwrap_or_default()
    }

    /// entries scheduled after the month containing `at`
    pub fn upcoming(&self, vehicle_id: VehicleId, at: DateTime<Utc>) -> Vec<&RateHistoryEntry> {
        let month = month_start(at.date_naive());
        self.entries
            .get(&vehicle_id)
            .map(|history| {
                history
                    .values()
                    .filter(|entry| entry.effective_from > month)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Distance;
    use chrono::TimeZone;
    use hourglass_rs::TimeSource;
    use uuid::Uuid;

    fn vehicle() -> Vehicle {
        Vehicle::new("Kombi", Uuid::new_v4(), Distance::from_units(40_000), DistanceRate::from_minor(25, 2))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_resolve_falls_back_to_cached_rate() {
        let history = RateHistory::new();
        let vehicle = vehicle();

        let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        assert_eq!(history.resolve_rate(&vehicle, at), DistanceRate::from_minor(25, 2));
    }

    #[test]
    fn test_set_rate_current_month_updates_cache() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap()
        ));
        let mut history = RateHistory::new();
        let mut vehicle = vehicle();

        let change = history
            .set_rate(&mut vehicle, DistanceRate::from_minor(30, 2), date(2025, 3, 20), &time)
            .unwrap();

        assert_eq!(change.entry.effective_from, date(2025, 3, 1));
        assert!(change.cache_updated);
        assert_eq!(vehicle.cached_rate, DistanceRate::from_minor(30, 2));
        assert_eq!(change.effects.len(), 2);
    }

    #[test]
    fn test_set_rate_future_month_leaves_cache() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap()
        ));
        let mut history = RateHistory::new();
        let mut vehicle = vehicle();

        let change = history
            .set_rate(&mut vehicle, DistanceRate::from_minor(30, 2), date(2025, 5, 17), &time)
            .unwrap();

        assert!(!change.cache_updated);
        assert_eq!(vehicle.cached_rate, DistanceRate::from_minor(25, 2));

        // before the entry the cache still applies, from may onwards the new rate
        let april = Utc.with_ymd_and_hms(2025, 4, 30, 23, 59, 59).unwrap();
        let may = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(history.resolve_rate(&vehicle, april), DistanceRate::from_minor(25, 2));
        assert_eq!(history.resolve_rate(&vehicle, may), DistanceRate::from_minor(30, 2));
        assert_eq!(history.upcoming(vehicle.id, april).len(), 1);
    }

    #[test]
    fn test_retroactive_change_rejected() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
        ));
        let mut history = RateHistory::new();
        let mut vehicle = vehicle();

        let result = history.set_rate(&mut vehicle, DistanceRate::from_minor(30, 2), date(2025, 2, 28), &time);

        assert_eq!(
            result.unwrap_err(),
            PoolError::RetroactiveRateChange {
                requested: date(2025, 2, 1),
                current: date(2025, 3, 1),
            }
        );
        assert!(history.entries(vehicle.id).is_empty());
    }

    #[test]
    fn test_latest_effective_month_wins_regardless_of_insertion_order() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap()
        ));
        let mut history = RateHistory::new();
        let mut vehicle = vehicle();

        history.set_rate(&mut vehicle, DistanceRate::from_minor(40, 2), date(2025, 6, 1), &time).unwrap();
        history.set_rate(&mut vehicle, DistanceRate::from_minor(35, 2), date(2025, 3, 1), &time).unwrap();
        history.set_rate(&mut vehicle, DistanceRate::from_minor(28, 2), date(2025, 1, 1), &time).unwrap();

        let at = |m| Utc.with_ymd_and_hms(2025, m, 15, 12, 0, 0).unwrap();
        assert_eq!(history.resolve_rate(&vehicle, at(2)), DistanceRate::from_minor(28, 2));
        assert_eq!(history.resolve_rate(&vehicle, at(4)), DistanceRate::from_minor(35, 2));
        assert_eq!(history.resolve_rate(&vehicle, at(9)), DistanceRate::from_minor(40, 2));

        // idempotent
        assert_eq!(history.resolve_rate(&vehicle, at(4)), history.resolve_rate(&vehicle, at(4)));
    }

    #[test]
    fn test_same_month_overwrites() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap()
        ));
        let mut history = RateHistory::new();
        let mut vehicle = vehicle();

        history.set_rate(&mut vehicle, DistanceRate::from_minor(30, 2), date(2025, 4, 3), &time).unwrap();
        let change = history
            .set_rate(&mut vehicle, DistanceRate::from_minor(32, 2), date(2025, 4, 20), &time)
            .unwrap();

        assert_eq!(change.replaced, Some(DistanceRate::from_minor(30, 2)));
        assert_eq!(history.entries(vehicle.id).len(), 1);
    }

    #[test]
    fn test_refresh_cached_rate_when_month_arrives() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap()
        ));
        let control = time.test_control().unwrap();
        let mut history = RateHistory::new();
        let mut vehicle = vehicle();

        history.set_rate(&mut vehicle, DistanceRate::from_minor(30, 2), date(2025, 2, 1), &time).unwrap();
        assert!(history.refresh_cached_rate(&mut vehicle, &time).is_none());

        control.advance(chrono::Duration::days(15));
        let event = history.refresh_cached_rate(&mut vehicle, &time);

        assert!(matches!(event, Some(Event::ActiveRateChanged { .. })));
        assert_eq!(vehicle.cached_rate, DistanceRate::from_minor(30, 2));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap()
        ));
        let mut history = RateHistory::new();
        let mut vehicle = vehicle();

        let result = history.set_rate(&mut vehicle, DistanceRate::from_minor(-1, 2), date(2025, 2, 1), &time);
        assert!(matches!(result, Err(PoolError::InvalidRate { .. })));
    }
}
