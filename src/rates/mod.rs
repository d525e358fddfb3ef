pub mod history;

use chrono::{Datelike, Months, NaiveDate};

use crate::errors::{PoolError, Result};

pub use history::{RateChange, RateHistory, RateHistoryEntry};

/// first day of the calendar month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// first day of the calendar month after the one containing `date`
pub fn next_month_start(date: NaiveDate) -> Result<NaiveDate> {
    month_start(date)
        .checked_add_months(Months::new(1))
        .ok_or_else(|| PoolError::InvalidDate {
            message: format!("no month follows {}", date),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_start() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    }

    #[test]
    fn test_next_month_rolls_year() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(next_month_start(date).unwrap(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }
}
