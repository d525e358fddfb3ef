use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::errors::{PoolError, Result};

/// pool-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub rate_config: RateConfig,
    pub booking_config: BookingConfig,
}

/// rate and recommendation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateConfig {
    /// decimal places of the smallest billable rate unit
    pub rate_scale: u32,
    /// recommendations within +/- this percentage of the active rate are "keep"
    pub decision_band_percent: Decimal,
    /// observation window used when the pool assembles a recommendation
    pub observation_window_months: i32,
}

/// booking defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingConfig {
    /// length of a quick (emergency) booking when the caller gives none
    pub quick_booking_minutes: i64,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            rate_scale: 2,
            decision_band_percent: dec!(5),
            observation_window_months: 12,
        }
    }
}

/// a quick booking never holds a vehicle for more than a week
pub const MAX_QUICK_BOOKING_MINUTES: i64 = 7 * 24 * 60;

impl BookingConfig {
    pub fn quick_booking_duration(&self) -> Result<Duration> {
        if self.quick_booking_minutes <= 0 || self.quick_booking_minutes > MAX_QUICK_BOOKING_MINUTES {
            return Err(PoolError::InvalidConfiguration {
                message: format!(
                    "quick booking duration must be between 1 and {} minutes, got {}",
                    MAX_QUICK_BOOKING_MINUTES, self.quick_booking_minutes
                ),
            });
        }

        Duration::try_minutes(self.quick_booking_minutes).ok_or_else(|| PoolError::InvalidConfiguration {
            message: format!("quick booking duration of {} minutes is out of range", self.quick_booking_minutes),
        })
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            quick_booking_minutes: 120,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            rate_config: RateConfig::default(),
            booking_config: BookingConfig::default(),
        }
    }
}

impl PoolConfig {
    /// load from a json document, falling back to defaults for missing sections
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PartialPoolConfig =
            serde_json::from_str(json).map_err(|e| PoolError::InvalidConfiguration {
                message: e.to_string(),
            })?;

        let config = Self {
            rate_config: config.rate_config.unwrap_or_default(),
            booking_config: config.booking_config.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rate_config.rate_scale > 8 {
            return Err(PoolError::InvalidConfiguration {
                message: format!("rate scale {} exceeds 8 decimal places", self.rate_config.rate_scale),
            });
        }

        if self.rate_config.decision_band_percent < Decimal::ZERO {
            return Err(PoolError::InvalidConfiguration {
                message: "decision band cannot be negative".to_string(),
            });
        }

        if self.rate_config.observation_window_months <= 0 {
            return Err(PoolError::InvalidConfiguration {
                message: "observation window must be at least one month".to_string(),
            });
        }

        self.booking_config.quick_booking_duration()?;

        Ok(())
    }
}

#[derive(Deserialize)]
struct PartialPoolConfig {
    rate_config: Option<RateConfig>,
    booking_config: Option<BookingConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PoolConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_config.decision_band_percent, dec!(5));
        assert_eq!(config.rate_config.rate_scale, 2);
    }

    #[test]
    fn test_from_json_partial() {
        let config = PoolConfig::from_json(
            r#"{"rate_config": {"rate_scale": 3, "decision_band_percent": "2.5", "observation_window_months": 6}}"#,
        )
        .unwrap();

        assert_eq!(config.rate_config.rate_scale, 3);
        assert_eq!(config.rate_config.decision_band_percent, dec!(2.5));
        assert_eq!(config.booking_config, BookingConfig::default());
    }

    #[test]
    fn test_from_json_rejects_bad_window() {
        let result = PoolConfig::from_json(
            r#"{"rate_config": {"rate_scale": 2, "decision_band_percent": "5", "observation_window_months": 0}}"#,
        );
        assert!(matches!(result, Err(PoolError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_from_json_rejects_oversized_quick_booking() {
        let result = PoolConfig::from_json(r#"{"booking_config": {"quick_booking_minutes": 9223372036854775807}}"#);
        assert!(matches!(result, Err(PoolError::InvalidConfiguration { .. })));

        let mut config = PoolConfig::default();
        config.booking_config.quick_booking_minutes = MAX_QUICK_BOOKING_MINUTES + 1;
        assert!(config.validate().is_err());

        config.booking_config.quick_booking_minutes = MAX_QUICK_BOOKING_MINUTES;
        assert_eq!(
            config.booking_config.quick_booking_duration().unwrap(),
            Duration::days(7)
        );
    }
}
