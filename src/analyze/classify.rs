//! Hot/warm/cold temperature classification
//!
//! A record's temperature is a pure function of its days-since-access and the
//! configured thresholds. Both boundaries are inclusive on their own side:
//! exactly `hot_days` old is hot, exactly `cold_days` old is cold.

use crate::error::ConfigError;

/// Validated recency thresholds in days
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub hot_days: i64,
    pub cold_days: i64,
}

impl Thresholds {
    pub fn new(hot_days: i64, cold_days: i64) -> Result<Self, ConfigError> {
        if hot_days >= cold_days {
            return Err(ConfigError::InvalidThresholds {
                hot_days,
                cold_days,
            });
        }
        Ok(Self {
            hot_days,
            cold_days,
        })
    }
}

/// Access-recency tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Temperature {
    Hot,
    Warm,
    Cold,
}

/// All tiers in display order
pub const TEMPERATURES: [Temperature; 3] = [Temperature::Hot, Temperature::Warm, Temperature::Cold];

impl Temperature {
    pub fn label(&self) -> &'static str {
        match self {
            Temperature::Hot => "hot",
            Temperature::Warm => "warm",
            Temperature::Cold => "cold",
        }
    }

    /// Position in [`TEMPERATURES`], used for fixed-width cross-tabs
    pub fn index(&self) -> usize {
        match self {
            Temperature::Hot => 0,
            Temperature::Warm => 1,
            Temperature::Cold => 2,
        }
    }
}

/// Classify a record by days since last access
///
/// Files accessed in the future (negative days) are hot: a clock-skewed
/// access time still means the file was touched recently.
pub fn classify(days_since_access: i64, thresholds: &Thresholds) -> Temperature {
    if days_since_access <= thresholds.hot_days {
        Temperature::Hot
    } else if days_since_access >= thresholds.cold_days {
        Temperature::Cold
    } else {
        Temperature::Warm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Thresholds {
        Thresholds::new(30, 180).unwrap()
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let t = defaults();
        assert_eq!(classify(30, &t), Temperature::Hot);
        assert_eq!(classify(31, &t), Temperature::Warm);
        assert_eq!(classify(179, &t), Temperature::Warm);
        assert_eq!(classify(180, &t), Temperature::Cold);
    }

    #[test]
    fn test_extremes() {
        let t = defaults();
        assert_eq!(classify(0, &t), Temperature::Hot);
        assert_eq!(classify(-5, &t), Temperature::Hot);
        assert_eq!(classify(10_000, &t), Temperature::Cold);
    }

    #[test]
    fn test_thresholds_validation() {
        assert!(Thresholds::new(30, 180).is_ok());
        assert!(Thresholds::new(180, 30).is_err());
        assert!(Thresholds::new(30, 30).is_err());
    }
}
