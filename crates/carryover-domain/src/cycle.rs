//! Budget cycle kinds and the configuration that anchors them.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Recurrence unit of a budget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum CycleType {
    Day,
    Week,
    Month,
    Year,
}

impl CycleType {
    /// Inclusive range accepted for `cycle_start_day`, when the cycle uses one.
    pub fn start_day_range(self) -> Option<(u32, u32)> {
        match self {
            CycleType::Week => Some((1, 7)),
            CycleType::Month => Some((1, 31)),
            CycleType::Day | CycleType::Year => None,
        }
    }
}

impl fmt::Display for CycleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CycleType::Day => "DAY",
            CycleType::Week => "WEEK",
            CycleType::Month => "MONTH",
            CycleType::Year => "YEAR",
        };
        f.write_str(label)
    }
}

impl FromStr for CycleType {
    type Err = UnknownCycleType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(CycleType::Day),
            "week" | "weekly" => Ok(CycleType::Week),
            "month" | "monthly" => Ok(CycleType::Month),
            "year" | "yearly" => Ok(CycleType::Year),
            _ => Err(UnknownCycleType(value.to_string())),
        }
    }
}

/// Raised when a cycle name cannot be mapped onto a [`CycleType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCycleType(pub String);

impl fmt::Display for UnknownCycleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown cycle type `{}`", self.0)
    }
}

impl std::error::Error for UnknownCycleType {}

/// Everything the period calculator needs to place a date inside a cycle.
///
/// `cycle_start_day` is 1 (Monday) to 7 (Sunday) for weekly cycles and the
/// day of month for monthly cycles. Daily and yearly cycles ignore it; yearly
/// cycles take their month/day anchor from `start_date`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleConfig {
    pub cycle_type: CycleType,
    pub cycle_start_day: u32,
    pub start_date: NaiveDate,
}

impl CycleConfig {
    pub fn new(cycle_type: CycleType, cycle_start_day: u32, start_date: NaiveDate) -> Self {
        Self {
            cycle_type,
            cycle_start_day,
            start_date,
        }
    }

    pub fn monthly(cycle_start_day: u32, start_date: NaiveDate) -> Self {
        Self::new(CycleType::Month, cycle_start_day, start_date)
    }

    pub fn weekly(cycle_start_day: u32, start_date: NaiveDate) -> Self {
        Self::new(CycleType::Week, cycle_start_day, start_date)
    }

    /// Returns `true` when `cycle_start_day` lies inside the range its cycle accepts.
    pub fn has_valid_start_day(&self) -> bool {
        match self.cycle_type.start_day_range() {
            Some((min, max)) => (min..=max).contains(&self.cycle_start_day),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_cycle_names() {
        assert_eq!("MONTH".parse::<CycleType>(), Ok(CycleType::Month));
        assert_eq!(" weekly ".parse::<CycleType>(), Ok(CycleType::Week));
        assert_eq!("day".parse::<CycleType>(), Ok(CycleType::Day));
    }

    #[test]
    fn rejects_unknown_cycle_names() {
        let err = "fortnight".parse::<CycleType>().unwrap_err();
        assert_eq!(err, UnknownCycleType("fortnight".into()));
        assert!(err.to_string().contains("fortnight"));
    }

    #[test]
    fn start_day_validation_depends_on_cycle() {
        let anchor = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(CycleConfig::weekly(7, anchor).has_valid_start_day());
        assert!(!CycleConfig::weekly(8, anchor).has_valid_start_day());
        assert!(!CycleConfig::monthly(0, anchor).has_valid_start_day());
        assert!(CycleConfig::new(CycleType::Year, 99, anchor).has_valid_start_day());
    }
}
