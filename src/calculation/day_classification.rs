//! Day classification for allowance rates.
//!
//! This module decides whether an allocated date is paid at the weekday or
//! the weekend rate, and which report counter it increments.

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::HolidayMap;
use crate::models::ShiftVersion;

/// How an allocated day is counted.
///
/// Weekends take priority over holidays: a holiday falling on a Saturday is
/// counted as [`DayCategory::Weekend`]. Both categories are paid at the
/// weekend rate.
///
/// # Example
///
/// ```
/// use shift_roster::calculation::DayCategory;
///
/// assert!(DayCategory::Holiday.uses_weekend_rate());
/// assert!(!DayCategory::Weekday.uses_weekend_rate());
/// assert_eq!(DayCategory::Weekend.to_string(), "Weekend");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCategory {
    /// Monday through Friday, not a holiday.
    Weekday,
    /// Saturday or Sunday.
    Weekend,
    /// Monday through Friday on a holiday.
    Holiday,
}

impl DayCategory {
    /// Whether the day is paid at the weekend rate.
    pub fn uses_weekend_rate(self) -> bool {
        !matches!(self, DayCategory::Weekday)
    }

    /// Selects the rate this category pays from a set of rates.
    pub fn rate(self, rates: &ShiftRates) -> Decimal {
        if self.uses_weekend_rate() {
            rates.weekend_allowance
        } else {
            rates.weekday_allowance
        }
    }
}

impl std::fmt::Display for DayCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayCategory::Weekday => write!(f, "Weekday"),
            DayCategory::Weekend => write!(f, "Weekend"),
            DayCategory::Holiday => write!(f, "Holiday"),
        }
    }
}

/// The pair of rates a shift pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftRates {
    /// Weekday rate.
    pub weekday_allowance: Decimal,
    /// Weekend/holiday rate.
    pub weekend_allowance: Decimal,
}

impl ShiftRates {
    /// Takes the larger of each rate independently.
    pub fn max(self, other: ShiftRates) -> ShiftRates {
        ShiftRates {
            weekday_allowance: self.weekday_allowance.max(other.weekday_allowance),
            weekend_allowance: self.weekend_allowance.max(other.weekend_allowance),
        }
    }
}

impl From<&ShiftVersion> for ShiftRates {
    fn from(version: &ShiftVersion) -> Self {
        ShiftRates {
            weekday_allowance: version.weekday_allowance,
            weekend_allowance: version.weekend_allowance,
        }
    }
}

/// Whether a date falls on Saturday or Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Classifies a date against a holiday map.
///
/// # Example
///
/// ```
/// use shift_roster::calculation::{classify_day, DayCategory, HolidayMap};
/// use chrono::NaiveDate;
///
/// let holidays = HolidayMap::new();
///
/// // 2024-01-06 is a Saturday
/// let saturday = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
/// assert_eq!(classify_day(saturday, &holidays), DayCategory::Weekend);
///
/// // 2024-01-08 is a Monday
/// let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
/// assert_eq!(classify_day(monday, &holidays), DayCategory::Weekday);
/// ```
pub fn classify_day(date: NaiveDate, holidays: &HolidayMap) -> DayCategory {
    if is_weekend(date) {
        DayCategory::Weekend
    } else if holidays.contains_key(&date) {
        DayCategory::Holiday
    } else {
        DayCategory::Weekday
    }
}
