//! Versioned shift definitions.
//!
//! A shift code within a project is never edited in place. Each change of
//! name, hours or rates produces a new [`ShiftVersion`] whose effective window
//! starts where the previous one was closed.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::DateRange;

/// A time-bounded record of one project's shift code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftVersion {
    /// Storage identifier of this version.
    pub id: i64,
    /// The project owning the shift.
    pub project_id: i64,
    /// The project-local shift code (e.g. "MORNING").
    pub shift_code: String,
    /// Display name of the shift.
    pub shift_name: String,
    /// Start of the shift's working hours.
    pub start_time: NaiveTime,
    /// End of the shift's working hours.
    pub end_time: NaiveTime,
    /// Rate paid for a weekday allocation.
    pub weekday_allowance: Decimal,
    /// Rate paid for a weekend or holiday allocation.
    pub weekend_allowance: Decimal,
    /// First day this version applies to.
    pub effective_from: NaiveDate,
    /// Last day this version applies to; `None` for the current version.
    pub effective_to: Option<NaiveDate>,
    /// Inactive versions are ignored by every lookup.
    pub is_active: bool,
}

impl ShiftVersion {
    /// Whether this version is active and its window includes `date`.
    ///
    /// # Example
    ///
    /// ```
    /// use shift_roster::models::ShiftVersion;
    /// use chrono::{NaiveDate, NaiveTime};
    /// use rust_decimal::Decimal;
    ///
    /// let version = ShiftVersion {
    ///     id: 1,
    ///     project_id: 1,
    ///     shift_code: "MORNING".to_string(),
    ///     shift_name: "Morning".to_string(),
    ///     start_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
    ///     end_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
    ///     weekday_allowance: Decimal::new(50, 0),
    ///     weekend_allowance: Decimal::new(80, 0),
    ///     effective_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    ///     effective_to: None,
    ///     is_active: true,
    /// };
    ///
    /// assert!(version.covers(NaiveDate::from_ymd_opt(2030, 5, 1).unwrap()));
    /// assert!(!version.covers(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()));
    /// ```
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.is_active
            && self.effective_from <= date
            && self.effective_to.is_none_or(|to| to >= date)
    }

    /// Whether this version is active and its window intersects `range`.
    pub fn overlaps(&self, range: &DateRange) -> bool {
        self.is_active
            && self.effective_from <= range.to
            && self.effective_to.is_none_or(|to| to >= range.from)
    }

    /// Whether this is the open-ended current version.
    pub fn is_current(&self) -> bool {
        self.is_active && self.effective_to.is_none()
    }
}

/// Input for creating or versioning a shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftDefinition {
    /// The shift code; ignored when versioning (the path names the code).
    pub shift_code: String,
    /// Display name.
    pub shift_name: String,
    /// Start of working hours.
    pub start_time: NaiveTime,
    /// End of working hours.
    pub end_time: NaiveTime,
    /// Weekday rate.
    pub weekday_allowance: Decimal,
    /// Weekend/holiday rate.
    pub weekend_allowance: Decimal,
    /// First day the definition applies to.
    pub effective_from: NaiveDate,
}

/// One legend entry of a report's shift catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftCatalogEntry {
    /// The shift code.
    pub shift_code: String,
    /// Display name.
    pub shift_name: String,
    /// Start of working hours.
    pub start_time: NaiveTime,
    /// End of working hours.
    pub end_time: NaiveTime,
    /// Weekday rate.
    pub weekday_allowance: Decimal,
    /// Weekend/holiday rate.
    pub weekend_allowance: Decimal,
    /// Earliest effective day represented by this entry.
    pub effective_from: NaiveDate,
    /// Latest effective day represented, `None` if open-ended.
    pub effective_to: Option<NaiveDate>,
}

impl From<&ShiftVersion> for ShiftCatalogEntry {
    fn from(version: &ShiftVersion) -> Self {
        ShiftCatalogEntry {
            shift_code: version.shift_code.clone(),
            shift_name: version.shift_name.clone(),
            start_time: version.start_time,
            end_time: version.end_time,
            weekday_allowance: version.weekday_allowance,
            weekend_allowance: version.weekend_allowance,
            effective_from: version.effective_from,
            effective_to: version.effective_to,
        }
    }
}
