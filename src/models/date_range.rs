//! Inclusive date range used by every report and range query.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{RosterError, RosterResult};

/// An inclusive range of calendar dates.
///
/// # Example
///
/// ```
/// use shift_roster::models::DateRange;
/// use chrono::NaiveDate;
///
/// let range = DateRange::new(
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
/// )
/// .unwrap();
///
/// assert!(range.contains(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()));
/// assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()));
/// assert_eq!(range.days(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day of the range (inclusive).
    pub from: NaiveDate,
    /// Last day of the range (inclusive).
    pub to: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting one whose start lies after its end.
    pub fn new(from: NaiveDate, to: NaiveDate) -> RosterResult<Self> {
        if from > to {
            return Err(RosterError::validation(format!(
                "from_date {} must not be after to_date {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    /// A range covering exactly one day.
    pub fn single(date: NaiveDate) -> Self {
        Self {
            from: date,
            to: date,
        }
    }

    /// Checks whether a date falls within the range (inclusive on both ends).
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    /// Number of calendar days covered.
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let result = DateRange::new(make_date("2024-02-01"), make_date("2024-01-01"));
        assert!(matches!(result, Err(RosterError::Validation { .. })));
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::single(make_date("2024-01-06"));
        assert_eq!(range.days(), 1);
        assert!(range.contains(make_date("2024-01-06")));
        assert!(!range.contains(make_date("2024-01-05")));
    }
}
