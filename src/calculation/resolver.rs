//! Canonical shift resolution.
//!
//! Every rate used anywhere in the engine is looked up through
//! [`resolve_shift`]; the store and the aggregator never re-derive the
//! effective-window filter on their own.

use chrono::NaiveDate;

use crate::error::{RosterError, RosterResult};
use crate::models::ShiftVersion;

/// Resolves the single active version of a shift for a date.
///
/// Candidates are active versions of `(project_id, shift_code)` whose window
/// `[effective_from, effective_to]` contains `date` (an open `effective_to`
/// covers every later date). If overlapping versions match, the one with the
/// latest `effective_from` wins.
///
/// # Errors
///
/// Returns [`RosterError::ShiftNotResolved`] when no version matches.
///
/// # Example
///
/// ```
/// use shift_roster::calculation::resolve_shift;
/// use shift_roster::models::ShiftVersion;
/// use chrono::{NaiveDate, NaiveTime};
/// use rust_decimal::Decimal;
///
/// let versions = vec![ShiftVersion {
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
/// }];
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
/// let version = resolve_shift(&versions, 1, "MORNING", date).unwrap();
/// assert_eq!(version.weekday_allowance, Decimal::new(50, 0));
///
/// let before = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
/// assert!(resolve_shift(&versions, 1, "MORNING", before).is_err());
/// ```
pub fn resolve_shift<'a>(
    versions: &'a [ShiftVersion],
    project_id: i64,
    shift_code: &str,
    date: NaiveDate,
) -> RosterResult<&'a ShiftVersion> {
    versions
        .iter()
        .filter(|v| v.project_id == project_id && v.shift_code == shift_code && v.covers(date))
        .max_by_key(|v| v.effective_from)
        .ok_or_else(|| RosterError::ShiftNotResolved {
            project_id,
            shift_code: shift_code.to_string(),
            date,
        })
}
