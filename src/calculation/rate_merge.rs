//! Cross-project "most favorable" rate merging.
//!
//! A shift code is only unique within a project. When a report spans several
//! projects, each code is paid at the highest weekday and the highest weekend
//! rate found among the projects, taken independently.

use std::collections::{BTreeMap, BTreeSet};
use std::cmp::Reverse;

use chrono::NaiveDate;

use super::{ShiftRates, resolve_shift};
use crate::error::{RosterError, RosterResult};
use crate::models::{DateRange, ShiftCatalogEntry, ShiftVersion};

/// Builds one catalog entry per shift code across every version overlapping
/// `range`.
///
/// Rates are the maximum over all matching versions. Name and hours come from
/// the lowest project id's latest version. The effective window widens to
/// cover every merged version. Entries are ordered by shift code.
///
/// # Example
///
/// ```
/// use shift_roster::calculation::merge_catalog;
/// use shift_roster::models::{DateRange, ShiftVersion};
/// use chrono::{NaiveDate, NaiveTime};
/// use rust_decimal::Decimal;
///
/// let version = |id: i64, project_id: i64, weekday: i64| ShiftVersion {
///     id,
///     project_id,
///     shift_code: "A".to_string(),
///     shift_name: "Shift A".to_string(),
///     start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
///     end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
///     weekday_allowance: Decimal::new(weekday, 0),
///     weekend_allowance: Decimal::new(200, 0),
///     effective_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     effective_to: None,
///     is_active: true,
/// };
/// let range = DateRange::single(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
///
/// let catalog = merge_catalog(&[version(1, 1, 100), version(2, 2, 150)], &range);
/// assert_eq!(catalog.len(), 1);
/// assert_eq!(catalog[0].weekday_allowance, Decimal::new(150, 0));
/// ```
pub fn merge_catalog(versions: &[ShiftVersion], range: &DateRange) -> Vec<ShiftCatalogEntry> {
    let mut ordered: Vec<&ShiftVersion> = versions.iter().filter(|v| v.overlaps(range)).collect();
    ordered.sort_by_key(|v| (v.project_id, Reverse(v.effective_from)));

    let mut merged: BTreeMap<String, ShiftCatalogEntry> = BTreeMap::new();
    for version in ordered {
        match merged.get_mut(&version.shift_code) {
            None => {
                merged.insert(version.shift_code.clone(), version.into());
            }
            Some(entry) => {
                entry.weekday_allowance = entry.weekday_allowance.max(version.weekday_allowance);
                entry.weekend_allowance = entry.weekend_allowance.max(version.weekend_allowance);
                entry.effective_from = entry.effective_from.min(version.effective_from);
                entry.effective_to = match (entry.effective_to, version.effective_to) {
                    (Some(a), Some(b)) => Some(a.max(b)),
                    _ => None,
                };
            }
        }
    }

    merged.into_values().collect()
}

/// The catalog of a single project: every version overlapping `range`,
/// ordered by shift code then effective date.
pub fn project_catalog(versions: &[ShiftVersion], range: &DateRange) -> Vec<ShiftCatalogEntry> {
    let mut ordered: Vec<&ShiftVersion> = versions.iter().filter(|v| v.overlaps(range)).collect();
    ordered.sort_by(|a, b| {
        a.shift_code
            .cmp(&b.shift_code)
            .then(a.effective_from.cmp(&b.effective_from))
    });
    ordered.into_iter().map(ShiftCatalogEntry::from).collect()
}

/// Resolves the most favorable rates for a shift code on a date.
///
/// Every project that defines `shift_code` in `versions` is resolved through
/// [`resolve_shift`] for `date`; projects with no covering version are
/// ignored. `origin_project` is the project the allocation was recorded
/// against and only names the failure.
///
/// # Errors
///
/// Returns [`RosterError::ShiftNotResolved`] when no project resolves.
pub fn most_favorable_rates(
    versions: &[ShiftVersion],
    origin_project: i64,
    shift_code: &str,
    date: NaiveDate,
) -> RosterResult<ShiftRates> {
    let projects: BTreeSet<i64> = versions
        .iter()
        .filter(|v| v.shift_code == shift_code)
        .map(|v| v.project_id)
        .collect();

    projects
        .into_iter()
        .filter_map(|project_id| resolve_shift(versions, project_id, shift_code, date).ok())
        .map(ShiftRates::from)
        .reduce(ShiftRates::max)
        .ok_or_else(|| RosterError::ShiftNotResolved {
            project_id: origin_project,
            shift_code: shift_code.to_string(),
            date,
        })
}
