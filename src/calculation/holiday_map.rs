//! Holiday map construction with project-over-company precedence.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::NaiveDate;

use crate::models::{DateRange, Holiday, HolidayInfo};

/// Holidays keyed by date.
pub type HolidayMap = BTreeMap<NaiveDate, HolidayInfo>;

/// Builds the holiday map visible to a project over a range.
///
/// A row is visible when its date lies in `range` and it is either
/// company-wide or belongs to `project_id`. When `project_id` is `None`
/// only company-wide rows are visible.
///
/// When two visible rows share a date, a project row replaces whatever is
/// already mapped and a company row never replaces an existing entry, so the
/// result does not depend on the order of `holidays`.
///
/// # Example
///
/// ```
/// use shift_roster::calculation::build_holiday_map;
/// use shift_roster::models::{DateRange, Holiday, HolidayScope};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 26).unwrap();
/// let holidays = vec![
///     Holiday {
///         holiday_id: 1,
///         project_id: Some(5),
///         holiday_date: date,
///         holiday_name: "Site shutdown".to_string(),
///         spl_allowance: Decimal::ZERO,
///     },
///     Holiday {
///         holiday_id: 2,
///         project_id: None,
///         holiday_date: date,
///         holiday_name: "Republic Day".to_string(),
///         spl_allowance: Decimal::ZERO,
///     },
/// ];
/// let range = DateRange::single(date);
///
/// let project_view = build_holiday_map(&holidays, Some(5), &range);
/// assert_eq!(project_view[&date].holiday_name, "Site shutdown");
/// assert_eq!(project_view[&date].scope, HolidayScope::Project);
///
/// let company_view = build_holiday_map(&holidays, None, &range);
/// assert_eq!(company_view[&date].holiday_name, "Republic Day");
/// ```
pub fn build_holiday_map(
    holidays: &[Holiday],
    project_id: Option<i64>,
    range: &DateRange,
) -> HolidayMap {
    let mut map = HolidayMap::new();

    for holiday in holidays
        .iter()
        .filter(|h| range.contains(h.holiday_date) && is_visible(h, project_id))
    {
        match map.entry(holiday.holiday_date) {
            Entry::Vacant(slot) => {
                slot.insert(holiday.into());
            }
            Entry::Occupied(mut slot) => {
                if holiday.project_id.is_some() {
                    slot.insert(holiday.into());
                }
            }
        }
    }

    map
}

fn is_visible(holiday: &Holiday, project_id: Option<i64>) -> bool {
    match (holiday.project_id, project_id) {
        (None, _) => true,
        (Some(owner), Some(requested)) => owner == requested,
        (Some(_), None) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HolidayScope;
    use rust_decimal::Decimal;

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn holiday(id: i64, project_id: Option<i64>, date: &str, name: &str) -> Holiday {
        Holiday {
            holiday_id: id,
            project_id,
            holiday_date: make_date(date),
            holiday_name: name.to_string(),
            spl_allowance: Decimal::ZERO,
        }
    }

    fn january() -> DateRange {
        DateRange::new(make_date("2024-01-01"), make_date("2024-01-31")).unwrap()
    }

    #[test]
    fn test_project_holiday_wins_regardless_of_order() {
        let company_first = vec![
            holiday(1, None, "2024-01-15", "Pongal"),
            holiday(2, Some(3), "2024-01-15", "Client holiday"),
        ];
        let project_first = vec![
            holiday(2, Some(3), "2024-01-15", "Client holiday"),
            holiday(1, None, "2024-01-15", "Pongal"),
        ];

        for rows in [company_first, project_first] {
            let map = build_holiday_map(&rows, Some(3), &january());
            let info = &map[&make_date("2024-01-15")];
            assert_eq!(info.holiday_name, "Client holiday");
            assert_eq!(info.scope, HolidayScope::Project);
        }
    }

    #[test]
    fn test_other_projects_holidays_are_invisible() {
        let rows = vec![holiday(1, Some(9), "2024-01-15", "Other site")];
        assert!(build_holiday_map(&rows, Some(3), &january()).is_empty());
    }

    #[test]
    fn test_no_project_sees_company_holidays_only() {
        let rows = vec![
            holiday(1, None, "2024-01-01", "New Year"),
            holiday(2, Some(3), "2024-01-15", "Client holiday"),
        ];
        let map = build_holiday_map(&rows, None, &january());
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&make_date("2024-01-01")));
    }

    #[test]
    fn test_rows_outside_range_are_dropped() {
        let rows = vec![holiday(1, None, "2024-02-01", "Outside")];
        assert!(build_holiday_map(&rows, None, &january()).is_empty());
    }
}
