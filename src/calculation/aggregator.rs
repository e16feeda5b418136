//! Allowance aggregation.
//!
//! This module turns approved allocation rows into allowance reports. All
//! three report variants price an allocation the same way: resolve the rates
//! for the allocation's date, classify the day, then apply the weekday or
//! weekend rate. They differ only in which rates are used and whether
//! duplicate allocations are collapsed.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use super::{
    DayCategory, HolidayMap, ShiftRates, classify_day, merge_catalog, most_favorable_rates,
    project_catalog, resolve_shift,
};
use crate::error::RosterResult;
use crate::models::{
    AllocationRow, AllowanceReport, DailyAllowance, DateRange, DetailedReport,
    EmployeeAllowanceRow, ReportEmployee, ReportSummary, ShiftVersion,
};

/// How the rate for an allocation is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateStrategy {
    /// The allocation's own project version.
    PerProject,
    /// The highest rate among every project defining the shift code.
    MostFavorable,
}

/// An allocation with its day category and applied rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedAllocation<'a> {
    /// The allocation that was priced.
    pub row: &'a AllocationRow,
    /// How the day was classified.
    pub category: DayCategory,
    /// The rate applied.
    pub allowance: Decimal,
}

/// Prices one allocation.
///
/// # Errors
///
/// Returns [`crate::error::RosterError::ShiftNotResolved`] when no version
/// covers the allocation's date.
pub fn price_allocation<'a>(
    row: &'a AllocationRow,
    versions: &[ShiftVersion],
    holidays: &HolidayMap,
    strategy: RateStrategy,
) -> RosterResult<PricedAllocation<'a>> {
    let rates = match strategy {
        RateStrategy::PerProject => {
            resolve_shift(versions, row.project_id, &row.shift_code, row.shift_date)
                .map(ShiftRates::from)?
        }
        RateStrategy::MostFavorable => {
            most_favorable_rates(versions, row.project_id, &row.shift_code, row.shift_date)?
        }
    };
    let category = classify_day(row.shift_date, holidays);

    Ok(PricedAllocation {
        row,
        category,
        allowance: category.rate(&rates),
    })
}

/// Orders allocation rows deterministically and drops every repeat of an
/// `(emp_id, shift_date, shift_code)` key after its first occurrence.
///
/// Rows are ordered by project id, then date, employee, shift code and
/// allocation id, so the surviving row of a duplicated key is the one from
/// the lowest project id.
pub fn dedup_allocations(rows: &[AllocationRow]) -> Vec<&AllocationRow> {
    let mut ordered: Vec<&AllocationRow> = rows.iter().collect();
    ordered.sort_by(|a, b| {
        (a.project_id, a.shift_date, a.emp_id, &a.shift_code, a.allocation_id).cmp(&(
            b.project_id,
            b.shift_date,
            b.emp_id,
            &b.shift_code,
            b.allocation_id,
        ))
    });

    let mut seen: HashSet<(i64, NaiveDate, String)> = HashSet::new();
    ordered
        .into_iter()
        .filter(|row| seen.insert((row.emp_id, row.shift_date, row.shift_code.clone())))
        .collect()
}

/// Prices rows, skipping those whose shift does not resolve.
fn price_all<'a>(
    rows: impl IntoIterator<Item = &'a AllocationRow>,
    versions: &[ShiftVersion],
    holidays: &HolidayMap,
    strategy: RateStrategy,
) -> Vec<PricedAllocation<'a>> {
    rows.into_iter()
        .filter_map(|row| match price_allocation(row, versions, holidays, strategy) {
            Ok(priced) => Some(priced),
            Err(err) => {
                debug!(
                    allocation_id = row.allocation_id,
                    error = %err,
                    "Skipping allocation without a resolvable shift"
                );
                None
            }
        })
        .collect()
}

/// Folds priced allocations into one row per employee, ordered by emp_id.
fn summarize_by_employee(priced: &[PricedAllocation<'_>]) -> Vec<EmployeeAllowanceRow> {
    let mut rows: BTreeMap<i64, EmployeeAllowanceRow> = BTreeMap::new();

    for item in priced {
        let row = rows.entry(item.row.emp_id).or_insert_with(|| {
            EmployeeAllowanceRow::new(item.row.emp_id, &item.row.emp_name, &item.row.emp_lname)
        });

        match item.category {
            DayCategory::Weekend => row.weekend_shift_count += 1,
            DayCategory::Holiday => row.holiday_shift_count += 1,
            DayCategory::Weekday => {
                *row.shift_counts.entry(item.row.shift_code.clone()).or_insert(0) += 1;
            }
        }
        row.total_allowance += item.allowance;
    }

    rows.into_values().collect()
}

/// Builds the per-employee report for a single project.
///
/// `versions`, `holidays` and `rows` must already be scoped to the project.
/// Rates come from the allocation's own project version; no duplicate
/// collapsing is applied since the ledger cannot hold duplicates within one
/// project.
pub fn single_project_report(
    range: DateRange,
    versions: &[ShiftVersion],
    holidays: &HolidayMap,
    rows: &[AllocationRow],
) -> AllowanceReport {
    let priced = price_all(rows, versions, holidays, RateStrategy::PerProject);

    AllowanceReport {
        range,
        shifts: project_catalog(versions, &range),
        rows: summarize_by_employee(&priced),
    }
}

/// Builds the per-employee report across several projects.
///
/// Duplicate `(emp_id, shift_date, shift_code)` allocations are counted once
/// and each shift code is paid at its most favorable rate.
pub fn aggregate_report(
    range: DateRange,
    versions: &[ShiftVersion],
    holidays: &HolidayMap,
    rows: &[AllocationRow],
) -> AllowanceReport {
    let unique = dedup_allocations(rows);
    let priced = price_all(unique, versions, holidays, RateStrategy::MostFavorable);

    AllowanceReport {
        range,
        shifts: merge_catalog(versions, &range),
        rows: summarize_by_employee(&priced),
    }
}

/// Builds the day-by-day report across the given rows.
///
/// Uses the same duplicate collapsing and rate merging as
/// [`aggregate_report`]. The daily list is sorted by date with a stable sort,
/// so records on the same date keep the deduplication order.
pub fn detailed_report(
    range: DateRange,
    versions: &[ShiftVersion],
    holidays: &HolidayMap,
    rows: &[AllocationRow],
    employee: Option<ReportEmployee>,
) -> DetailedReport {
    let unique = dedup_allocations(rows);
    let priced = price_all(unique, versions, holidays, RateStrategy::MostFavorable);

    let mut summary = ReportSummary::default();
    let mut daily = Vec::with_capacity(priced.len());

    for item in &priced {
        match item.category {
            DayCategory::Weekday => summary.weekday_count += 1,
            DayCategory::Weekend => summary.weekend_count += 1,
            DayCategory::Holiday => summary.holiday_count += 1,
        }
        summary.total_allowance += item.allowance;

        daily.push(DailyAllowance {
            date: item.row.shift_date,
            project_id: item.row.project_id,
            project: item.row.project_name.clone(),
            emp_id: item.row.emp_id,
            employee: item.row.emp_name.clone(),
            shift_code: item.row.shift_code.clone(),
            category: item.category,
            allowance: item.allowance,
        });
    }

    daily.sort_by_key(|record| record.date);

    DetailedReport {
        range,
        employee,
        shifts: merge_catalog(versions, &range),
        summary,
        daily,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HolidayInfo, HolidayScope};
    use chrono::NaiveTime;
    use std::str::FromStr;

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn version(id: i64, project_id: i64, code: &str, weekday: &str, weekend: &str) -> ShiftVersion {
        ShiftVersion {
            id,
            project_id,
            shift_code: code.to_string(),
            shift_name: code.to_string(),
            start_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            weekday_allowance: dec(weekday),
            weekend_allowance: dec(weekend),
            effective_from: make_date("2024-01-01"),
            effective_to: None,
            is_active: true,
        }
    }

    fn allocation(id: i64, emp_id: i64, project_id: i64, code: &str, date: &str) -> AllocationRow {
        AllocationRow {
            allocation_id: id,
            emp_id,
            emp_name: format!("Emp{}", emp_id),
            emp_lname: "Test".to_string(),
            project_id,
            project_name: format!("Project {}", project_id),
            shift_code: code.to_string(),
            shift_date: make_date(date),
        }
    }

    fn january() -> DateRange {
        DateRange::new(make_date("2024-01-01"), make_date("2024-01-31")).unwrap()
    }

    fn holiday_on(date: &str) -> HolidayMap {
        let mut map = HolidayMap::new();
        map.insert(
            make_date(date),
            HolidayInfo {
                holiday_name: "Holiday".to_string(),
                scope: HolidayScope::Company,
                spl_allowance: Decimal::ZERO,
            },
        );
        map
    }

    #[test]
    fn test_morning_saturday_and_monday() {
        let versions = vec![version(1, 1, "MORNING", "50", "80")];
        let rows = vec![
            allocation(1, 1, 1, "MORNING", "2024-01-06"), // Saturday
            allocation(2, 1, 1, "MORNING", "2024-01-08"), // Monday
        ];

        let report = single_project_report(january(), &versions, &HolidayMap::new(), &rows);

        assert_eq!(report.rows.len(), 1);
        let row = &report.rows[0];
        assert_eq!(row.weekend_shift_count, 1);
        assert_eq!(row.holiday_shift_count, 0);
        assert_eq!(row.shift_counts.get("MORNING"), Some(&1));
        assert_eq!(row.total_allowance, dec("130"));
        assert_eq!(report.shifts.len(), 1);
    }

    #[test]
    fn test_weekday_holiday_counts_as_holiday_at_weekend_rate() {
        let versions = vec![version(1, 1, "MORNING", "50", "80")];
        let rows = vec![allocation(1, 1, 1, "MORNING", "2024-01-26")]; // Friday

        let report = single_project_report(january(), &versions, &holiday_on("2024-01-26"), &rows);

        let row = &report.rows[0];
        assert_eq!(row.holiday_shift_count, 1);
        assert!(row.shift_counts.is_empty());
        assert_eq!(row.total_allowance, dec("80"));
    }

    #[test]
    fn test_saturday_holiday_counts_as_weekend() {
        let versions = vec![version(1, 1, "MORNING", "50", "80")];
        let rows = vec![allocation(1, 1, 1, "MORNING", "2024-01-06")];

        let report = single_project_report(january(), &versions, &holiday_on("2024-01-06"), &rows);

        let row = &report.rows[0];
        assert_eq!(row.weekend_shift_count, 1);
        assert_eq!(row.holiday_shift_count, 0);
    }

    #[test]
    fn test_unresolvable_allocation_is_skipped() {
        let versions = vec![version(1, 1, "MORNING", "50", "80")];
        let rows = vec![
            allocation(1, 1, 1, "MORNING", "2024-01-08"),
            allocation(2, 1, 1, "GHOST", "2024-01-09"),
            allocation(3, 2, 1, "GHOST", "2024-01-09"),
        ];

        let report = single_project_report(january(), &versions, &HolidayMap::new(), &rows);

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].total_allowance, dec("50"));
    }

    #[test]
    fn test_single_project_uses_own_rates_not_max() {
        let versions = vec![
            version(1, 1, "A", "100", "100"),
            version(2, 2, "A", "150", "150"),
        ];
        let rows = vec![allocation(1, 1, 1, "A", "2024-01-08")];

        let report = single_project_report(january(), &versions, &HolidayMap::new(), &rows);
        assert_eq!(report.rows[0].total_allowance, dec("100"));
    }

    #[test]
    fn test_aggregate_uses_most_favorable_rate() {
        let versions = vec![
            version(1, 1, "A", "100", "100"),
            version(2, 2, "A", "150", "150"),
        ];
        let rows = vec![allocation(1, 1, 1, "A", "2024-01-08")];

        let report = aggregate_report(january(), &versions, &HolidayMap::new(), &rows);
        assert_eq!(report.rows[0].total_allowance, dec("150"));
        assert_eq!(report.shifts.len(), 1);
        assert_eq!(report.shifts[0].weekday_allowance, dec("150"));
    }

    #[test]
    fn test_aggregate_counts_duplicates_once() {
        let versions = vec![
            version(1, 1, "A", "100", "100"),
            version(2, 2, "A", "100", "100"),
        ];
        let rows = vec![
            allocation(7, 1, 2, "A", "2024-01-08"),
            allocation(3, 1, 1, "A", "2024-01-08"),
            allocation(3, 1, 1, "A", "2024-01-08"),
        ];

        let report = aggregate_report(january(), &versions, &HolidayMap::new(), &rows);
        assert_eq!(report.rows[0].total_allowance, dec("100"));
        assert_eq!(report.rows[0].total_shift_count(), 1);
    }

    #[test]
    fn test_dedup_keeps_lowest_project_row() {
        let rows = vec![
            allocation(9, 1, 5, "A", "2024-01-08"),
            allocation(4, 1, 2, "A", "2024-01-08"),
            allocation(5, 1, 2, "B", "2024-01-08"),
        ];
        let unique = dedup_allocations(&rows);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].allocation_id, 4);
        assert_eq!(unique[1].allocation_id, 5);
    }

    #[test]
    fn test_detailed_report_summary_and_order() {
        let versions = vec![version(1, 1, "MORNING", "50", "80")];
        let rows = vec![
            allocation(3, 1, 1, "MORNING", "2024-01-26"), // Friday holiday
            allocation(1, 1, 1, "MORNING", "2024-01-08"), // Monday
            allocation(2, 1, 1, "MORNING", "2024-01-06"), // Saturday
        ];

        let report = detailed_report(
            january(),
            &versions,
            &holiday_on("2024-01-26"),
            &rows,
            None,
        );

        assert_eq!(report.summary.weekday_count, 1);
        assert_eq!(report.summary.weekend_count, 1);
        assert_eq!(report.summary.holiday_count, 1);
        assert_eq!(report.summary.total_allowance, dec("210"));

        let dates: Vec<NaiveDate> = report.daily.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![
                make_date("2024-01-06"),
                make_date("2024-01-08"),
                make_date("2024-01-26")
            ]
        );
        assert_eq!(report.daily[0].category, DayCategory::Weekend);
        assert_eq!(report.daily[2].category, DayCategory::Holiday);
    }

    #[test]
    fn test_detailed_report_ties_keep_dedup_order() {
        let versions = vec![version(1, 1, "A", "10", "10"), version(2, 2, "A", "10", "10")];
        let rows = vec![
            allocation(1, 2, 2, "A", "2024-01-08"),
            allocation(2, 1, 1, "A", "2024-01-08"),
        ];

        let report = detailed_report(january(), &versions, &HolidayMap::new(), &rows, None);
        let projects: Vec<i64> = report.daily.iter().map(|d| d.project_id).collect();
        assert_eq!(projects, vec![1, 2]);
    }
}
