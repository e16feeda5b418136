//! Allowance report models.
//!
//! This module contains the outputs of the allowance aggregator: the
//! per-employee summary report used for single-project and aggregate views,
//! and the detailed report with one record per allocated day.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{DateRange, ShiftCatalogEntry};
use crate::calculation::DayCategory;

/// Allowance totals for one employee.
///
/// # Example
///
/// ```
/// use shift_roster::models::EmployeeAllowanceRow;
/// use rust_decimal::Decimal;
///
/// let mut row = EmployeeAllowanceRow::new(1, "Asha", "Rao");
/// row.weekend_shift_count = 1;
/// row.total_allowance = Decimal::new(80, 0);
/// assert_eq!(row.total_shift_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeAllowanceRow {
    /// Employee identifier.
    pub emp_id: i64,
    /// First name.
    pub emp_name: String,
    /// Last name.
    pub emp_lname: String,
    /// Weekday allocations counted per shift code.
    pub shift_counts: BTreeMap<String, u32>,
    /// Saturday/Sunday allocations.
    pub weekend_shift_count: u32,
    /// Weekday allocations falling on a holiday.
    pub holiday_shift_count: u32,
    /// Sum of every counted allocation's rate.
    pub total_allowance: Decimal,
}

impl EmployeeAllowanceRow {
    /// An empty row for an employee.
    pub fn new(emp_id: i64, emp_name: impl Into<String>, emp_lname: impl Into<String>) -> Self {
        Self {
            emp_id,
            emp_name: emp_name.into(),
            emp_lname: emp_lname.into(),
            shift_counts: BTreeMap::new(),
            weekend_shift_count: 0,
            holiday_shift_count: 0,
            total_allowance: Decimal::ZERO,
        }
    }

    /// Every counted allocation regardless of day category.
    pub fn total_shift_count(&self) -> u32 {
        self.shift_counts.values().sum::<u32>() + self.weekend_shift_count + self.holiday_shift_count
    }
}

/// Per-employee allowance report for one project or for all visible projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowanceReport {
    /// The reported window.
    pub range: DateRange,
    /// Shift legend for the window.
    pub shifts: Vec<ShiftCatalogEntry>,
    /// One row per employee with at least one counted allocation, by emp_id.
    pub rows: Vec<EmployeeAllowanceRow>,
}

impl AllowanceReport {
    /// Sum of every row's total.
    pub fn total_allowance(&self) -> Decimal {
        self.rows.iter().map(|row| row.total_allowance).sum()
    }
}

/// One priced allocation in a detailed report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAllowance {
    /// The date worked.
    pub date: NaiveDate,
    /// The project the counted allocation came from.
    pub project_id: i64,
    /// Project display name.
    pub project: String,
    /// The employee.
    pub emp_id: i64,
    /// Employee first name.
    pub employee: String,
    /// The shift code worked.
    pub shift_code: String,
    /// How the day was classified.
    #[serde(rename = "type")]
    pub category: DayCategory,
    /// The rate applied.
    pub allowance: Decimal,
}

/// Scalar totals of a detailed report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Allocations priced at the weekday rate.
    pub weekday_count: u32,
    /// Allocations on a Saturday or Sunday.
    pub weekend_count: u32,
    /// Weekday allocations on a holiday.
    pub holiday_count: u32,
    /// Sum of all applied rates.
    pub total_allowance: Decimal,
}

/// The employee a detailed report is filtered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEmployee {
    /// Employee identifier.
    pub emp_id: i64,
    /// First name.
    pub emp_name: String,
    /// Last name.
    pub emp_lname: String,
}

/// Day-by-day allowance report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedReport {
    /// The reported window.
    pub range: DateRange,
    /// Present when the report is filtered to one employee.
    pub employee: Option<ReportEmployee>,
    /// Shift legend for the window.
    pub shifts: Vec<ShiftCatalogEntry>,
    /// Counts and total.
    pub summary: ReportSummary,
    /// Priced allocations ordered by date (stable for ties).
    pub daily: Vec<DailyAllowance>,
}
