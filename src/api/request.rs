//! Request types for the roster API.
//!
//! Query strings and JSON bodies accepted by the handlers, with conversions
//! into the domain inputs the service expects.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{RosterError, RosterResult};
use crate::models::{AllocationBatch, DateRange, ShiftDefinition};
use crate::service::DetailedReportQuery;

/// `?from_date=..&to_date=..`
#[derive(Debug, Clone, Deserialize)]
pub struct RangeQuery {
    /// First day (inclusive).
    pub from_date: NaiveDate,
    /// Last day (inclusive).
    pub to_date: NaiveDate,
}

impl RangeQuery {
    /// The validated range.
    pub fn range(&self) -> RosterResult<DateRange> {
        DateRange::new(self.from_date, self.to_date)
    }
}

/// A date range scoped to one project.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRangeQuery {
    /// The project.
    pub project_id: i64,
    /// First day (inclusive).
    pub from_date: NaiveDate,
    /// Last day (inclusive).
    pub to_date: NaiveDate,
}

impl ProjectRangeQuery {
    /// The validated range.
    pub fn range(&self) -> RosterResult<DateRange> {
        DateRange::new(self.from_date, self.to_date)
    }
}

/// A date range over a comma-separated list of projects.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectsRangeQuery {
    /// Comma-separated project ids, e.g. `1,2,3`.
    pub project_ids: String,
    /// First day (inclusive).
    pub from_date: NaiveDate,
    /// Last day (inclusive).
    pub to_date: NaiveDate,
    /// Restricts allocation listings to one employee.
    #[serde(default)]
    pub emp_id: Option<i64>,
}

impl ProjectsRangeQuery {
    /// The validated range.
    pub fn range(&self) -> RosterResult<DateRange> {
        DateRange::new(self.from_date, self.to_date)
    }

    /// The parsed project ids.
    pub fn project_ids(&self) -> RosterResult<Vec<i64>> {
        parse_ids(&self.project_ids)
    }
}

/// `?date=..`
#[derive(Debug, Clone, Deserialize)]
pub struct DateQuery {
    /// The day of interest.
    pub date: NaiveDate,
}

/// `?project_id=..`, where absent or `0` means company-wide.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionalProjectQuery {
    /// The project, if any.
    #[serde(default)]
    pub project_id: Option<i64>,
}

/// Holiday map filters.
#[derive(Debug, Clone, Deserialize)]
pub struct HolidayMapQuery {
    /// The project whose holidays take precedence; absent for company-wide.
    #[serde(default)]
    pub project_id: Option<i64>,
    /// First day (inclusive).
    pub from_date: NaiveDate,
    /// Last day (inclusive).
    pub to_date: NaiveDate,
}

impl HolidayMapQuery {
    /// The validated range.
    pub fn range(&self) -> RosterResult<DateRange> {
        DateRange::new(self.from_date, self.to_date)
    }

    /// The project with `0` folded into `None`.
    pub fn project(&self) -> Option<i64> {
        self.project_id.filter(|id| *id != 0)
    }
}

/// Available-employee lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailableEmployeesQuery {
    /// The project.
    pub project_id: i64,
    /// The shift code to fill.
    pub shift_code: String,
    /// The day to fill.
    pub shift_date: NaiveDate,
}

/// Detailed report filters.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailedQuery {
    /// First day (inclusive).
    pub from_date: NaiveDate,
    /// Last day (inclusive).
    pub to_date: NaiveDate,
    /// Restricts the report to one employee.
    #[serde(default)]
    pub emp_id: Option<i64>,
    /// Restricts the report to one project.
    #[serde(default)]
    pub project_id: Option<i64>,
}

impl DetailedQuery {
    /// The service-level query.
    pub fn to_query(&self) -> RosterResult<DetailedReportQuery> {
        Ok(DetailedReportQuery {
            range: DateRange::new(self.from_date, self.to_date)?,
            emp_id: self.emp_id,
            project_id: self.project_id.filter(|id| *id != 0),
        })
    }
}

/// Body of `POST /shifts/apply-batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyBatchRequest {
    /// The project every change applies to.
    pub project_id: i64,
    /// The changes.
    #[serde(flatten)]
    pub batch: AllocationBatch,
}

/// Body of `PUT /projects/{id}/shifts/{code}`; the code comes from the path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftVersionRequest {
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
    /// First day the new version applies to.
    pub effective_from: NaiveDate,
}

impl ShiftVersionRequest {
    /// The definition for `shift_code`.
    pub fn into_definition(self, shift_code: &str) -> ShiftDefinition {
        ShiftDefinition {
            shift_code: shift_code.to_string(),
            shift_name: self.shift_name,
            start_time: self.start_time,
            end_time: self.end_time,
            weekday_allowance: self.weekday_allowance,
            weekend_allowance: self.weekend_allowance,
            effective_from: self.effective_from,
        }
    }
}

/// Body of `POST /assignments/projects/{id}/employees`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignEmployeeRequest {
    /// The employee to add.
    pub emp_id: i64,
}

fn parse_ids(raw: &str) -> RosterResult<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| RosterError::validation(format!("Invalid project id: '{}'", part)))
        })
        .collect()
}
