//! Holiday models.
//!
//! Holidays are either company-wide (`project_id == None`) or belong to one
//! project. A project holiday takes precedence over a company holiday on the
//! same date.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A stored holiday row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holiday {
    /// Storage identifier.
    pub holiday_id: i64,
    /// Owning project, or `None` for a company-wide holiday.
    pub project_id: Option<i64>,
    /// The holiday date.
    pub holiday_date: NaiveDate,
    /// Display name (e.g. "Republic Day").
    pub holiday_name: String,
    /// Special allowance recorded with the holiday.
    pub spl_allowance: Decimal,
}

impl Holiday {
    /// The scope implied by the project column.
    pub fn scope(&self) -> HolidayScope {
        match self.project_id {
            Some(_) => HolidayScope::Project,
            None => HolidayScope::Company,
        }
    }
}

/// Whether a holiday applies company-wide or to a single project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidayScope {
    /// Applies to every project.
    Company,
    /// Applies to one project only.
    Project,
}

/// The resolved holiday for one date in a holiday map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayInfo {
    /// Display name of the winning holiday.
    pub holiday_name: String,
    /// Scope of the winning holiday.
    pub scope: HolidayScope,
    /// Special allowance recorded with the winning holiday.
    pub spl_allowance: Decimal,
}

impl From<&Holiday> for HolidayInfo {
    fn from(holiday: &Holiday) -> Self {
        HolidayInfo {
            holiday_name: holiday.holiday_name.clone(),
            scope: holiday.scope(),
            spl_allowance: holiday.spl_allowance,
        }
    }
}

/// Input for creating or updating a holiday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayDraft {
    /// Owning project; `None` (or `0` on the wire) for company-wide.
    #[serde(default)]
    pub project_id: Option<i64>,
    /// The holiday date.
    pub holiday_date: NaiveDate,
    /// Display name.
    pub holiday_name: String,
    /// Special allowance, zero when omitted.
    #[serde(default)]
    pub spl_allowance: Decimal,
}

impl HolidayDraft {
    /// The owning project with the legacy `0` sentinel folded into `None`.
    pub fn normalized_project(&self) -> Option<i64> {
        self.project_id.filter(|id| *id != 0)
    }
}
