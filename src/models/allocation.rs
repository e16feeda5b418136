//! Allocation ledger models.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::HolidayInfo;

/// One employee allocated to one shift code on one date in one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Storage identifier.
    pub allocation_id: i64,
    /// The allocated employee.
    pub emp_id: i64,
    /// The project the allocation belongs to.
    pub project_id: i64,
    /// The shift code worked.
    pub shift_code: String,
    /// The date worked.
    pub shift_date: NaiveDate,
    /// Whether a lead has approved the allocation.
    pub is_approved: bool,
    /// The approving lead, set only while approved.
    pub approved_by: Option<i64>,
    /// Last time the row was created or its approval changed.
    pub last_updated: NaiveDateTime,
}

/// An allocation joined with the names a report needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRow {
    /// Storage identifier of the allocation.
    pub allocation_id: i64,
    /// The allocated employee.
    pub emp_id: i64,
    /// Employee first name.
    pub emp_name: String,
    /// Employee last name.
    pub emp_lname: String,
    /// The project the allocation belongs to.
    pub project_id: i64,
    /// Project display name.
    pub project_name: String,
    /// The shift code worked.
    pub shift_code: String,
    /// The date worked.
    pub shift_date: NaiveDate,
}

/// A requested allocation inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationDraft {
    /// The employee to allocate.
    pub emp_id: i64,
    /// The shift code.
    pub shift_code: String,
    /// The date.
    pub shift_date: NaiveDate,
}

/// Approval state to apply to every allocation of a project on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalChange {
    /// The day being approved or un-approved.
    pub date: NaiveDate,
    /// The new approval state.
    pub is_approved: bool,
}

/// A unit of ledger changes applied atomically for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationBatch {
    /// Allocations to create; existing keys are skipped.
    #[serde(default)]
    pub add: Vec<AllocationDraft>,
    /// Allocation ids to delete (only those belonging to the project).
    #[serde(default)]
    pub remove: Vec<i64>,
    /// Per-day approval changes.
    #[serde(default)]
    pub approvals: Vec<ApprovalChange>,
}

impl AllocationBatch {
    /// Whether the batch contains no changes at all.
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty() && self.approvals.is_empty()
    }
}

/// Acknowledgement returned after a batch commits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAck {
    /// Rows deleted by `remove`.
    pub removed: u64,
    /// Rows created by `add`.
    pub added: u64,
    /// `add` items skipped because the allocation already existed.
    pub skipped: u64,
    /// Rows touched by `approvals`.
    pub approvals_updated: u64,
}

/// An allocation with the names and approval details the weekly view shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationDetail {
    /// Storage identifier.
    pub allocation_id: i64,
    /// The allocated employee.
    pub emp_id: i64,
    /// Employee first name.
    pub emp_name: String,
    /// Employee last name.
    pub emp_lname: String,
    /// The shift code worked.
    pub shift_code: String,
    /// The date worked.
    pub shift_date: NaiveDate,
    /// Approval state.
    pub is_approved: bool,
    /// Full name of the approving lead.
    pub approver_name: Option<String>,
    /// Last time the row changed.
    pub last_updated: NaiveDateTime,
}

/// One allocated employee inside a weekly view day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAssignment {
    /// The allocation to reference when removing it.
    pub allocation_id: i64,
    /// Employee identifier.
    pub emp_id: i64,
    /// First name.
    pub emp_name: String,
    /// Last name.
    pub emp_lname: String,
}

/// One date of a project's weekly allocation view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyDay {
    /// The date.
    pub date: NaiveDate,
    /// Allocations grouped by shift code.
    pub shifts: BTreeMap<String, Vec<WeeklyAssignment>>,
    /// True only when the day has allocations and all are approved.
    pub is_approved: bool,
    /// The lead who last approved an allocation of the day.
    pub approved_by: Option<String>,
    /// Latest change among the day's allocations.
    pub last_updated: Option<NaiveDateTime>,
    /// The holiday in force on the date.
    pub holiday: Option<HolidayInfo>,
}
