//! Core data models for the shift roster engine.
//!
//! This module contains all the domain models used throughout the engine.

mod allocation;
mod date_range;
mod directory;
mod holiday;
mod identity;
mod report;
mod shift_version;

pub use allocation::{
    Allocation, AllocationBatch, AllocationDetail, AllocationDraft, AllocationRow, ApprovalChange,
    BatchAck, WeeklyAssignment, WeeklyDay,
};
pub use date_range::DateRange;
pub use directory::{
    CallerContext, Employee, EmployeeProjects, EmployeeSummary, Project, ProjectLead, ProjectRef,
};
pub use holiday::{Holiday, HolidayDraft, HolidayInfo, HolidayScope};
pub use identity::{CallerIdentity, Role};
pub use report::{
    AllowanceReport, DailyAllowance, DetailedReport, EmployeeAllowanceRow, ReportEmployee,
    ReportSummary,
};
pub use shift_version::{ShiftCatalogEntry, ShiftDefinition, ShiftVersion};
