//! Allocation ledger and project membership operations.

use chrono::NaiveDate;
use tracing::debug;

use super::RosterService;
use crate::calculation::weekly_view;
use crate::error::{RosterError, RosterResult};
use crate::models::{
    AllocationBatch, AllocationRow, BatchAck, CallerIdentity, DateRange, EmployeeSummary,
    WeeklyDay,
};

impl RosterService {
    /// Approved allocations of the given projects, optionally for one
    /// employee.
    pub async fn approved_allocations(
        &self,
        caller: &CallerIdentity,
        project_ids: &[i64],
        range: &DateRange,
        emp_id: Option<i64>,
    ) -> RosterResult<Vec<AllocationRow>> {
        for project_id in project_ids {
            self.authorize_lead_project(caller, *project_id).await?;
        }
        self.store.approved_allocations(project_ids, range, emp_id).await
    }

    /// Applies a batch of removals, additions and approvals to a project.
    pub async fn apply_batch(
        &self,
        caller: &CallerIdentity,
        project_id: i64,
        batch: &AllocationBatch,
    ) -> RosterResult<BatchAck> {
        let (lead_id, _) = self.authorize_lead_project(caller, project_id).await?;
        if let Some(blank) = batch.add.iter().find(|draft| draft.shift_code.trim().is_empty()) {
            return Err(RosterError::validation(format!(
                "shift_code must not be empty (emp_id {})",
                blank.emp_id
            )));
        }
        self.store.apply_batch(project_id, lead_id, batch).await
    }

    /// A project's allocations over a range, grouped by date and shift code.
    pub async fn weekly_view(
        &self,
        caller: &CallerIdentity,
        project_id: i64,
        range: &DateRange,
    ) -> RosterResult<Vec<WeeklyDay>> {
        self.authorize_project(caller, project_id).await?;
        let details = self.store.allocation_details(project_id, range).await?;
        let holidays = self.load_holiday_map(Some(project_id), range).await?;
        let days = weekly_view(&details, &holidays);
        debug!(project_id, allocations = details.len(), days = days.len(), "Built weekly view");
        Ok(days)
    }

    /// Project employees not yet allocated to a shift code on a date.
    pub async fn available_employees(
        &self,
        caller: &CallerIdentity,
        project_id: i64,
        shift_code: &str,
        date: NaiveDate,
    ) -> RosterResult<Vec<EmployeeSummary>> {
        self.authorize_lead_project(caller, project_id).await?;
        self.store.available_employees(project_id, shift_code, date).await
    }

    /// Employees of a project.
    pub async fn project_employees(
        &self,
        caller: &CallerIdentity,
        project_id: i64,
    ) -> RosterResult<Vec<EmployeeSummary>> {
        self.authorize_lead_project(caller, project_id).await?;
        self.store.project_employees(project_id).await
    }

    /// Adds an employee to a project.
    pub async fn assign_employee(
        &self,
        caller: &CallerIdentity,
        project_id: i64,
        emp_id: i64,
    ) -> RosterResult<()> {
        self.authorize_lead_project(caller, project_id).await?;
        self.store.assign_employee(project_id, emp_id).await
    }

    /// Removes an employee from a project.
    pub async fn remove_employee(
        &self,
        caller: &CallerIdentity,
        project_id: i64,
        emp_id: i64,
    ) -> RosterResult<()> {
        self.authorize_lead_project(caller, project_id).await?;
        self.store.remove_employee(project_id, emp_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::seeded;
    use super::*;
    use crate::models::{AllocationDraft, ApprovalChange};

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_employee_cannot_apply_batch() {
        let s = seeded().await;
        let result = s
            .service
            .apply_batch(&s.employee, s.apollo, &AllocationBatch::default())
            .await;
        assert!(matches!(result, Err(RosterError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_weekly_view_for_member_employee() {
        let s = seeded().await;
        let date = make_date("2024-01-08");
        s.service
            .apply_batch(
                &s.lead,
                s.apollo,
                &AllocationBatch {
                    add: vec![AllocationDraft {
                        emp_id: 1,
                        shift_code: "MORNING".to_string(),
                        shift_date: date,
                    }],
                    approvals: vec![ApprovalChange { date, is_approved: true }],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let days = s
            .service
            .weekly_view(&s.employee, s.apollo, &DateRange::single(date))
            .await
            .unwrap();
        assert_eq!(days.len(), 1);
        assert!(days[0].is_approved);
        assert_eq!(days[0].approved_by.as_deref(), Some("Ravi Kumar"));
    }

    #[tokio::test]
    async fn test_available_employees_excludes_allocated() {
        let s = seeded().await;
        let date = make_date("2024-01-08");
        let before = s
            .service
            .available_employees(&s.lead, s.apollo, "MORNING", date)
            .await
            .unwrap();
        assert_eq!(before.len(), 1);

        s.service
            .apply_batch(
                &s.lead,
                s.apollo,
                &AllocationBatch {
                    add: vec![AllocationDraft {
                        emp_id: 1,
                        shift_code: "MORNING".to_string(),
                        shift_date: date,
                    }],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let after = s
            .service
            .available_employees(&s.lead, s.apollo, "MORNING", date)
            .await
            .unwrap();
        assert!(after.is_empty());
        let other_code = s
            .service
            .available_employees(&s.lead, s.apollo, "NIGHT", date)
            .await
            .unwrap();
        assert_eq!(other_code.len(), 1);
    }

    #[tokio::test]
    async fn test_assignment_round_trip() {
        let s = seeded().await;
        let duplicate = s.service.assign_employee(&s.admin, s.apollo, 1).await;
        assert!(matches!(duplicate, Err(RosterError::Conflict { .. })));

        s.service.remove_employee(&s.admin, s.apollo, 1).await.unwrap();
        let missing = s.service.remove_employee(&s.admin, s.apollo, 1).await;
        assert!(matches!(missing, Err(RosterError::NotFound { .. })));
        assert!(s.service.project_employees(&s.admin, s.apollo).await.unwrap().is_empty());
    }
}
