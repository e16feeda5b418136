//! Allowance reports.

use tracing::debug;

use super::RosterService;
use crate::calculation;
use crate::error::{RosterError, RosterResult};
use crate::models::{
    AllowanceReport, CallerIdentity, DateRange, DetailedReport, EmployeeProjects, ReportEmployee,
};

/// Filters of a detailed report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailedReportQuery {
    /// The reported window.
    pub range: DateRange,
    /// Restricts the report to one employee.
    pub emp_id: Option<i64>,
    /// Restricts the report to one project of the caller's scope.
    pub project_id: Option<i64>,
}

impl RosterService {
    /// Per-employee allowance totals for one project.
    pub async fn single_project_report(
        &self,
        caller: &CallerIdentity,
        project_id: i64,
        range: DateRange,
    ) -> RosterResult<AllowanceReport> {
        self.authorize_lead_project(caller, project_id).await?;

        let projects = [project_id];
        let versions = self.store.active_shifts(&projects, &range).await?;
        let holidays = self.load_holiday_map(Some(project_id), &range).await?;
        let rows = self.store.approved_allocations(&projects, &range, None).await?;

        let report = calculation::single_project_report(range, &versions, &holidays, &rows);
        debug!(
            project_id,
            allocations = rows.len(),
            employees = report.rows.len(),
            "Built single-project report"
        );
        Ok(report)
    }

    /// Per-employee allowance totals across every project in the caller's
    /// scope, with duplicates collapsed and most favorable rates applied.
    pub async fn aggregate_report(
        &self,
        caller: &CallerIdentity,
        range: DateRange,
    ) -> RosterResult<AllowanceReport> {
        let scope = self.report_scope(caller).await?;

        let versions = self.store.active_shifts(&scope, &range).await?;
        let holidays = self.load_holiday_map(None, &range).await?;
        let rows = self.store.approved_allocations(&scope, &range, None).await?;

        let report = calculation::aggregate_report(range, &versions, &holidays, &rows);
        debug!(
            projects = scope.len(),
            allocations = rows.len(),
            employees = report.rows.len(),
            "Built aggregate report"
        );
        Ok(report)
    }

    /// Day-by-day allowances across the caller's scope.
    ///
    /// # Errors
    ///
    /// [`RosterError::Forbidden`] when `project_id` is outside the caller's
    /// scope and [`RosterError::NotFound`] when `emp_id` names no employee.
    pub async fn detailed_report(
        &self,
        caller: &CallerIdentity,
        query: DetailedReportQuery,
    ) -> RosterResult<DetailedReport> {
        let projects = self.narrow_scope(caller, query.project_id).await?;

        let employee = match query.emp_id {
            Some(emp_id) => {
                let employee = self
                    .store
                    .find_employee(emp_id)
                    .await?
                    .ok_or_else(|| RosterError::not_found("Employee", emp_id))?;
                Some(ReportEmployee {
                    emp_id: employee.emp_id,
                    emp_name: employee.emp_name,
                    emp_lname: employee.emp_lname,
                })
            }
            None => None,
        };

        let range = query.range;
        let versions = self.store.active_shifts(&projects, &range).await?;
        let holidays = self.load_holiday_map(query.project_id, &range).await?;
        let rows = self
            .store
            .approved_allocations(&projects, &range, query.emp_id)
            .await?;

        let report = calculation::detailed_report(range, &versions, &holidays, &rows, employee);
        debug!(
            projects = projects.len(),
            emp_id = ?query.emp_id,
            records = report.daily.len(),
            "Built detailed report"
        );
        Ok(report)
    }

    /// Employees of the caller's report scope with their memberships, for
    /// choosing a detailed report's employee filter.
    ///
    /// # Errors
    ///
    /// [`RosterError::Forbidden`] for employees and when `project_id` is
    /// outside the caller's scope.
    pub async fn report_employees(
        &self,
        caller: &CallerIdentity,
        project_id: Option<i64>,
    ) -> RosterResult<Vec<EmployeeProjects>> {
        let projects = self.narrow_scope(caller, project_id).await?;
        self.store.report_employees(&projects).await
    }

    /// The caller's report scope, or just `project_id` when it is part of it.
    async fn narrow_scope(
        &self,
        caller: &CallerIdentity,
        project_id: Option<i64>,
    ) -> RosterResult<Vec<i64>> {
        let scope = self.report_scope(caller).await?;
        match project_id.filter(|id| *id != 0) {
            Some(project_id) => {
                self.authorize_project(caller, project_id).await?;
                if !scope.contains(&project_id) {
                    return Err(RosterError::forbidden("Not authorized for this project"));
                }
                Ok(vec![project_id])
            }
            None => Ok(scope),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{Seeded, seeded};
    use super::*;
    use crate::models::{
        AllocationBatch, AllocationDraft, ApprovalChange, HolidayDraft, ShiftDefinition,
    };
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn morning(weekday: &str, weekend: &str) -> ShiftDefinition {
        ShiftDefinition {
            shift_code: "MORNING".to_string(),
            shift_name: "Morning".to_string(),
            start_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            weekday_allowance: dec(weekday),
            weekend_allowance: dec(weekend),
            effective_from: make_date("2024-01-01"),
        }
    }

    async fn allocate_approved(s: &Seeded, project_id: i64, emp_id: i64, dates: &[&str]) {
        let add = dates
            .iter()
            .map(|d| AllocationDraft {
                emp_id,
                shift_code: "MORNING".to_string(),
                shift_date: make_date(d),
            })
            .collect();
        let approvals = dates
            .iter()
            .map(|d| ApprovalChange {
                date: make_date(d),
                is_approved: true,
            })
            .collect();
        s.service
            .apply_batch(
                &s.admin,
                project_id,
                &AllocationBatch {
                    add,
                    approvals,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    fn january() -> DateRange {
        DateRange::new(make_date("2024-01-01"), make_date("2024-01-31")).unwrap()
    }

    #[tokio::test]
    async fn test_weekend_and_weekday_totals() {
        let s = seeded().await;
        s.service
            .create_shift(&s.lead, s.apollo, &morning("50", "80"))
            .await
            .unwrap();
        allocate_approved(&s, s.apollo, 1, &["2024-01-06", "2024-01-08"]).await;

        let report = s
            .service
            .single_project_report(&s.lead, s.apollo, january())
            .await
            .unwrap();
        let row = &report.rows[0];
        assert_eq!(row.weekend_shift_count, 1);
        assert_eq!(row.holiday_shift_count, 0);
        assert_eq!(row.shift_counts.get("MORNING"), Some(&1));
        assert_eq!(row.total_allowance, dec("130"));
    }

    #[tokio::test]
    async fn test_project_holiday_counts_only_in_project_report() {
        let s = seeded().await;
        s.service
            .create_shift(&s.lead, s.apollo, &morning("50", "80"))
            .await
            .unwrap();
        s.service
            .upsert_holiday(
                &s.lead,
                &HolidayDraft {
                    project_id: Some(s.apollo),
                    holiday_date: make_date("2024-01-08"),
                    holiday_name: "Apollo Day".to_string(),
                    spl_allowance: dec("500"),
                },
            )
            .await
            .unwrap();
        allocate_approved(&s, s.apollo, 1, &["2024-01-08"]).await;

        let single = s
            .service
            .single_project_report(&s.lead, s.apollo, january())
            .await
            .unwrap();
        assert_eq!(single.rows[0].holiday_shift_count, 1);
        assert_eq!(single.rows[0].total_allowance, dec("80"));

        let aggregate = s.service.aggregate_report(&s.lead, january()).await.unwrap();
        assert_eq!(aggregate.rows[0].holiday_shift_count, 0);
        assert_eq!(aggregate.rows[0].total_allowance, dec("50"));
    }

    #[tokio::test]
    async fn test_aggregate_uses_most_favorable_rate_and_dedups() {
        let s = seeded().await;
        s.service
            .create_shift(&s.admin, s.apollo, &morning("100", "120"))
            .await
            .unwrap();
        s.service
            .create_shift(&s.admin, s.borealis, &morning("150", "110"))
            .await
            .unwrap();
        s.service.assign_employee(&s.admin, s.borealis, 1).await.unwrap();
        allocate_approved(&s, s.apollo, 1, &["2024-01-08"]).await;
        allocate_approved(&s, s.borealis, 1, &["2024-01-08"]).await;

        let report = s.service.aggregate_report(&s.admin, january()).await.unwrap();
        assert_eq!(report.shifts.len(), 1);
        assert_eq!(report.shifts[0].weekday_allowance, dec("150"));
        assert_eq!(report.rows[0].shift_counts.get("MORNING"), Some(&1));
        assert_eq!(report.rows[0].total_allowance, dec("150"));

        let detailed = s
            .service
            .detailed_report(
                &s.admin,
                DetailedReportQuery {
                    range: january(),
                    emp_id: Some(1),
                    project_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(detailed.daily.len(), 1);
        assert_eq!(detailed.daily[0].project_id, s.apollo);
        assert_eq!(detailed.summary.total_allowance, dec("150"));
        assert_eq!(detailed.employee.unwrap().emp_name, "Asha");
    }

    #[tokio::test]
    async fn test_detailed_report_outside_scope_is_forbidden() {
        let s = seeded().await;
        let result = s
            .service
            .detailed_report(
                &s.lead,
                DetailedReportQuery {
                    range: january(),
                    emp_id: None,
                    project_id: Some(s.borealis),
                },
            )
            .await;
        assert!(matches!(result, Err(RosterError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_unresolvable_allocation_is_skipped() {
        let s = seeded().await;
        s.service
            .create_shift(&s.lead, s.apollo, &morning("50", "80"))
            .await
            .unwrap();
        allocate_approved(&s, s.apollo, 1, &["2023-12-29", "2024-01-08"]).await;

        let range = DateRange::new(make_date("2023-12-01"), make_date("2024-01-31")).unwrap();
        let report = s
            .service
            .single_project_report(&s.lead, s.apollo, range)
            .await
            .unwrap();
        assert_eq!(report.rows[0].total_allowance, dec("50"));
    }

    #[tokio::test]
    async fn test_report_employees_follow_scope() {
        let s = seeded().await;
        s.service.assign_employee(&s.admin, s.borealis, 1).await.unwrap();

        // The lead only sees the Apollo membership.
        let visible = s.service.report_employees(&s.lead, None).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].projects.len(), 1);
        assert_eq!(visible[0].projects[0].project_id, s.apollo);

        let everything = s.service.report_employees(&s.admin, None).await.unwrap();
        assert_eq!(everything[0].projects.len(), 2);

        let filtered = s
            .service
            .report_employees(&s.admin, Some(s.borealis))
            .await
            .unwrap();
        assert_eq!(filtered[0].projects[0].project_id, s.borealis);

        let outside = s.service.report_employees(&s.lead, Some(s.borealis)).await;
        assert!(matches!(outside, Err(RosterError::Forbidden { .. })));

        let employee = s.service.report_employees(&s.employee, None).await;
        assert!(matches!(employee, Err(RosterError::Forbidden { .. })));
    }
}
