//! Shift version and holiday operations.

use chrono::NaiveDate;
use tracing::debug;

use super::{RosterService, require_lead};
use crate::calculation::{HolidayMap, build_holiday_map};
use crate::error::{RosterError, RosterResult};
use crate::models::{
    CallerIdentity, DateRange, Holiday, HolidayDraft, ShiftDefinition, ShiftVersion,
};

impl RosterService {
    /// Active versions of the given projects overlapping `range`.
    pub async fn active_shifts(
        &self,
        caller: &CallerIdentity,
        project_ids: &[i64],
        range: &DateRange,
    ) -> RosterResult<Vec<ShiftVersion>> {
        for project_id in project_ids {
            self.authorize_project(caller, *project_id).await?;
        }
        self.store.active_shifts(project_ids, range).await
    }

    /// The version of a shift code in force on a date.
    pub async fn resolve_shift(
        &self,
        caller: &CallerIdentity,
        project_id: i64,
        shift_code: &str,
        date: NaiveDate,
    ) -> RosterResult<ShiftVersion> {
        self.authorize_project(caller, project_id).await?;
        self.store.resolve_shift(project_id, shift_code, date).await
    }

    /// The shifts of a project in force on a date.
    pub async fn shifts_on(
        &self,
        caller: &CallerIdentity,
        project_id: i64,
        date: NaiveDate,
    ) -> RosterResult<Vec<ShiftVersion>> {
        self.authorize_project(caller, project_id).await?;
        self.store.shifts_on(project_id, date).await
    }

    /// Every version of every shift code of a project.
    pub async fn shift_history(
        &self,
        caller: &CallerIdentity,
        project_id: i64,
    ) -> RosterResult<Vec<ShiftVersion>> {
        self.authorize_project(caller, project_id).await?;
        self.store.shift_history(project_id).await
    }

    /// Creates a new shift code in a project.
    pub async fn create_shift(
        &self,
        caller: &CallerIdentity,
        project_id: i64,
        definition: &ShiftDefinition,
    ) -> RosterResult<ShiftVersion> {
        self.authorize_lead_project(caller, project_id).await?;
        self.store.create_shift(project_id, definition).await
    }

    /// Replaces the current version of a shift code from a new effective date.
    pub async fn version_shift(
        &self,
        caller: &CallerIdentity,
        project_id: i64,
        shift_code: &str,
        definition: &ShiftDefinition,
    ) -> RosterResult<ShiftVersion> {
        self.authorize_lead_project(caller, project_id).await?;
        self.store.version_shift(project_id, shift_code, definition).await
    }

    /// Retires one version of a shift.
    pub async fn deactivate_shift_version(
        &self,
        caller: &CallerIdentity,
        project_id: i64,
        version_id: i64,
    ) -> RosterResult<()> {
        self.authorize_lead_project(caller, project_id).await?;
        self.store.deactivate_shift_version(project_id, version_id).await
    }

    /// The holiday map of a project (or company-wide only) over a range.
    pub async fn holiday_map(
        &self,
        caller: &CallerIdentity,
        project_id: Option<i64>,
        range: &DateRange,
    ) -> RosterResult<HolidayMap> {
        if let Some(project_id) = project_id {
            self.authorize_project(caller, project_id).await?;
        }
        self.load_holiday_map(project_id, range).await
    }

    pub(super) async fn load_holiday_map(
        &self,
        project_id: Option<i64>,
        range: &DateRange,
    ) -> RosterResult<HolidayMap> {
        let holidays = self.store.holidays_between(project_id, range).await?;
        let map = build_holiday_map(&holidays, project_id, range);
        debug!(?project_id, rows = holidays.len(), dates = map.len(), "Built holiday map");
        Ok(map)
    }

    /// Holidays visible to a project, or company-wide holidays only.
    pub async fn list_holidays(
        &self,
        caller: &CallerIdentity,
        project_id: Option<i64>,
    ) -> RosterResult<Vec<Holiday>> {
        require_lead(caller)?;
        let project_id = project_id.filter(|id| *id != 0);
        if let Some(project_id) = project_id {
            self.authorize_project(caller, project_id).await?;
        }
        self.store.list_holidays(project_id).await
    }

    /// Creates or renames a holiday.
    pub async fn upsert_holiday(
        &self,
        caller: &CallerIdentity,
        draft: &HolidayDraft,
    ) -> RosterResult<Holiday> {
        require_lead(caller)?;
        if let Some(project_id) = draft.normalized_project() {
            self.authorize_project(caller, project_id).await?;
        }
        self.store.upsert_holiday(draft).await
    }

    /// Deletes a holiday.
    pub async fn delete_holiday(&self, caller: &CallerIdentity, holiday_id: i64) -> RosterResult<()> {
        require_lead(caller)?;
        let holiday = self
            .store
            .find_holiday(holiday_id)
            .await?
            .ok_or_else(|| RosterError::not_found("Holiday", holiday_id))?;
        if let Some(project_id) = holiday.project_id {
            self.authorize_project(caller, project_id).await?;
        }
        self.store.delete_holiday(holiday_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::seeded;
    use super::*;
    use chrono::NaiveTime;
    use rust_decimal::Decimal;

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn definition(code: &str, from: &str) -> ShiftDefinition {
        ShiftDefinition {
            shift_code: code.to_string(),
            shift_name: code.to_string(),
            start_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            weekday_allowance: Decimal::new(50, 0),
            weekend_allowance: Decimal::new(80, 0),
            effective_from: make_date(from),
        }
    }

    #[tokio::test]
    async fn test_employee_cannot_create_shift() {
        let s = seeded().await;
        let result = s
            .service
            .create_shift(&s.employee, s.apollo, &definition("MORNING", "2024-01-01"))
            .await;
        assert!(matches!(result, Err(RosterError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_employee_can_read_project_shifts() {
        let s = seeded().await;
        s.service
            .create_shift(&s.lead, s.apollo, &definition("MORNING", "2024-01-01"))
            .await
            .unwrap();
        let shifts = s
            .service
            .shifts_on(&s.employee, s.apollo, make_date("2024-02-01"))
            .await
            .unwrap();
        assert_eq!(shifts.len(), 1);
    }

    #[tokio::test]
    async fn test_project_holiday_needs_access() {
        let s = seeded().await;
        let draft = HolidayDraft {
            project_id: Some(s.borealis),
            holiday_date: make_date("2024-03-01"),
            holiday_name: "Borealis Day".to_string(),
            spl_allowance: Decimal::ZERO,
        };
        let result = s.service.upsert_holiday(&s.lead, &draft).await;
        assert!(matches!(result, Err(RosterError::Forbidden { .. })));

        let saved = s.service.upsert_holiday(&s.admin, &draft).await.unwrap();
        let result = s.service.delete_holiday(&s.lead, saved.holiday_id).await;
        assert!(matches!(result, Err(RosterError::Forbidden { .. })));
        s.service.delete_holiday(&s.admin, saved.holiday_id).await.unwrap();
    }
}
