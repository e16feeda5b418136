//! Company-wide and project holidays (`project_holiday`).

use chrono::{NaiveDate, Utc};
use sqlx::FromRow;
use tracing::debug;

use super::{RosterStore, is_foreign_key_violation, parse_decimal};
use crate::error::{RosterError, RosterResult};
use crate::models::{DateRange, Holiday, HolidayDraft};

#[derive(FromRow)]
struct HolidayRow {
    holiday_id: i64,
    project_id: Option<i64>,
    holiday_date: NaiveDate,
    holiday_name: String,
    spl_allowance: String,
}

impl TryFrom<HolidayRow> for Holiday {
    type Error = RosterError;

    fn try_from(row: HolidayRow) -> RosterResult<Self> {
        Ok(Holiday {
            spl_allowance: parse_decimal(&row.spl_allowance, "spl_allowance")?,
            holiday_id: row.holiday_id,
            project_id: row.project_id,
            holiday_date: row.holiday_date,
            holiday_name: row.holiday_name,
        })
    }
}

fn into_holidays(rows: Vec<HolidayRow>) -> RosterResult<Vec<Holiday>> {
    rows.into_iter().map(Holiday::try_from).collect()
}

impl RosterStore {
    /// Holidays visible to a project inside `range`, ordered by date.
    ///
    /// With a project, both its own rows and company-wide rows are returned.
    /// Without one, only company-wide rows match since `project_id = NULL`
    /// never holds.
    pub async fn holidays_between(
        &self,
        project_id: Option<i64>,
        range: &DateRange,
    ) -> RosterResult<Vec<Holiday>> {
        let rows = sqlx::query_as::<_, HolidayRow>(
            "SELECT holiday_id, project_id, holiday_date, holiday_name, spl_allowance
             FROM project_holiday
             WHERE holiday_date BETWEEN ? AND ?
               AND (project_id IS NULL OR project_id = ?)
             ORDER BY holiday_date, project_id",
        )
        .bind(range.from)
        .bind(range.to)
        .bind(project_id)
        .fetch_all(self.pool())
        .await?;
        into_holidays(rows)
    }

    /// Every holiday visible to a project (or company-wide only), by date.
    pub async fn list_holidays(&self, project_id: Option<i64>) -> RosterResult<Vec<Holiday>> {
        let rows = sqlx::query_as::<_, HolidayRow>(
            "SELECT holiday_id, project_id, holiday_date, holiday_name, spl_allowance
             FROM project_holiday
             WHERE project_id IS NULL OR project_id = ?
             ORDER BY holiday_date, project_id",
        )
        .bind(project_id)
        .fetch_all(self.pool())
        .await?;
        into_holidays(rows)
    }

    /// Looks up one holiday.
    pub async fn find_holiday(&self, holiday_id: i64) -> RosterResult<Option<Holiday>> {
        let row = sqlx::query_as::<_, HolidayRow>(
            "SELECT holiday_id, project_id, holiday_date, holiday_name, spl_allowance
             FROM project_holiday WHERE holiday_id = ?",
        )
        .bind(holiday_id)
        .fetch_optional(self.pool())
        .await?;
        row.map(Holiday::try_from).transpose()
    }

    /// Updates the name and special allowance of the holiday on the draft's
    /// `(project, date)` or inserts a new one.
    pub async fn upsert_holiday(&self, draft: &HolidayDraft) -> RosterResult<Holiday> {
        let project_id = draft.normalized_project();
        if draft.holiday_name.trim().is_empty() {
            return Err(RosterError::validation("holiday_name must not be empty"));
        }
        let mut tx = self.pool().begin().await?;

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT holiday_id FROM project_holiday WHERE project_id IS ? AND holiday_date = ?",
        )
        .bind(project_id)
        .bind(draft.holiday_date)
        .fetch_optional(&mut *tx)
        .await?;

        let holiday_id = match existing {
            Some(holiday_id) => {
                sqlx::query(
                    "UPDATE project_holiday SET holiday_name = ?, spl_allowance = ?, updated_at = ?
                     WHERE holiday_id = ?",
                )
                .bind(&draft.holiday_name)
                .bind(draft.spl_allowance.to_string())
                .bind(Utc::now().naive_utc())
                .bind(holiday_id)
                .execute(&mut *tx)
                .await?;
                holiday_id
            }
            None => sqlx::query(
                "INSERT INTO project_holiday (project_id, holiday_date, holiday_name, spl_allowance)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(project_id)
            .bind(draft.holiday_date)
            .bind(&draft.holiday_name)
            .bind(draft.spl_allowance.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    RosterError::not_found("Project", project_id.unwrap_or_default())
                } else {
                    e.into()
                }
            })?
            .last_insert_rowid(),
        };

        tx.commit().await?;
        debug!(holiday_id, ?project_id, date = %draft.holiday_date, "Holiday saved");

        Ok(Holiday {
            holiday_id,
            project_id,
            holiday_date: draft.holiday_date,
            holiday_name: draft.holiday_name.clone(),
            spl_allowance: draft.spl_allowance,
        })
    }

    /// Deletes a holiday.
    pub async fn delete_holiday(&self, holiday_id: i64) -> RosterResult<()> {
        let affected = sqlx::query("DELETE FROM project_holiday WHERE holiday_id = ?")
            .bind(holiday_id)
            .execute(self.pool())
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(RosterError::not_found("Holiday", holiday_id));
        }
        debug!(holiday_id, "Holiday deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::build_holiday_map;
    use crate::models::HolidayScope;
    use rust_decimal::Decimal;

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn draft(project_id: Option<i64>, date: &str, name: &str) -> HolidayDraft {
        HolidayDraft {
            project_id,
            holiday_date: make_date(date),
            holiday_name: name.to_string(),
            spl_allowance: Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn test_project_holiday_wins_and_none_sees_company_only() {
        let store = RosterStore::in_memory().await.unwrap();
        let project = store.create_project("Apollo").await.unwrap();
        let p = project.project_id;

        store.upsert_holiday(&draft(None, "2024-01-26", "Republic Day")).await.unwrap();
        store.upsert_holiday(&draft(Some(p), "2024-01-26", "Apollo Offsite")).await.unwrap();
        store.upsert_holiday(&draft(Some(p), "2024-01-29", "Apollo Day")).await.unwrap();

        let range = DateRange::new(make_date("2024-01-01"), make_date("2024-01-31")).unwrap();

        let scoped = store.holidays_between(Some(p), &range).await.unwrap();
        let map = build_holiday_map(&scoped, Some(p), &range);
        let info = &map[&make_date("2024-01-26")];
        assert_eq!(info.holiday_name, "Apollo Offsite");
        assert_eq!(info.scope, HolidayScope::Project);
        assert_eq!(map.len(), 2);

        let company = store.holidays_between(None, &range).await.unwrap();
        assert_eq!(company.len(), 1);
        assert_eq!(company[0].holiday_name, "Republic Day");
    }

    #[tokio::test]
    async fn test_upsert_updates_existing_date() {
        let store = RosterStore::in_memory().await.unwrap();
        let first = store.upsert_holiday(&draft(None, "2024-08-15", "Independence")).await.unwrap();

        let mut renamed = draft(Some(0), "2024-08-15", "Independence Day");
        renamed.spl_allowance = Decimal::new(500, 0);
        let second = store.upsert_holiday(&renamed).await.unwrap();

        assert_eq!(first.holiday_id, second.holiday_id);
        let stored = store.find_holiday(first.holiday_id).await.unwrap().unwrap();
        assert_eq!(stored.holiday_name, "Independence Day");
        assert_eq!(stored.spl_allowance, Decimal::new(500, 0));
        assert_eq!(store.list_holidays(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_holiday_is_not_found() {
        let store = RosterStore::in_memory().await.unwrap();
        let result = store.delete_holiday(404).await;
        assert!(matches!(result, Err(RosterError::NotFound { .. })));
    }
}
