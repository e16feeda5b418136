//! Versioned shift definitions (`project_shift_master`).

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::debug;

use super::{RosterStore, is_foreign_key_violation, is_unique_violation, parse_decimal};
use crate::calculation;
use crate::error::{RosterError, RosterResult};
use crate::models::{DateRange, ShiftDefinition, ShiftVersion};

const SHIFT_COLUMNS: &str = "id, project_id, shift_code, shift_name, start_time, end_time, \
     weekday_allowance, weekend_allowance, effective_from, effective_to, is_active";

#[derive(FromRow)]
struct ShiftRow {
    id: i64,
    project_id: i64,
    shift_code: String,
    shift_name: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
    weekday_allowance: String,
    weekend_allowance: String,
    effective_from: NaiveDate,
    effective_to: Option<NaiveDate>,
    is_active: bool,
}

impl TryFrom<ShiftRow> for ShiftVersion {
    type Error = RosterError;

    fn try_from(row: ShiftRow) -> RosterResult<Self> {
        Ok(ShiftVersion {
            weekday_allowance: parse_decimal(&row.weekday_allowance, "weekday_allowance")?,
            weekend_allowance: parse_decimal(&row.weekend_allowance, "weekend_allowance")?,
            id: row.id,
            project_id: row.project_id,
            shift_code: row.shift_code,
            shift_name: row.shift_name,
            start_time: row.start_time,
            end_time: row.end_time,
            effective_from: row.effective_from,
            effective_to: row.effective_to,
            is_active: row.is_active,
        })
    }
}

fn into_versions(rows: Vec<ShiftRow>) -> RosterResult<Vec<ShiftVersion>> {
    rows.into_iter().map(ShiftVersion::try_from).collect()
}

impl RosterStore {
    /// Active versions of the given projects whose window overlaps `range`.
    pub async fn active_shifts(
        &self,
        project_ids: &[i64],
        range: &DateRange,
    ) -> RosterResult<Vec<ShiftVersion>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM project_shift_master WHERE project_id IN (", SHIFT_COLUMNS));
        let mut ids = query.separated(", ");
        for id in project_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
        query
            .push(" AND is_active = 1 AND effective_from <= ")
            .push_bind(range.to)
            .push(" AND (effective_to IS NULL OR effective_to >= ")
            .push_bind(range.from)
            .push(") ORDER BY project_id, shift_code, effective_from");

        let rows = query.build_query_as::<ShiftRow>().fetch_all(self.pool()).await?;
        let versions = into_versions(rows)?;
        debug!(
            projects = project_ids.len(),
            versions = versions.len(),
            "Loaded active shift versions"
        );
        Ok(versions)
    }

    /// Every version of one shift code in one project, active or not.
    pub async fn shift_versions_for(
        &self,
        project_id: i64,
        shift_code: &str,
    ) -> RosterResult<Vec<ShiftVersion>> {
        let rows = sqlx::query_as::<_, ShiftRow>(&format!(
            "SELECT {} FROM project_shift_master
             WHERE project_id = ? AND shift_code = ?
             ORDER BY effective_from",
            SHIFT_COLUMNS
        ))
        .bind(project_id)
        .bind(shift_code)
        .fetch_all(self.pool())
        .await?;
        into_versions(rows)
    }

    /// Resolves the version of a shift code in force on `date`.
    ///
    /// # Errors
    ///
    /// [`RosterError::ShiftNotResolved`] when no active version covers the date.
    pub async fn resolve_shift(
        &self,
        project_id: i64,
        shift_code: &str,
        date: NaiveDate,
    ) -> RosterResult<ShiftVersion> {
        let versions = self.shift_versions_for(project_id, shift_code).await?;
        calculation::resolve_shift(&versions, project_id, shift_code, date).cloned()
    }

    /// The versions of a project in force on `date`, ordered by shift code.
    ///
    /// Each code is resolved with [`calculation::resolve_shift`]; codes with
    /// no covering version are left out.
    pub async fn shifts_on(&self, project_id: i64, date: NaiveDate) -> RosterResult<Vec<ShiftVersion>> {
        let rows = sqlx::query_as::<_, ShiftRow>(&format!(
            "SELECT {} FROM project_shift_master
             WHERE project_id = ? AND is_active = 1
             ORDER BY shift_code, effective_from",
            SHIFT_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(self.pool())
        .await?;

        let versions = into_versions(rows)?;
        let codes: BTreeSet<&str> = versions.iter().map(|v| v.shift_code.as_str()).collect();
        Ok(codes
            .into_iter()
            .filter_map(|code| calculation::resolve_shift(&versions, project_id, code, date).ok())
            .cloned()
            .collect())
    }

    /// Every version of every shift code in a project, newest first per code.
    pub async fn shift_history(&self, project_id: i64) -> RosterResult<Vec<ShiftVersion>> {
        let rows = sqlx::query_as::<_, ShiftRow>(&format!(
            "SELECT {} FROM project_shift_master
             WHERE project_id = ?
             ORDER BY shift_code, effective_from DESC",
            SHIFT_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(self.pool())
        .await?;
        into_versions(rows)
    }

    /// Creates the first version of a shift code.
    ///
    /// # Errors
    ///
    /// [`RosterError::Conflict`] when an active version of the code is open
    /// or still in force on or after the new effective date.
    pub async fn create_shift(
        &self,
        project_id: i64,
        definition: &ShiftDefinition,
    ) -> RosterResult<ShiftVersion> {
        validate_definition(definition)?;
        let mut tx = self.pool().begin().await?;

        // Active windows of one code must not overlap; the new one is open-ended.
        let overlapping = sqlx::query_as::<_, (i64, NaiveDate, Option<NaiveDate>)>(
            "SELECT id, effective_from, effective_to FROM project_shift_master
             WHERE project_id = ? AND shift_code = ? AND is_active = 1
               AND (effective_to IS NULL OR effective_to >= ?)
             ORDER BY effective_from
             LIMIT 1",
        )
        .bind(project_id)
        .bind(&definition.shift_code)
        .bind(definition.effective_from)
        .fetch_optional(&mut *tx)
        .await?;
        if let Some((id, from, to)) = overlapping {
            let window = match to {
                Some(to) => format!("{} to {}", from, to),
                None => format!("{} onwards", from),
            };
            return Err(RosterError::conflict(format!(
                "Shift '{}' already has active version {} in force {}",
                definition.shift_code, id, window
            )));
        }

        let id = insert_version(&mut tx, project_id, &definition.shift_code, definition).await?;
        tx.commit().await?;

        debug!(project_id, shift_code = %definition.shift_code, id, "Shift created");
        Ok(new_version(id, project_id, &definition.shift_code, definition))
    }

    /// Closes the current version of a shift code at the day before the new
    /// effective date and opens a new version, in one transaction.
    ///
    /// # Errors
    ///
    /// [`RosterError::NotFound`] when the code has no current version and
    /// [`RosterError::Validation`] when the new effective date is not after
    /// the current one.
    pub async fn version_shift(
        &self,
        project_id: i64,
        shift_code: &str,
        definition: &ShiftDefinition,
    ) -> RosterResult<ShiftVersion> {
        validate_definition(definition)?;
        let mut tx = self.pool().begin().await?;

        let current = sqlx::query_as::<_, (i64, NaiveDate)>(
            "SELECT id, effective_from FROM project_shift_master
             WHERE project_id = ? AND shift_code = ? AND is_active = 1 AND effective_to IS NULL
             ORDER BY effective_from DESC
             LIMIT 1",
        )
        .bind(project_id)
        .bind(shift_code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            RosterError::not_found("Current shift version", format!("{}/{}", project_id, shift_code))
        })?;

        let (current_id, current_from) = current;
        if definition.effective_from <= current_from {
            return Err(RosterError::validation(format!(
                "effective_from {} must be after the current version's {}",
                definition.effective_from, current_from
            )));
        }
        let closed_at = definition
            .effective_from
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| RosterError::validation("effective_from out of range"))?;

        sqlx::query("UPDATE project_shift_master SET effective_to = ?, updated_at = ? WHERE id = ?")
            .bind(closed_at)
            .bind(Utc::now().naive_utc())
            .bind(current_id)
            .execute(&mut *tx)
            .await?;

        let id = insert_version(&mut tx, project_id, shift_code, definition).await?;
        tx.commit().await?;

        debug!(
            project_id,
            shift_code,
            closed = current_id,
            opened = id,
            %closed_at,
            "Shift versioned"
        );
        Ok(new_version(id, project_id, shift_code, definition))
    }

    /// Marks one version inactive so that no lookup considers it.
    pub async fn deactivate_shift_version(&self, project_id: i64, version_id: i64) -> RosterResult<()> {
        let affected = sqlx::query(
            "UPDATE project_shift_master SET is_active = 0, updated_at = ?
             WHERE id = ? AND project_id = ?",
        )
        .bind(Utc::now().naive_utc())
        .bind(version_id)
        .bind(project_id)
        .execute(self.pool())
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(RosterError::not_found("Shift version", version_id));
        }
        debug!(project_id, version_id, "Shift version deactivated");
        Ok(())
    }
}

fn validate_definition(definition: &ShiftDefinition) -> RosterResult<()> {
    if definition.shift_code.trim().is_empty() {
        return Err(RosterError::validation("shift_code must not be empty"));
    }
    if definition.weekday_allowance.is_sign_negative() || definition.weekend_allowance.is_sign_negative() {
        return Err(RosterError::validation("allowances must not be negative"));
    }
    Ok(())
}

async fn insert_version(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    project_id: i64,
    shift_code: &str,
    definition: &ShiftDefinition,
) -> RosterResult<i64> {
    let result = sqlx::query(
        "INSERT INTO project_shift_master
             (project_id, shift_code, shift_name, start_time, end_time,
              weekday_allowance, weekend_allowance, effective_from)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(project_id)
    .bind(shift_code)
    .bind(&definition.shift_name)
    .bind(definition.start_time)
    .bind(definition.end_time)
    .bind(definition.weekday_allowance.to_string())
    .bind(definition.weekend_allowance.to_string())
    .bind(definition.effective_from)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            RosterError::conflict(format!(
                "Shift '{}' already has a version effective from {}",
                shift_code, definition.effective_from
            ))
        } else if is_foreign_key_violation(&e) {
            RosterError::not_found("Project", project_id)
        } else {
            e.into()
        }
    })?;
    Ok(result.last_insert_rowid())
}

fn new_version(id: i64, project_id: i64, shift_code: &str, definition: &ShiftDefinition) -> ShiftVersion {
    ShiftVersion {
        id,
        project_id,
        shift_code: shift_code.to_string(),
        shift_name: definition.shift_name.clone(),
        start_time: definition.start_time,
        end_time: definition.end_time,
        weekday_allowance: definition.weekday_allowance,
        weekend_allowance: definition.weekend_allowance,
        effective_from: definition.effective_from,
        effective_to: None,
        is_active: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn morning(weekday: &str, weekend: &str, from: &str) -> ShiftDefinition {
        ShiftDefinition {
            shift_code: "MORNING".to_string(),
            shift_name: "Morning".to_string(),
            start_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            weekday_allowance: Decimal::from_str(weekday).unwrap(),
            weekend_allowance: Decimal::from_str(weekend).unwrap(),
            effective_from: make_date(from),
        }
    }

    async fn store_with_project() -> (RosterStore, i64) {
        let store = RosterStore::in_memory().await.unwrap();
        let project = store.create_project("Apollo").await.unwrap();
        (store, project.project_id)
    }

    #[tokio::test]
    async fn test_versioning_closes_previous_version() {
        let (store, project_id) = store_with_project().await;
        store
            .create_shift(project_id, &morning("50", "80", "2024-01-01"))
            .await
            .unwrap();
        store
            .version_shift(project_id, "MORNING", &morning("60", "90", "2024-02-01"))
            .await
            .unwrap();

        let history = store.shift_versions_for(project_id, "MORNING").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].effective_to, Some(make_date("2024-01-31")));
        assert_eq!(history[1].effective_to, None);

        let before = store
            .resolve_shift(project_id, "MORNING", make_date("2024-01-31"))
            .await
            .unwrap();
        assert_eq!(before.weekday_allowance, Decimal::from_str("50").unwrap());

        let after = store
            .resolve_shift(project_id, "MORNING", make_date("2024-02-01"))
            .await
            .unwrap();
        assert_eq!(after.weekday_allowance, Decimal::from_str("60").unwrap());
    }

    #[tokio::test]
    async fn test_create_inside_closed_window_conflicts() {
        let (store, project_id) = store_with_project().await;
        store
            .create_shift(project_id, &morning("50", "80", "2024-01-01"))
            .await
            .unwrap();
        let second = store
            .version_shift(project_id, "MORNING", &morning("60", "90", "2024-02-01"))
            .await
            .unwrap();
        store.deactivate_shift_version(project_id, second.id).await.unwrap();

        // The first version still covers 2024-01-01..=2024-01-31.
        let overlapping = store
            .create_shift(project_id, &morning("99", "99", "2024-01-10"))
            .await;
        assert!(matches!(overlapping, Err(RosterError::Conflict { .. })));

        let resolved = store
            .resolve_shift(project_id, "MORNING", make_date("2024-01-20"))
            .await
            .unwrap();
        assert_eq!(resolved.weekday_allowance, Decimal::from_str("50").unwrap());

        // Starting after the closed window is fine.
        let reopened = store
            .create_shift(project_id, &morning("70", "95", "2024-03-01"))
            .await
            .unwrap();
        assert_eq!(reopened.effective_to, None);
    }

    #[tokio::test]
    async fn test_shifts_on_picks_one_version_per_code() {
        let (store, project_id) = store_with_project().await;
        store
            .create_shift(project_id, &morning("50", "80", "2024-01-01"))
            .await
            .unwrap();
        store
            .version_shift(project_id, "MORNING", &morning("60", "90", "2024-02-01"))
            .await
            .unwrap();
        let mut night = morning("100", "150", "2024-02-10");
        night.shift_code = "NIGHT".to_string();
        store.create_shift(project_id, &night).await.unwrap();

        let january = store.shifts_on(project_id, make_date("2024-01-31")).await.unwrap();
        assert_eq!(january.len(), 1);
        assert_eq!(january[0].weekday_allowance, Decimal::from_str("50").unwrap());

        let february = store.shifts_on(project_id, make_date("2024-02-15")).await.unwrap();
        let codes: Vec<&str> = february.iter().map(|v| v.shift_code.as_str()).collect();
        assert_eq!(codes, vec!["MORNING", "NIGHT"]);
        assert_eq!(february[0].weekday_allowance, Decimal::from_str("60").unwrap());
    }

    #[tokio::test]
    async fn test_resolve_before_first_version_fails() {
        let (store, project_id) = store_with_project().await;
        store
            .create_shift(project_id, &morning("50", "80", "2024-01-01"))
            .await
            .unwrap();

        let result = store
            .resolve_shift(project_id, "MORNING", make_date("2023-12-31"))
            .await;
        assert!(matches!(result, Err(RosterError::ShiftNotResolved { .. })));
    }

    #[tokio::test]
    async fn test_create_with_open_version_conflicts() {
        let (store, project_id) = store_with_project().await;
        store
            .create_shift(project_id, &morning("50", "80", "2024-01-01"))
            .await
            .unwrap();
        let again = store
            .create_shift(project_id, &morning("55", "85", "2024-03-01"))
            .await;
        assert!(matches!(again, Err(RosterError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_version_must_move_forward() {
        let (store, project_id) = store_with_project().await;
        store
            .create_shift(project_id, &morning("50", "80", "2024-01-01"))
            .await
            .unwrap();
        let result = store
            .version_shift(project_id, "MORNING", &morning("60", "90", "2024-01-01"))
            .await;
        assert!(matches!(result, Err(RosterError::Validation { .. })));

        let missing = store
            .version_shift(project_id, "NIGHT", &morning("60", "90", "2024-02-01"))
            .await;
        assert!(matches!(missing, Err(RosterError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_active_shifts_filters_window_and_inactive() {
        let (store, project_id) = store_with_project().await;
        let first = store
            .create_shift(project_id, &morning("50", "80", "2024-01-01"))
            .await
            .unwrap();
        store
            .version_shift(project_id, "MORNING", &morning("60", "90", "2024-02-01"))
            .await
            .unwrap();

        let january = DateRange::new(make_date("2024-01-01"), make_date("2024-01-31")).unwrap();
        let found = store.active_shifts(&[project_id], &january).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, first.id);

        store.deactivate_shift_version(project_id, first.id).await.unwrap();
        let found = store.active_shifts(&[project_id], &january).await.unwrap();
        assert!(found.is_empty());

        assert!(store.active_shifts(&[], &january).await.unwrap().is_empty());
    }
}
