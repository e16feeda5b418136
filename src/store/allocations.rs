//! The allocation ledger (`shift_allocation`).

use chrono::{NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::debug;

use super::{RosterStore, is_foreign_key_violation};
use crate::error::{RosterError, RosterResult};
use crate::models::{
    Allocation, AllocationBatch, AllocationDetail, AllocationRow, BatchAck, DateRange,
};

#[derive(FromRow)]
struct LedgerRow {
    allocation_id: i64,
    emp_id: i64,
    project_id: i64,
    shift_code: String,
    shift_date: NaiveDate,
    is_approved: bool,
    approved_by: Option<i64>,
    last_updated: NaiveDateTime,
}

impl From<LedgerRow> for Allocation {
    fn from(row: LedgerRow) -> Self {
        Allocation {
            allocation_id: row.allocation_id,
            emp_id: row.emp_id,
            project_id: row.project_id,
            shift_code: row.shift_code,
            shift_date: row.shift_date,
            is_approved: row.is_approved,
            approved_by: row.approved_by,
            last_updated: row.last_updated,
        }
    }
}

#[derive(FromRow)]
struct ReportRow {
    allocation_id: i64,
    emp_id: i64,
    emp_name: String,
    emp_lname: String,
    project_id: i64,
    project_name: String,
    shift_code: String,
    shift_date: NaiveDate,
}

impl From<ReportRow> for AllocationRow {
    fn from(row: ReportRow) -> Self {
        AllocationRow {
            allocation_id: row.allocation_id,
            emp_id: row.emp_id,
            emp_name: row.emp_name,
            emp_lname: row.emp_lname,
            project_id: row.project_id,
            project_name: row.project_name,
            shift_code: row.shift_code,
            shift_date: row.shift_date,
        }
    }
}

#[derive(FromRow)]
struct DetailRow {
    allocation_id: i64,
    emp_id: i64,
    emp_name: String,
    emp_lname: String,
    shift_code: String,
    shift_date: NaiveDate,
    is_approved: bool,
    approver_name: Option<String>,
    last_updated: NaiveDateTime,
}

impl From<DetailRow> for AllocationDetail {
    fn from(row: DetailRow) -> Self {
        AllocationDetail {
            allocation_id: row.allocation_id,
            emp_id: row.emp_id,
            emp_name: row.emp_name,
            emp_lname: row.emp_lname,
            shift_code: row.shift_code,
            shift_date: row.shift_date,
            is_approved: row.is_approved,
            approver_name: row.approver_name,
            last_updated: row.last_updated,
        }
    }
}

impl RosterStore {
    /// Approved allocations of the given projects inside `range`, joined with
    /// employee and project names, optionally for one employee.
    ///
    /// Rows are ordered by project, date, employee, shift code and id.
    pub async fn approved_allocations(
        &self,
        project_ids: &[i64],
        range: &DateRange,
        emp_id: Option<i64>,
    ) -> RosterResult<Vec<AllocationRow>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT a.allocation_id, a.emp_id, e.emp_name, e.emp_lname,
                    a.project_id, p.name AS project_name, a.shift_code, a.shift_date
             FROM shift_allocation a
             JOIN employee e ON e.emp_id = a.emp_id
             JOIN project p ON p.project_id = a.project_id
             WHERE a.is_approved = 1 AND a.project_id IN (",
        );
        let mut ids = query.separated(", ");
        for id in project_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
        query
            .push(" AND a.shift_date BETWEEN ")
            .push_bind(range.from)
            .push(" AND ")
            .push_bind(range.to);
        if let Some(emp_id) = emp_id {
            query.push(" AND a.emp_id = ").push_bind(emp_id);
        }
        query.push(" ORDER BY a.project_id, a.shift_date, a.emp_id, a.shift_code, a.allocation_id");

        let rows = query.build_query_as::<ReportRow>().fetch_all(self.pool()).await?;
        debug!(
            projects = project_ids.len(),
            allocations = rows.len(),
            ?emp_id,
            "Loaded approved allocations"
        );
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Every ledger row of a project inside `range`, approved or not.
    pub async fn allocations_between(
        &self,
        project_id: i64,
        range: &DateRange,
    ) -> RosterResult<Vec<Allocation>> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            "SELECT allocation_id, emp_id, project_id, shift_code, shift_date,
                    is_approved, approved_by, last_updated
             FROM shift_allocation
             WHERE project_id = ? AND shift_date BETWEEN ? AND ?
             ORDER BY shift_date, shift_code, emp_id",
        )
        .bind(project_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Ledger rows of a project with employee and approver names, for the
    /// weekly view.
    pub async fn allocation_details(
        &self,
        project_id: i64,
        range: &DateRange,
    ) -> RosterResult<Vec<AllocationDetail>> {
        let rows = sqlx::query_as::<_, DetailRow>(
            "SELECT a.allocation_id, a.emp_id, e.emp_name, e.emp_lname, a.shift_code,
                    a.shift_date, a.is_approved,
                    CASE WHEN l.lead_id IS NULL THEN NULL
                         ELSE l.lead_name || ' ' || l.lead_lname END AS approver_name,
                    a.last_updated
             FROM shift_allocation a
             JOIN employee e ON e.emp_id = a.emp_id
             LEFT JOIN project_lead l ON l.lead_id = a.approved_by
             WHERE a.project_id = ? AND a.shift_date BETWEEN ? AND ?
             ORDER BY a.shift_date, a.shift_code, e.emp_name, a.emp_id",
        )
        .bind(project_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Applies removals, additions and approval changes for one project in a
    /// single transaction.
    ///
    /// Additions that collide with an existing `(employee, project, shift
    /// code, date)` row are skipped, so resubmitting a batch is harmless.
    /// Removals only touch allocations of `project_id`.
    ///
    /// # Errors
    ///
    /// [`RosterError::Validation`] when an addition names an unknown
    /// employee; nothing is written in that case.
    pub async fn apply_batch(
        &self,
        project_id: i64,
        lead_id: i64,
        batch: &AllocationBatch,
    ) -> RosterResult<BatchAck> {
        let mut ack = BatchAck::default();
        if batch.is_empty() {
            return Ok(ack);
        }

        let now = Utc::now().naive_utc();
        let mut tx = self.pool().begin().await?;

        if !batch.remove.is_empty() {
            let mut query: QueryBuilder<Sqlite> =
                QueryBuilder::new("DELETE FROM shift_allocation WHERE project_id = ");
            query.push_bind(project_id).push(" AND allocation_id IN (");
            let mut ids = query.separated(", ");
            for id in &batch.remove {
                ids.push_bind(*id);
            }
            ids.push_unseparated(")");
            ack.removed = query.build().execute(&mut *tx).await?.rows_affected();
        }

        for draft in &batch.add {
            let inserted = sqlx::query(
                "INSERT INTO shift_allocation
                     (emp_id, project_id, shift_code, shift_date, is_approved, last_updated)
                 VALUES (?, ?, ?, ?, 0, ?)
                 ON CONFLICT (emp_id, project_id, shift_code, shift_date) DO NOTHING",
            )
            .bind(draft.emp_id)
            .bind(project_id)
            .bind(&draft.shift_code)
            .bind(draft.shift_date)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    RosterError::validation(format!("Unknown employee: {}", draft.emp_id))
                } else {
                    e.into()
                }
            })?
            .rows_affected();

            if inserted == 0 {
                ack.skipped += 1;
            } else {
                ack.added += inserted;
            }
        }

        for change in &batch.approvals {
            let approved_by = change.is_approved.then_some(lead_id);
            ack.approvals_updated += sqlx::query(
                "UPDATE shift_allocation
                 SET is_approved = ?, approved_by = ?, last_updated = ?
                 WHERE project_id = ? AND shift_date = ?",
            )
            .bind(change.is_approved)
            .bind(approved_by)
            .bind(now)
            .bind(project_id)
            .bind(change.date)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        debug!(
            project_id,
            lead_id,
            removed = ack.removed,
            added = ack.added,
            skipped = ack.skipped,
            approvals_updated = ack.approvals_updated,
            "Allocation batch applied"
        );
        Ok(ack)
    }
}
