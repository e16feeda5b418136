//! Employees, projects, leads and their assignments.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::debug;

use super::{RosterStore, is_foreign_key_violation, is_unique_violation};
use crate::error::{RosterError, RosterResult};
use crate::models::{Employee, EmployeeProjects, EmployeeSummary, Project, ProjectLead, ProjectRef};

/// Input for registering a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
    /// First name.
    pub lead_name: String,
    /// Last name.
    pub lead_lname: String,
    /// Contact email, unique.
    pub email: String,
    /// Grants visibility of every active project.
    pub is_admin: bool,
}

/// Input for registering an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    /// Employee identifier chosen by HR.
    pub emp_id: i64,
    /// First name.
    pub emp_name: String,
    /// Last name.
    pub emp_lname: String,
    /// Contact email, unique.
    pub email: String,
    /// Experience flag.
    pub is_experienced: bool,
    /// The lead the employee reports to.
    pub reporting_to: Option<i64>,
}

#[derive(FromRow)]
struct EmployeeRow {
    emp_id: i64,
    emp_name: String,
    emp_lname: String,
    email: String,
    is_experienced: bool,
    is_active: bool,
    reporting_to: Option<i64>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            emp_id: row.emp_id,
            emp_name: row.emp_name,
            emp_lname: row.emp_lname,
            email: row.email,
            is_experienced: row.is_experienced,
            is_active: row.is_active,
            reporting_to: row.reporting_to,
        }
    }
}

#[derive(FromRow)]
struct ProjectRow {
    project_id: i64,
    name: String,
    is_active: bool,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            project_id: row.project_id,
            name: row.name,
            is_active: row.is_active,
        }
    }
}

#[derive(FromRow)]
struct LeadRow {
    lead_id: i64,
    lead_name: String,
    lead_lname: String,
    email: String,
    is_active: bool,
    is_admin: bool,
}

impl From<LeadRow> for ProjectLead {
    fn from(row: LeadRow) -> Self {
        ProjectLead {
            lead_id: row.lead_id,
            lead_name: row.lead_name,
            lead_lname: row.lead_lname,
            email: row.email,
            is_active: row.is_active,
            is_admin: row.is_admin,
        }
    }
}

#[derive(FromRow)]
struct EmployeeSummaryRow {
    emp_id: i64,
    emp_name: String,
    emp_lname: String,
}

impl From<EmployeeSummaryRow> for EmployeeSummary {
    fn from(row: EmployeeSummaryRow) -> Self {
        EmployeeSummary {
            emp_id: row.emp_id,
            emp_name: row.emp_name,
            emp_lname: row.emp_lname,
        }
    }
}

#[derive(FromRow)]
struct MembershipRow {
    emp_id: i64,
    emp_name: String,
    emp_lname: String,
    project_id: i64,
    project_name: String,
}

impl RosterStore {
    // =================================================================
    // Leads, employees and projects
    // =================================================================

    /// Registers a lead and returns it.
    pub async fn create_lead(&self, lead: &NewLead) -> RosterResult<ProjectLead> {
        let lead_id = sqlx::query(
            "INSERT INTO project_lead (lead_name, lead_lname, email, is_admin) VALUES (?, ?, ?, ?)",
        )
        .bind(&lead.lead_name)
        .bind(&lead.lead_lname)
        .bind(&lead.email)
        .bind(lead.is_admin)
        .execute(self.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RosterError::conflict(format!("Lead email already registered: {}", lead.email))
            } else {
                e.into()
            }
        })?
        .last_insert_rowid();

        Ok(ProjectLead {
            lead_id,
            lead_name: lead.lead_name.clone(),
            lead_lname: lead.lead_lname.clone(),
            email: lead.email.clone(),
            is_active: true,
            is_admin: lead.is_admin,
        })
    }

    /// Registers an employee and returns it.
    pub async fn create_employee(&self, employee: &NewEmployee) -> RosterResult<Employee> {
        sqlx::query(
            "INSERT INTO employee (emp_id, emp_name, emp_lname, email, is_experienced, reporting_to)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(employee.emp_id)
        .bind(&employee.emp_name)
        .bind(&employee.emp_lname)
        .bind(&employee.email)
        .bind(employee.is_experienced)
        .bind(employee.reporting_to)
        .execute(self.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RosterError::conflict(format!("Employee ID already exists: {}", employee.emp_id))
            } else {
                e.into()
            }
        })?;

        Ok(Employee {
            emp_id: employee.emp_id,
            emp_name: employee.emp_name.clone(),
            emp_lname: employee.emp_lname.clone(),
            email: employee.email.clone(),
            is_experienced: employee.is_experienced,
            is_active: true,
            reporting_to: employee.reporting_to,
        })
    }

    /// Marks an employee inactive.
    pub async fn deactivate_employee(&self, emp_id: i64) -> RosterResult<()> {
        let affected = sqlx::query("UPDATE employee SET is_active = 0 WHERE emp_id = ?")
            .bind(emp_id)
            .execute(self.pool())
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(RosterError::not_found("Employee", emp_id));
        }
        Ok(())
    }

    /// Creates an active project.
    pub async fn create_project(&self, name: &str) -> RosterResult<Project> {
        let project_id = sqlx::query("INSERT INTO project (name) VALUES (?)")
            .bind(name)
            .execute(self.pool())
            .await?
            .last_insert_rowid();

        Ok(Project {
            project_id,
            name: name.to_string(),
            is_active: true,
        })
    }

    /// Soft-deletes a project.
    pub async fn deactivate_project(&self, project_id: i64) -> RosterResult<()> {
        let affected = sqlx::query(
            "UPDATE project SET is_active = 0, last_updated = CURRENT_TIMESTAMP WHERE project_id = ?",
        )
        .bind(project_id)
        .execute(self.pool())
        .await?
        .rows_affected();
        if affected == 0 {
            return Err(RosterError::not_found("Project", project_id));
        }
        Ok(())
    }

    /// Looks up a lead by id.
    pub async fn find_lead(&self, lead_id: i64) -> RosterResult<Option<ProjectLead>> {
        let row = sqlx::query_as::<_, LeadRow>(
            "SELECT lead_id, lead_name, lead_lname, email, is_active, is_admin
             FROM project_lead WHERE lead_id = ?",
        )
        .bind(lead_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    /// Looks up an employee by id.
    pub async fn find_employee(&self, emp_id: i64) -> RosterResult<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            "SELECT emp_id, emp_name, emp_lname, email, is_experienced, is_active, reporting_to
             FROM employee WHERE emp_id = ?",
        )
        .bind(emp_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    /// Looks up a project by id, active or not.
    pub async fn find_project(&self, project_id: i64) -> RosterResult<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>(
            "SELECT project_id, name, is_active FROM project WHERE project_id = ?",
        )
        .bind(project_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    /// Every active project, ordered by name.
    pub async fn active_projects(&self) -> RosterResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT project_id, name, is_active FROM project WHERE is_active = 1 ORDER BY name, project_id",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Active projects a lead is assigned to, ordered by name.
    pub async fn lead_projects(&self, lead_id: i64) -> RosterResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT p.project_id, p.name, p.is_active
             FROM project p
             JOIN project_lead_assignment a ON a.project_id = p.project_id
             WHERE a.lead_id = ? AND p.is_active = 1
             ORDER BY p.name, p.project_id",
        )
        .bind(lead_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Ids of every project a lead is assigned to, active or not.
    pub async fn assigned_project_ids(&self, lead_id: i64) -> RosterResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT project_id FROM project_lead_assignment WHERE lead_id = ? ORDER BY project_id",
        )
        .bind(lead_id)
        .fetch_all(self.pool())
        .await?;
        Ok(ids)
    }

    /// Active projects an employee belongs to, ordered by name.
    pub async fn employee_projects(&self, emp_id: i64) -> RosterResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT p.project_id, p.name, p.is_active
             FROM project p
             JOIN project_employee pe ON pe.project_id = p.project_id
             WHERE pe.emp_id = ? AND p.is_active = 1
             ORDER BY p.name, p.project_id",
        )
        .bind(emp_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    // =================================================================
    // Assignments
    // =================================================================

    /// Assigns a lead to a project; repeating an assignment is a no-op.
    pub async fn assign_lead(&self, project_id: i64, lead_id: i64) -> RosterResult<()> {
        sqlx::query(
            "INSERT INTO project_lead_assignment (project_id, lead_id) VALUES (?, ?)
             ON CONFLICT (project_id, lead_id) DO NOTHING",
        )
        .bind(project_id)
        .bind(lead_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Whether a lead is assigned to a project.
    pub async fn is_lead_assigned(&self, project_id: i64, lead_id: i64) -> RosterResult<bool> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM project_lead_assignment WHERE project_id = ? AND lead_id = ?",
        )
        .bind(project_id)
        .bind(lead_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(found.is_some())
    }

    /// Whether an employee belongs to a project.
    pub async fn is_employee_assigned(&self, project_id: i64, emp_id: i64) -> RosterResult<bool> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM project_employee WHERE project_id = ? AND emp_id = ?",
        )
        .bind(project_id)
        .bind(emp_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(found.is_some())
    }

    /// Adds an employee to a project.
    ///
    /// # Errors
    ///
    /// [`RosterError::Conflict`] when the employee is already assigned and
    /// [`RosterError::NotFound`] when the employee does not exist.
    pub async fn assign_employee(&self, project_id: i64, emp_id: i64) -> RosterResult<()> {
        sqlx::query("INSERT INTO project_employee (project_id, emp_id) VALUES (?, ?)")
            .bind(project_id)
            .bind(emp_id)
            .execute(self.pool())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RosterError::conflict("Employee already assigned")
                } else if is_foreign_key_violation(&e) {
                    RosterError::not_found("Employee", emp_id)
                } else {
                    e.into()
                }
            })?;
        debug!(project_id, emp_id, "Employee assigned to project");
        Ok(())
    }

    /// Removes an employee from a project.
    pub async fn remove_employee(&self, project_id: i64, emp_id: i64) -> RosterResult<()> {
        let affected =
            sqlx::query("DELETE FROM project_employee WHERE project_id = ? AND emp_id = ?")
                .bind(project_id)
                .bind(emp_id)
                .execute(self.pool())
                .await?
                .rows_affected();
        if affected == 0 {
            return Err(RosterError::not_found(
                "Assignment",
                format!("project={} emp={}", project_id, emp_id),
            ));
        }
        debug!(project_id, emp_id, "Employee removed from project");
        Ok(())
    }

    /// Employees of a project, ordered by first name.
    pub async fn project_employees(&self, project_id: i64) -> RosterResult<Vec<EmployeeSummary>> {
        let rows = sqlx::query_as::<_, EmployeeSummaryRow>(
            "SELECT e.emp_id, e.emp_name, e.emp_lname
             FROM employee e
             JOIN project_employee pe ON pe.emp_id = e.emp_id
             WHERE pe.project_id = ?
             ORDER BY e.emp_name, e.emp_id",
        )
        .bind(project_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Project employees not yet allocated to a shift code on a date.
    pub async fn available_employees(
        &self,
        project_id: i64,
        shift_code: &str,
        shift_date: NaiveDate,
    ) -> RosterResult<Vec<EmployeeSummary>> {
        let rows = sqlx::query_as::<_, EmployeeSummaryRow>(
            "SELECT e.emp_id, e.emp_name, e.emp_lname
             FROM employee e
             JOIN project_employee pe ON pe.emp_id = e.emp_id
             WHERE pe.project_id = ?
               AND e.emp_id NOT IN (
                   SELECT emp_id FROM shift_allocation
                   WHERE project_id = ? AND shift_code = ? AND shift_date = ?
               )
             ORDER BY e.emp_name, e.emp_id",
        )
        .bind(project_id)
        .bind(project_id)
        .bind(shift_code)
        .bind(shift_date)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Employees assigned to any of the given projects, each with the
    /// memberships among those projects, ordered by emp_id.
    pub async fn report_employees(&self, project_ids: &[i64]) -> RosterResult<Vec<EmployeeProjects>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT e.emp_id, e.emp_name, e.emp_lname, p.project_id, p.name AS project_name
             FROM employee e
             JOIN project_employee pe ON pe.emp_id = e.emp_id
             JOIN project p ON p.project_id = pe.project_id
             WHERE p.project_id IN (",
        );
        let mut ids = query.separated(", ");
        for project_id in project_ids {
            ids.push_bind(*project_id);
        }
        query.push(") ORDER BY e.emp_id, p.name, p.project_id");

        let rows = query.build_query_as::<MembershipRow>().fetch_all(self.pool()).await?;
        let mut employees: Vec<EmployeeProjects> = Vec::new();
        for row in rows {
            let project = ProjectRef {
                project_id: row.project_id,
                name: row.project_name,
            };
            match employees.last_mut() {
                Some(last) if last.emp_id == row.emp_id => last.projects.push(project),
                _ => employees.push(EmployeeProjects {
                    emp_id: row.emp_id,
                    emp_name: row.emp_name,
                    emp_lname: row.emp_lname,
                    projects: vec![project],
                }),
            }
        }

        debug!(projects = project_ids.len(), employees = employees.len(), "Loaded report employees");
        Ok(employees)
    }
}
