//! Reference entities: employees, projects and project leads.

use serde::{Deserialize, Serialize};

use super::Role;

/// A rostered employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Employee identifier (assigned by HR, not generated).
    pub emp_id: i64,
    /// First name.
    pub emp_name: String,
    /// Last name.
    pub emp_lname: String,
    /// Contact email, unique.
    pub email: String,
    /// Whether the employee is flagged as experienced.
    pub is_experienced: bool,
    /// Inactive employees cannot act as callers.
    pub is_active: bool,
    /// The lead the employee reports to.
    pub reporting_to: Option<i64>,
}

impl Employee {
    /// First and last name joined for display.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.emp_name, self.emp_lname)
            .trim()
            .to_string()
    }
}

/// A project that shifts are rostered for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier.
    pub project_id: i64,
    /// Display name.
    pub name: String,
    /// Inactive projects are hidden from scopes and access checks.
    pub is_active: bool,
}

/// A project lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLead {
    /// Lead identifier.
    pub lead_id: i64,
    /// First name.
    pub lead_name: String,
    /// Last name.
    pub lead_lname: String,
    /// Contact email, unique.
    pub email: String,
    /// Inactive leads cannot act as callers.
    pub is_active: bool,
    /// Administrators see every active project.
    pub is_admin: bool,
}

/// An employee of a project, used by pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    /// Employee identifier.
    pub emp_id: i64,
    /// First name.
    pub emp_name: String,
    /// Last name.
    pub emp_lname: String,
}

/// A project reference inside a caller context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    /// Project identifier.
    pub project_id: i64,
    /// Display name.
    pub name: String,
}

impl From<&Project> for ProjectRef {
    fn from(project: &Project) -> Self {
        ProjectRef {
            project_id: project.project_id,
            name: project.name.clone(),
        }
    }
}

/// An employee together with the projects it works on, used to pick the
/// employee filter of a detailed report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeProjects {
    /// Employee identifier.
    pub emp_id: i64,
    /// First name.
    pub emp_name: String,
    /// Last name.
    pub emp_lname: String,
    /// Memberships, ordered by project name.
    pub projects: Vec<ProjectRef>,
}

/// What the caller is and which projects it can see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    /// The caller's role.
    pub user_type: Role,
    /// The caller's identifier within its role.
    pub id: i64,
    /// First name of the caller.
    pub name: String,
    /// Whether the caller is an administrator.
    pub is_admin: bool,
    /// Active projects visible to the caller, ordered by name.
    pub projects: Vec<ProjectRef>,
    /// The first visible project, if any.
    pub default_project_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_trims_missing_last_name() {
        let employee = Employee {
            emp_id: 1,
            emp_name: "Asha".to_string(),
            emp_lname: String::new(),
            email: "asha@example.com".to_string(),
            is_experienced: false,
            is_active: true,
            reporting_to: None,
        };
        assert_eq!(employee.full_name(), "Asha");
    }
}
