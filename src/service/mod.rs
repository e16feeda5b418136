//! Access-checked roster operations.
//!
//! [`RosterService`] is the layer the HTTP handlers call. Every method takes
//! the resolved [`CallerIdentity`], checks project access, loads what it
//! needs from the [`RosterStore`] and hands the data to the pure functions in
//! [`crate::calculation`].

mod allocations;
mod reports;
mod shifts;

use tracing::debug;

use crate::error::{RosterError, RosterResult};
use crate::models::{CallerContext, CallerIdentity, Project, ProjectRef, Role};
use crate::store::RosterStore;

pub use reports::DetailedReportQuery;

/// Roster operations on behalf of an identified caller.
#[derive(Debug, Clone)]
pub struct RosterService {
    store: RosterStore,
}

impl RosterService {
    /// Creates a service over a store.
    pub fn new(store: RosterStore) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &RosterStore {
        &self.store
    }

    /// Resolves an active caller from a role and id.
    ///
    /// The admin flag is read from storage.
    ///
    /// # Errors
    ///
    /// [`RosterError::Unauthorized`] when the user is unknown or inactive.
    pub async fn identify(&self, role: Role, id: i64) -> RosterResult<CallerIdentity> {
        let identity = match role {
            Role::Lead => self
                .store
                .find_lead(id)
                .await?
                .filter(|lead| lead.is_active)
                .map(|lead| CallerIdentity::Lead {
                    lead_id: lead.lead_id,
                    is_admin: lead.is_admin,
                }),
            Role::Employee => self
                .store
                .find_employee(id)
                .await?
                .filter(|employee| employee.is_active)
                .map(|employee| CallerIdentity::Employee {
                    emp_id: employee.emp_id,
                }),
        };

        identity.ok_or_else(|| RosterError::Unauthorized {
            reason: "User not found or inactive".to_string(),
        })
    }

    /// Describes the caller and the active projects it can see.
    pub async fn caller_context(&self, caller: &CallerIdentity) -> RosterResult<CallerContext> {
        let (name, projects) = match *caller {
            CallerIdentity::Lead { lead_id, is_admin } => {
                let lead = self
                    .store
                    .find_lead(lead_id)
                    .await?
                    .ok_or_else(|| RosterError::not_found("Lead", lead_id))?;
                let projects = if is_admin {
                    self.store.active_projects().await?
                } else {
                    self.store.lead_projects(lead_id).await?
                };
                (lead.lead_name, projects)
            }
            CallerIdentity::Employee { emp_id } => {
                let employee = self
                    .store
                    .find_employee(emp_id)
                    .await?
                    .ok_or_else(|| RosterError::not_found("Employee", emp_id))?;
                (employee.emp_name, self.store.employee_projects(emp_id).await?)
            }
        };

        let projects: Vec<ProjectRef> = projects.iter().map(ProjectRef::from).collect();
        Ok(CallerContext {
            user_type: caller.role(),
            id: caller.id(),
            name,
            is_admin: caller.is_admin(),
            default_project_id: projects.first().map(|p| p.project_id),
            projects,
        })
    }

    /// Checks that the caller may act on a project and returns it.
    ///
    /// # Errors
    ///
    /// [`RosterError::NotFound`] when the project is missing or inactive and
    /// [`RosterError::Forbidden`] when the caller is not assigned to it.
    pub async fn authorize_project(
        &self,
        caller: &CallerIdentity,
        project_id: i64,
    ) -> RosterResult<Project> {
        let project = self
            .store
            .find_project(project_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| RosterError::not_found("Project", project_id))?;

        let allowed = match *caller {
            CallerIdentity::Lead { is_admin: true, .. } => true,
            CallerIdentity::Lead { lead_id, .. } => {
                self.store.is_lead_assigned(project_id, lead_id).await?
            }
            CallerIdentity::Employee { emp_id } => {
                self.store.is_employee_assigned(project_id, emp_id).await?
            }
        };

        if !allowed {
            debug!(project_id, caller_id = caller.id(), "Project access denied");
            return Err(RosterError::forbidden("Not authorized for this project"));
        }
        Ok(project)
    }

    /// Checks that the caller is a lead with access to the project.
    pub async fn authorize_lead_project(
        &self,
        caller: &CallerIdentity,
        project_id: i64,
    ) -> RosterResult<(i64, Project)> {
        let lead_id = require_lead(caller)?;
        let project = self.authorize_project(caller, project_id).await?;
        Ok((lead_id, project))
    }

    /// Project ids a lead's aggregate reports cover: every active project
    /// for an administrator, every assigned project otherwise.
    pub async fn report_scope(&self, caller: &CallerIdentity) -> RosterResult<Vec<i64>> {
        match *caller {
            CallerIdentity::Lead { is_admin: true, .. } => Ok(self
                .store
                .active_projects()
                .await?
                .into_iter()
                .map(|p| p.project_id)
                .collect()),
            CallerIdentity::Lead { lead_id, .. } => self.store.assigned_project_ids(lead_id).await,
            CallerIdentity::Employee { .. } => Err(lead_only()),
        }
    }
}

/// The caller's lead id, or Forbidden for employees.
pub fn require_lead(caller: &CallerIdentity) -> RosterResult<i64> {
    match *caller {
        CallerIdentity::Lead { lead_id, .. } => Ok(lead_id),
        CallerIdentity::Employee { .. } => Err(lead_only()),
    }
}

fn lead_only() -> RosterError {
    RosterError::forbidden("Only project leads can perform this action")
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::CallerIdentity;
    use crate::store::{NewEmployee, NewLead, RosterStore};

    use super::RosterService;

    /// A service with one admin, one lead assigned to "Apollo", one
    /// unassigned project "Borealis" and employee 1 on "Apollo".
    pub(crate) struct Seeded {
        pub service: RosterService,
        pub admin: CallerIdentity,
        pub lead: CallerIdentity,
        pub employee: CallerIdentity,
        pub apollo: i64,
        pub borealis: i64,
    }

    pub(crate) async fn seeded() -> Seeded {
        let store = RosterStore::in_memory().await.unwrap();
        let admin = store
            .create_lead(&NewLead {
                lead_name: "Meera".to_string(),
                lead_lname: "Admin".to_string(),
                email: "meera@example.com".to_string(),
                is_admin: true,
            })
            .await
            .unwrap();
        let lead = store
            .create_lead(&NewLead {
                lead_name: "Ravi".to_string(),
                lead_lname: "Kumar".to_string(),
                email: "ravi@example.com".to_string(),
                is_admin: false,
            })
            .await
            .unwrap();
        let apollo = store.create_project("Apollo").await.unwrap().project_id;
        let borealis = store.create_project("Borealis").await.unwrap().project_id;
        store.assign_lead(apollo, lead.lead_id).await.unwrap();
        store
            .create_employee(&NewEmployee {
                emp_id: 1,
                emp_name: "Asha".to_string(),
                emp_lname: "Rao".to_string(),
                email: "asha@example.com".to_string(),
                is_experienced: true,
                reporting_to: Some(lead.lead_id),
            })
            .await
            .unwrap();
        store.assign_employee(apollo, 1).await.unwrap();

        Seeded {
            service: RosterService::new(store),
            admin: CallerIdentity::Lead {
                lead_id: admin.lead_id,
                is_admin: true,
            },
            lead: CallerIdentity::Lead {
                lead_id: lead.lead_id,
                is_admin: false,
            },
            employee: CallerIdentity::Employee { emp_id: 1 },
            apollo,
            borealis,
        }
    }
}
