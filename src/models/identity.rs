//! Caller identity.
//!
//! Every operation runs on behalf of a resolved caller. Leads and employees
//! are distinct variants rather than a runtime type test.

use serde::{Deserialize, Serialize};

/// The role a caller acts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A project lead (possibly an administrator).
    Lead,
    /// A rostered employee.
    Employee,
}

/// A resolved, active caller.
///
/// # Example
///
/// ```
/// use shift_roster::models::{CallerIdentity, Role};
///
/// let admin = CallerIdentity::Lead { lead_id: 1, is_admin: true };
/// assert_eq!(admin.role(), Role::Lead);
/// assert!(admin.is_admin());
///
/// let employee = CallerIdentity::Employee { emp_id: 10 };
/// assert_eq!(employee.id(), 10);
/// assert!(!employee.is_admin());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum CallerIdentity {
    /// A project lead.
    Lead {
        /// The lead's identifier.
        lead_id: i64,
        /// Administrators bypass project assignment checks.
        is_admin: bool,
    },
    /// An employee.
    Employee {
        /// The employee's identifier.
        emp_id: i64,
    },
}

impl CallerIdentity {
    /// The caller's identifier within its role.
    pub fn id(&self) -> i64 {
        match self {
            CallerIdentity::Lead { lead_id, .. } => *lead_id,
            CallerIdentity::Employee { emp_id } => *emp_id,
        }
    }

    /// The caller's role.
    pub fn role(&self) -> Role {
        match self {
            CallerIdentity::Lead { .. } => Role::Lead,
            CallerIdentity::Employee { .. } => Role::Employee,
        }
    }

    /// Whether the caller is an administrator.
    pub fn is_admin(&self) -> bool {
        matches!(self, CallerIdentity::Lead { is_admin: true, .. })
    }
}
