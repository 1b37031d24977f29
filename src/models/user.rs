//! Application users.

use serde::{Deserialize, Serialize};

labelled_enum! {
    /// What a user may do.
    pub enum Role {
        /// Full access.
        Admin => "Admin",
        /// Manages a department and approves its requests.
        DepartmentManager => "Department Manager",
        /// Self-service only.
        Employee => "Employee",
    }
}

/// A login account, optionally linked to an employee record.
///
/// The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Row id.
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// Access role.
    pub role: Role,
    /// The employee this account belongs to.
    pub employee_id: Option<String>,
}

impl User {
    /// Admins and department managers may approve requests.
    pub fn can_approve(&self) -> bool {
        matches!(self.role, Role::Admin | Role::DepartmentManager)
    }
}
