//! Employee model and related types.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{HrError, HrResult};

use super::validation::{validate_email, validate_phone};

labelled_enum! {
    /// Employment status of an employee.
    pub enum EmployeeStatus {
        /// Currently employed and expected at work.
        Active => "Active",
        /// Employment has ended.
        Terminated => "Terminated",
        /// On extended leave.
        OnLeave => "On Leave",
        /// Temporarily suspended.
        Suspended => "Suspended",
    }
}

labelled_enum! {
    /// The shift an employee currently works.
    pub enum WorkShift {
        /// Morning shift.
        Morning => "Morning",
        /// Evening shift.
        Evening => "Evening",
        /// Night shift.
        Night => "Night",
    }
}

impl WorkShift {
    /// The shift that follows this one in the rotation.
    ///
    /// ```
    /// use hr_engine::models::WorkShift;
    ///
    /// assert_eq!(WorkShift::Morning.next(), WorkShift::Evening);
    /// assert_eq!(WorkShift::Night.next(), WorkShift::Morning);
    /// ```
    pub fn next(self) -> Self {
        match self {
            WorkShift::Morning => WorkShift::Evening,
            WorkShift::Evening => WorkShift::Night,
            WorkShift::Night => WorkShift::Morning,
        }
    }
}

/// An employee record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Generated id such as `EMP0001`.
    pub id: String,
    /// Full name.
    pub name: String,
    /// Department, if assigned.
    pub department_id: Option<i64>,
    /// Department name, joined in for display.
    pub department_name: Option<String>,
    /// Job title.
    pub position: Option<String>,
    /// Monthly salary.
    pub salary: Decimal,
    /// Yearly vacation allocation in days.
    pub vacation_days: i64,
    /// Employment status.
    pub status: EmployeeStatus,
    /// Set when the employee is terminated.
    pub termination_date: Option<NaiveDate>,
    /// First day of employment.
    pub start_date: Option<NaiveDate>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Gender.
    pub gender: Option<String>,
    /// Marital status.
    pub marital_status: Option<String>,
    /// Highest education.
    pub education: Option<String>,
    /// User id on the fingerprint device.
    pub device_user_id: Option<String>,
    /// Current shift.
    pub current_shift: WorkShift,
    /// Line manager's employee id.
    pub manager_id: Option<String>,
    /// When set, the employee has no vacation balance.
    pub exclude_vacation_policy: bool,
    /// Archived records are hidden from default listings.
    pub is_archived: bool,
    /// When the record was archived.
    pub archived_date: Option<NaiveDateTime>,
}

impl Employee {
    /// Returns true if the employee is active.
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }
}

/// The fields needed to create an employee.
///
/// ```
/// use hr_engine::models::NewEmployee;
/// use rust_decimal::Decimal;
///
/// let new = NewEmployee::new("Jane Doe", Decimal::from(4000));
/// assert!(new.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewEmployee {
    /// Full name.
    pub name: String,
    /// Department.
    pub department_id: Option<i64>,
    /// Job title.
    pub position: Option<String>,
    /// Monthly salary.
    pub salary: Decimal,
    /// Vacation days; the configured default is used when absent.
    pub vacation_days: Option<i64>,
    /// Initial status; `Active` when absent.
    pub status: Option<EmployeeStatus>,
    /// First day of employment.
    pub start_date: Option<NaiveDate>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Gender.
    pub gender: Option<String>,
    /// Marital status.
    pub marital_status: Option<String>,
    /// Highest education.
    pub education: Option<String>,
    /// User id on the fingerprint device.
    pub device_user_id: Option<String>,
    /// Initial shift; `Morning` when absent.
    pub current_shift: Option<WorkShift>,
    /// Line manager's employee id.
    pub manager_id: Option<String>,
    /// Exclude from the vacation policy.
    pub exclude_vacation_policy: bool,
}

impl NewEmployee {
    /// Starts a record with the two required fields.
    pub fn new(name: &str, salary: Decimal) -> Self {
        Self {
            name: name.to_string(),
            salary,
            ..Default::default()
        }
    }

    /// Checks field formats before the record reaches the database.
    pub fn validate(&self) -> HrResult<()> {
        if self.name.trim().is_empty() {
            return Err(HrError::invalid("name", "must not be empty"));
        }
        if self.salary < Decimal::ZERO {
            return Err(HrError::invalid("salary", "must not be negative"));
        }
        if self.vacation_days.is_some_and(|d| d < 0) {
            return Err(HrError::invalid("vacation_days", "must not be negative"));
        }
        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            if !validate_email(email) {
                return Err(HrError::invalid("email", format!("'{}' is not a valid email", email)));
            }
        }
        if let Some(phone) = self.phone.as_deref().filter(|p| !p.is_empty()) {
            if !validate_phone(phone) {
                return Err(HrError::invalid("phone", format!("'{}' is not a valid phone number", phone)));
            }
        }
        if self
            .device_user_id
            .as_deref()
            .is_some_and(|d| d.trim().is_empty())
        {
            return Err(HrError::invalid("device_user_id", "must not be blank"));
        }
        Ok(())
    }
}

/// Criteria for listing employees.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeFilter {
    /// Only this status.
    pub status: Option<EmployeeStatus>,
    /// Only this department.
    pub department_id: Option<i64>,
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
    /// Include archived records.
    pub include_archived: bool,
}

/// A line in the employee action history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    /// Row id.
    pub id: i64,
    /// The employee the action concerns.
    pub employee_id: String,
    /// What happened.
    pub description: String,
    /// The user who did it, when known.
    pub performed_by_user_id: Option<i64>,
    /// When it happened.
    pub timestamp: NaiveDateTime,
}
