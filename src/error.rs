//! Error types for the HR engine.
//!
//! Every fallible operation in the crate returns [`HrError`]. Storage errors
//! from `rusqlite` are folded into [`HrError::Database`]; constraint
//! violations with a business meaning get their own variants.

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the HR engine.
///
/// # Example
///
/// ```
/// use hr_engine::error::HrError;
///
/// let error = HrError::EmployeeNotFound {
///     employee_id: "EMP0042".to_string(),
/// };
/// assert_eq!(error.to_string(), "Employee not found: EMP0042");
/// ```
#[derive(Debug, Error)]
pub enum HrError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A caller-supplied value failed validation.
    #[error("Invalid input for '{field}': {message}")]
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// No employee exists with the given id.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The employee id that was looked up.
        employee_id: String,
    },

    /// No department exists with the given id or name.
    #[error("Department not found: {department}")]
    DepartmentNotFound {
        /// The department id or name that was looked up.
        department: String,
    },

    /// No user exists with the given id or username.
    #[error("User not found: {user}")]
    UserNotFound {
        /// The user id or username that was looked up.
        user: String,
    },

    /// A leave request id did not match any row.
    #[error("Leave request not found: {request_id}")]
    LeaveRequestNotFound {
        /// The request id.
        request_id: i64,
    },

    /// A contract id did not match any row.
    #[error("Contract not found: {contract_id}")]
    ContractNotFound {
        /// The contract id.
        contract_id: i64,
    },

    /// Another employee already carries this fingerprint device user id.
    #[error("Device User ID '{device_user_id}' is already assigned to another employee.")]
    DuplicateDeviceUserId {
        /// The conflicting device user id.
        device_user_id: String,
    },

    /// A payslip for the same employee and period has already been recorded.
    #[error("Payslip already exists for employee {employee_id} for period {period_start} to {period_end}")]
    DuplicatePayslip {
        /// The employee id.
        employee_id: String,
        /// First day of the pay period.
        period_start: NaiveDate,
        /// Last day of the pay period.
        period_end: NaiveDate,
    },

    /// The employee already has an open attendance log.
    #[error("Employee {employee_id} is already clocked in")]
    AlreadyClockedIn {
        /// The employee id.
        employee_id: String,
    },

    /// The employee has no open attendance log to close.
    #[error("Employee {employee_id} is not clocked in")]
    NotClockedIn {
        /// The employee id.
        employee_id: String,
    },

    /// Attendance could not be recorded for a reason other than clock state.
    #[error("Attendance error for {employee_id}: {message}")]
    Attendance {
        /// The employee id.
        employee_id: String,
        /// What went wrong.
        message: String,
    },

    /// A workflow record is not in a state that allows the requested change.
    #[error("Cannot change {entity} from '{from}' to '{to}'")]
    InvalidStatusTransition {
        /// The kind of record (e.g. "leave request").
        entity: String,
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
    },

    /// A fingerprint CSV file could not be read.
    #[error("Failed to import '{path}': {message}")]
    CsvImport {
        /// The file path.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// The SQLite layer reported an error.
    #[error("Database operation failed: {message}")]
    Database {
        /// The underlying error message.
        message: String,
    },
}

impl From<rusqlite::Error> for HrError {
    fn from(err: rusqlite::Error) -> Self {
        HrError::Database {
            message: err.to_string(),
        }
    }
}

impl HrError {
    /// Shorthand for [`HrError::InvalidInput`].
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        HrError::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return HrError.
pub type HrResult<T> = Result<T, HrError>;

/// Returns true when a rusqlite error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}
