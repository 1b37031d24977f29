//! Operations that combine the store with the calculation rules.
//!
//! Each function loads what it needs from a [`Database`](crate::store::Database),
//! applies the policy in force (defaults overlaid by stored settings) and,
//! where the operation has an outcome to keep, writes it back.

mod alerts;
mod attendance;
mod import;
mod leave;
mod payroll;

pub use alerts::{
    WeeklyStatistics, absent_employees_for_alert, generate_hr_alerts_report,
    repeated_lateness_alerts, weekly_statistics,
};
pub use attendance::{
    EmployeeAttendanceReport, absences_count_on, attendance_status_today,
    attendance_summary_report,
};
pub use import::{ImportReport, import_fingerprint_csv, import_fingerprint_reader};
pub use leave::{
    LeaveBalanceRow, LeaveRequestOutcome, leave_balance_report, request_leave,
    vacation_balance_for,
};
pub use payroll::{
    PayrollRunReport, calculate_payroll_for_employee, generate_payslip, run_payroll,
};
