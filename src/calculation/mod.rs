//! Calculation logic for the HR engine.
//!
//! Pure business rules with no database access: the working calendar,
//! worked hours and daily overtime, lateness, daily attendance status,
//! payslips, vacation balances, department leave load, fingerprint log
//! summaries, attendance alerts and contract lifecycles. The store and
//! services layers gather inputs and persist results.

mod alerts;
mod attendance_status;
mod contract_lifecycle;
mod daily_overtime;
mod fingerprint;
mod lateness;
mod leave_policy;
mod payroll;
mod vacation;
mod work_calendar;
mod worked_duration;

pub use alerts::{
    AlertThresholds, EmployeeAttendanceFacts, absence_dates, build_alerts_report,
    repeated_lateness, tardy_instances,
};
pub use attendance_status::{StatusRules, attendance_status_for_day};
pub use contract_lifecycle::{LifecycleEvaluation, evaluate_lifecycle};
pub use daily_overtime::{
    DEFAULT_DAILY_OVERTIME_THRESHOLD, DailyOvertimeDetection, daily_hours, detect_daily_overtime,
    split_overtime, summarize_attendance,
};
pub use fingerprint::{
    DailyEventSummary, FingerprintEvent, FingerprintEventKind, ParseOutcome, SkippedRow,
    daily_event_summary, parse_fingerprint_csv,
};
pub use lateness::{LatenessCheck, evaluate_lateness, late_arrivals, late_penalty};
pub use leave_policy::{DepartmentLoad, department_load, is_department_busy};
pub use payroll::{PayrollInput, advance_instalment, calculate_payslip};
pub use vacation::{VacationBalance, VacationRules, days_in_year, vacation_balance};
pub use work_calendar::WorkCalendar;
pub use worked_duration::worked_hours;
