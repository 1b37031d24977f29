//! Attendance status and period reports.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::calculation::{
    StatusRules, absence_dates, attendance_status_for_day, late_arrivals, summarize_attendance,
};
use crate::config::Policy;
use crate::error::{HrError, HrResult};
use crate::models::{AttendanceStatus, AttendanceSummary, Employee};
use crate::store::Database;

fn status_rules(policy: &Policy) -> StatusRules {
    StatusRules {
        scheduled_start: policy.schedule.standard_start_time,
        grace_minutes: policy.schedule.late_arrival_allowed_minutes,
        lateness_enabled: policy.schedule.enable_instant_lateness_display,
    }
}

/// Where an employee stands on the day of `now`.
pub fn attendance_status_today(
    db: &Database,
    employee_id: &str,
    now: NaiveDateTime,
) -> HrResult<AttendanceStatus> {
    db.get_employee(employee_id, false)?;
    let policy = db.load_policy()?;
    let today = now.date();
    let logs = db.logs_for_period(employee_id, today, today)?;
    let on_leave = db.approved_leave_on(employee_id, today)?;
    Ok(attendance_status_for_day(
        employee_id,
        today,
        &logs,
        on_leave,
        &policy.calendar(),
        status_rules(&policy),
    ))
}

/// One employee's line in [`attendance_summary_report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeAttendanceReport {
    /// Employee id.
    pub employee_id: String,
    /// Employee name.
    pub employee_name: String,
    /// Hours and days attended.
    pub summary: AttendanceSummary,
    /// Workdays whose first clock-in was late.
    pub late_days: u32,
    /// Workdays with no log and no approved leave.
    pub absences: Vec<NaiveDate>,
}

pub(super) fn employee_report(
    db: &Database,
    policy: &Policy,
    employee: &Employee,
    start: NaiveDate,
    end: NaiveDate,
) -> HrResult<EmployeeAttendanceReport> {
    let calendar = policy.calendar();
    let logs = db.logs_for_period(&employee.id, start, end)?;
    let logged: BTreeSet<NaiveDate> = logs.iter().map(|l| l.log_date).collect();
    let leave = db.approved_leave_ranges(&employee.id, start, end)?;
    let absences = absence_dates(&calendar, start, end, &logged, |day| {
        leave.iter().any(|(s, e)| *s <= day && day <= *e)
    });
    let late = late_arrivals(
        &logs,
        &calendar,
        policy.schedule.standard_start_time,
        policy.schedule.late_arrival_allowed_minutes,
    );
    Ok(EmployeeAttendanceReport {
        employee_id: employee.id.clone(),
        employee_name: employee.name.clone(),
        summary: summarize_attendance(&logs, &calendar, policy.schedule.standard_work_hours_per_day),
        late_days: late.len() as u32,
        absences,
    })
}

/// Hours, lateness and absences of every active employee over a period.
pub fn attendance_summary_report(
    db: &Database,
    start: NaiveDate,
    end: NaiveDate,
) -> HrResult<Vec<EmployeeAttendanceReport>> {
    if end < start {
        return Err(HrError::invalid("end", "is before start"));
    }
    let policy = db.load_policy()?;
    db.active_employees()?
        .iter()
        .map(|employee| employee_report(db, &policy, employee, start, end))
        .collect()
}

/// Active employees with no log on `date` and no approved leave.
///
/// Always zero on a non-workday.
pub fn absences_count_on(db: &Database, date: NaiveDate) -> HrResult<usize> {
    let policy = db.load_policy()?;
    if !policy.calendar().is_workday(date) {
        return Ok(0);
    }
    let logged = db.employees_logged_on(date)?;
    let mut absent = 0;
    for employee in db.active_employees()? {
        if !logged.contains(&employee.id) && !db.approved_leave_on(&employee.id, date)? {
            absent += 1;
        }
    }
    Ok(absent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LeaveStatus, NewLeaveRequest};
    use crate::store::{SOURCE_MANUAL, test_support};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn approve_leave(db: &Database, employee_id: &str, start: u32, end: u32) {
        let id = db
            .add_leave_request(&NewLeaveRequest {
                employee_id: employee_id.to_string(),
                leave_type: "Sick".to_string(),
                start_date: d(start),
                end_date: d(end),
                reason: None,
            })
            .unwrap();
        db.process_leave_request(id, LeaveStatus::Approved, 1, None).unwrap();
    }

    #[test]
    fn test_status_today_reports_lateness() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        db.clock_in(&emp, d(3).and_hms_opt(9, 40, 0).unwrap(), SOURCE_MANUAL, None)
            .unwrap();
        let status = attendance_status_today(&db, &emp, d(3).and_hms_opt(10, 0, 0).unwrap()).unwrap();
        assert!(status.checked_in);
        assert_eq!(status.lateness_minutes, Some(40));
        assert!(status.message.contains("Late (40 min)"));
    }

    #[test]
    fn test_status_today_on_leave() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        approve_leave(&db, &emp, 3, 4);
        let status = attendance_status_today(&db, &emp, d(3).and_hms_opt(10, 0, 0).unwrap()).unwrap();
        assert!(status.on_leave);
        assert_eq!(status.message, "On Leave");
    }

    #[test]
    fn test_summary_report_counts_absences_excluding_leave() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        db.insert_log(
            &emp,
            d(3).and_hms_opt(9, 30, 0).unwrap(),
            Some(d(3).and_hms_opt(17, 30, 0).unwrap()),
            SOURCE_MANUAL,
            None,
        )
        .unwrap();
        approve_leave(&db, &emp, 4, 4);

        let report = attendance_summary_report(&db, d(3), d(7)).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].late_days, 1);
        assert_eq!(report[0].absences, vec![d(5), d(6), d(7)]);
        assert_eq!(report[0].summary.days_attended, 1);
    }

    #[test]
    fn test_absences_on_weekend_are_zero() {
        let db = test_support::db();
        let a = test_support::employee(&db, "Ana", 3000);
        test_support::employee(&db, "Ben", 3000);
        assert_eq!(absences_count_on(&db, d(8)).unwrap(), 0);

        db.insert_log(&a, d(3).and_hms_opt(9, 0, 0).unwrap(), None, SOURCE_MANUAL, None)
            .unwrap();
        assert_eq!(absences_count_on(&db, d(3)).unwrap(), 1);
    }
}
