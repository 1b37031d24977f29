//! Attendance alert rules.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::{AlertKind, AttendanceLog, HrAlert, LeaveRequest};

use super::{WorkCalendar, late_arrivals};

/// Workdays in `[start, end]` with no attendance and no approved leave.
///
/// ```
/// use hr_engine::calculation::{WorkCalendar, absence_dates};
/// use chrono::NaiveDate;
/// use std::collections::BTreeSet;
///
/// let d = |day| NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
/// let logged: BTreeSet<_> = [d(3), d(5)].into_iter().collect();
/// // Mon 3 to Fri 7, on leave Thursday.
/// let absent = absence_dates(&WorkCalendar::default(), d(3), d(7), &logged, |day| day == d(6));
/// assert_eq!(absent, vec![d(4), d(7)]);
/// ```
pub fn absence_dates(
    calendar: &WorkCalendar,
    start: NaiveDate,
    end: NaiveDate,
    logged: &BTreeSet<NaiveDate>,
    on_leave: impl Fn(NaiveDate) -> bool,
) -> Vec<NaiveDate> {
    calendar
        .workdays_in(start, end)
        .into_iter()
        .filter(|d| !logged.contains(d) && !on_leave(*d))
        .collect()
}

/// Late first clock-ins on workdays, as clock-in times.
///
/// Tardiness uses the same grace period as payroll lateness.
pub fn tardy_instances(
    logs: &[AttendanceLog],
    calendar: &WorkCalendar,
    scheduled_start: NaiveTime,
    grace_minutes: i64,
) -> Vec<NaiveDateTime> {
    late_arrivals(logs, calendar, scheduled_start, grace_minutes)
        .into_iter()
        .map(|(_, clock_in)| clock_in)
        .collect()
}

/// Minimum counts that raise an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Absences that raise an absence alert.
    pub absences: usize,
    /// Late arrivals that raise a tardiness alert.
    pub tardies: usize,
}

/// The attendance facts gathered for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeAttendanceFacts {
    /// Employee id.
    pub employee_id: String,
    /// Employee name.
    pub employee_name: String,
    /// Absence dates in the period.
    pub absences: Vec<NaiveDate>,
    /// Late clock-ins in the period.
    pub late_arrivals: Vec<NaiveDateTime>,
}

/// Builds the HR alerts report.
///
/// Each employee meeting a threshold gets one alert per kind. Every pending
/// leave request gets its own alert. The report is sorted by employee name,
/// then alert kind.
pub fn build_alerts_report(
    facts: &[EmployeeAttendanceFacts],
    pending_leave: &[(LeaveRequest, String)],
    thresholds: AlertThresholds,
) -> Vec<HrAlert> {
    let mut alerts = Vec::new();
    for fact in facts {
        if !fact.absences.is_empty() && fact.absences.len() >= thresholds.absences {
            alerts.push(HrAlert {
                employee_id: fact.employee_id.clone(),
                employee_name: fact.employee_name.clone(),
                kind: AlertKind::Absence,
                count: fact.absences.len(),
                dates: fact.absences.clone(),
                details: fact
                    .absences
                    .iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
        if !fact.late_arrivals.is_empty() && fact.late_arrivals.len() >= thresholds.tardies {
            alerts.push(HrAlert {
                employee_id: fact.employee_id.clone(),
                employee_name: fact.employee_name.clone(),
                kind: AlertKind::Tardiness,
                count: fact.late_arrivals.len(),
                dates: fact.late_arrivals.iter().map(|t| t.date()).collect(),
                details: fact
                    .late_arrivals
                    .iter()
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
    }
    for (request, name) in pending_leave {
        alerts.push(HrAlert {
            employee_id: request.employee_id.clone(),
            employee_name: name.clone(),
            kind: AlertKind::PendingLeave,
            count: 1,
            dates: vec![request.start_date, request.end_date],
            details: format!(
                "Type: {}, From: {} To: {}, Requested: {}",
                request.leave_type, request.start_date, request.end_date, request.request_date
            ),
        });
    }
    alerts.sort_by(|a, b| {
        a.employee_name
            .cmp(&b.employee_name)
            .then(a.kind.cmp(&b.kind))
    });
    alerts
}

/// Employees whose late arrivals in a window reach a threshold.
///
/// `late_by_employee` pairs an employee with their late clock-ins in the
/// window. Returns the employees meeting the threshold with their count.
pub fn repeated_lateness<'a>(
    late_by_employee: impl IntoIterator<Item = (&'a str, usize)>,
    threshold: usize,
) -> Vec<(&'a str, usize)> {
    late_by_employee
        .into_iter()
        .filter(|(_, count)| threshold > 0 && *count >= threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LeaveStatus;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn facts(name: &str, absences: Vec<NaiveDate>, late: Vec<NaiveDateTime>) -> EmployeeAttendanceFacts {
        EmployeeAttendanceFacts {
            employee_id: format!("ID-{name}"),
            employee_name: name.to_string(),
            absences,
            late_arrivals: late,
        }
    }

    fn pending(employee_id: &str) -> LeaveRequest {
        LeaveRequest {
            id: 1,
            employee_id: employee_id.to_string(),
            leave_type: "Vacation".to_string(),
            start_date: d(10),
            end_date: d(12),
            reason: None,
            request_date: d(1),
            status: LeaveStatus::PendingApproval,
            assigned_approver_user_id: Some(1),
            processed_by_user_id: None,
            approver_comments: None,
            processed_date: None,
        }
    }

    #[test]
    fn test_absence_dates_skip_holidays_and_weekends() {
        let calendar = WorkCalendar::new(&[0, 1, 2, 3, 4], [d(4)]);
        let logged = BTreeSet::new();
        let absent = absence_dates(&calendar, d(1), d(9), &logged, |_| false);
        assert_eq!(absent, vec![d(3), d(5), d(6), d(7)]);
    }

    #[test]
    fn test_tardy_instances_use_grace() {
        let log = |day: u32, h: u32, m: u32| AttendanceLog {
            id: i64::from(day),
            employee_id: "E".to_string(),
            clock_in: d(day).and_hms_opt(h, m, 0).unwrap(),
            clock_out: None,
            log_date: d(day),
            source: "Manual".to_string(),
            notes: None,
        };
        let logs = vec![log(3, 9, 10), log(4, 9, 16), log(5, 8, 50)];
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let tardy = tardy_instances(&logs, &WorkCalendar::default(), nine, 15);
        assert_eq!(tardy, vec![d(4).and_hms_opt(9, 16, 0).unwrap()]);
    }

    #[test]
    fn test_report_thresholds_and_sorting() {
        let late = |day: u32| d(day).and_hms_opt(9, 30, 0).unwrap();
        let report = build_alerts_report(
            &[
                facts("Zoe", vec![d(3), d(4), d(5)], vec![]),
                facts("Adam", vec![d(3)], vec![late(4), late(5), late(6)]),
            ],
            &[(pending("ID-Zoe"), "Zoe".to_string())],
            AlertThresholds {
                absences: 3,
                tardies: 3,
            },
        );
        let summary: Vec<(&str, AlertKind, usize)> = report
            .iter()
            .map(|a| (a.employee_name.as_str(), a.kind, a.count))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Adam", AlertKind::Tardiness, 3),
                ("Zoe", AlertKind::Absence, 3),
                ("Zoe", AlertKind::PendingLeave, 1),
            ]
        );
        assert_eq!(report[0].details, "2025-03-04 09:30, 2025-03-05 09:30, 2025-03-06 09:30");
        assert_eq!(report[1].details, "2025-03-03, 2025-03-04, 2025-03-05");
    }

    #[test]
    fn test_zero_threshold_needs_at_least_one_occurrence() {
        let report = build_alerts_report(
            &[facts("Sam", vec![], vec![])],
            &[],
            AlertThresholds {
                absences: 0,
                tardies: 0,
            },
        );
        assert!(report.is_empty());
    }

    #[test]
    fn test_repeated_lateness_threshold() {
        let found = repeated_lateness([("A", 2), ("B", 3), ("C", 5)], 3);
        assert_eq!(found, vec![("B", 3), ("C", 5)]);
        assert!(repeated_lateness([("A", 9)], 0).is_empty());
    }
}
