//! HR alerts, the daily absence and lateness checks, and weekly statistics.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculation::{
    AlertThresholds, EmployeeAttendanceFacts, build_alerts_report, late_arrivals, repeated_lateness,
    tardy_instances,
};
use crate::error::{HrError, HrResult};
use crate::models::{Employee, HrAlert};
use crate::store::Database;

use super::attendance::employee_report;

/// The HR alerts report over `[start, end]`.
///
/// Absences and tardiness come from active employees' attendance; each
/// pending leave request filed in the period is its own alert. Without
/// `thresholds` the configured report thresholds apply.
pub fn generate_hr_alerts_report(
    db: &Database,
    start: NaiveDate,
    end: NaiveDate,
    thresholds: Option<AlertThresholds>,
) -> HrResult<Vec<HrAlert>> {
    if end < start {
        return Err(HrError::invalid("end", "is before start"));
    }
    let policy = db.load_policy()?;
    let thresholds = thresholds.unwrap_or(AlertThresholds {
        absences: policy.alerts.min_unexcused_absence_days_for_alert,
        tardies: policy.alerts.tardy_threshold_for_report,
    });
    let calendar = policy.calendar();

    let mut facts = Vec::new();
    for employee in db.active_employees()? {
        let report = employee_report(db, &policy, &employee, start, end)?;
        let logs = db.logs_for_period(&employee.id, start, end)?;
        facts.push(EmployeeAttendanceFacts {
            employee_id: employee.id,
            employee_name: employee.name,
            absences: report.absences,
            late_arrivals: tardy_instances(
                &logs,
                &calendar,
                policy.schedule.standard_start_time,
                policy.schedule.late_arrival_allowed_minutes,
            ),
        });
    }
    let pending = db.pending_leave_requests(None, Some((start, end)))?;
    let alerts = build_alerts_report(&facts, &pending, thresholds);
    debug!(%start, %end, alerts = alerts.len(), "alerts report built");
    Ok(alerts)
}

/// Active employees who have not clocked in by the absence cutoff.
///
/// Empty when the alert is disabled, on non-workdays and before the
/// cutoff. Employees on approved leave are not reported.
pub fn absent_employees_for_alert(db: &Database, now: NaiveDateTime) -> HrResult<Vec<Employee>> {
    let policy = db.load_policy()?;
    let today = now.date();
    if !policy.alerts.enable_absence_alert
        || !policy.calendar().is_workday(today)
        || now.time() < policy.alerts.absence_alert_cutoff_time
    {
        return Ok(Vec::new());
    }
    let logged = db.employees_logged_on(today)?;
    let mut absent = Vec::new();
    for employee in db.active_employees()? {
        if !logged.contains(&employee.id) && !db.approved_leave_on(&employee.id, today)? {
            absent.push(employee);
        }
    }
    Ok(absent)
}

/// Employees late at least the configured number of times in the
/// lateness window ending `today`, with their count.
pub fn repeated_lateness_alerts(db: &Database, today: NaiveDate) -> HrResult<Vec<(Employee, usize)>> {
    let policy = db.load_policy()?;
    if !policy.alerts.enable_repeated_lateness_alert {
        return Ok(Vec::new());
    }
    let window = policy.alerts.lateness_alert_period_days.max(1);
    let start = today - Duration::days(window - 1);
    let calendar = policy.calendar();

    let employees = db.active_employees()?;
    let mut counts = Vec::with_capacity(employees.len());
    for employee in &employees {
        let logs = db.logs_for_period(&employee.id, start, today)?;
        let late = late_arrivals(
            &logs,
            &calendar,
            policy.schedule.standard_start_time,
            policy.schedule.late_arrival_allowed_minutes,
        );
        counts.push((employee.id.as_str(), late.len()));
    }
    let flagged: Vec<(String, usize)> = repeated_lateness(counts, policy.alerts.lateness_alert_threshold_count)
        .into_iter()
        .map(|(id, n)| (id.to_string(), n))
        .collect();

    Ok(employees
        .into_iter()
        .filter_map(|e| {
            flagged
                .iter()
                .find(|(id, _)| *id == e.id)
                .map(|(_, n)| (e, *n))
        })
        .collect())
}

/// Attendance totals for the seven days ending on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyStatistics {
    /// First day of the week.
    pub week_start: NaiveDate,
    /// Last day of the week.
    pub week_end: NaiveDate,
    /// Active employees counted.
    pub active_employees: usize,
    /// Hours worked by everyone.
    pub total_hours: Decimal,
    /// Overtime hours worked by everyone.
    pub overtime_hours: Decimal,
    /// Late first clock-ins.
    pub late_arrivals: u32,
    /// Absent employee-days.
    pub absences: usize,
    /// Leave requests still waiting for a decision.
    pub pending_leave_requests: usize,
}

impl WeeklyStatistics {
    /// Plain-text rendering for notifications.
    pub fn to_message(&self) -> String {
        format!(
            "Week {} to {}\nActive employees: {}\nHours worked: {}\nOvertime hours: {}\nLate arrivals: {}\nAbsences: {}\nPending leave requests: {}",
            self.week_start,
            self.week_end,
            self.active_employees,
            self.total_hours,
            self.overtime_hours,
            self.late_arrivals,
            self.absences,
            self.pending_leave_requests,
        )
    }
}

/// Statistics over the seven days ending `week_end`.
pub fn weekly_statistics(db: &Database, week_end: NaiveDate) -> HrResult<WeeklyStatistics> {
    let week_start = week_end - Duration::days(6);
    let policy = db.load_policy()?;
    let employees = db.active_employees()?;

    let mut stats = WeeklyStatistics {
        week_start,
        week_end,
        active_employees: employees.len(),
        total_hours: Decimal::ZERO,
        overtime_hours: Decimal::ZERO,
        late_arrivals: 0,
        absences: 0,
        pending_leave_requests: db.pending_leave_requests(None, None)?.len(),
    };
    for employee in &employees {
        let report = employee_report(db, &policy, employee, week_start, week_end)?;
        stats.total_hours += report.summary.total_hours;
        stats.overtime_hours += report.summary.overtime_hours;
        stats.late_arrivals += report.late_days;
        stats.absences += report.absences.len();
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertKind, NewLeaveRequest};
    use crate::store::{SOURCE_MANUAL, test_support};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn work(db: &Database, employee_id: &str, day: u32, in_h: u32, in_m: u32) {
        db.insert_log(
            employee_id,
            d(day).and_hms_opt(in_h, in_m, 0).unwrap(),
            Some(d(day).and_hms_opt(17, 0, 0).unwrap()),
            SOURCE_MANUAL,
            None,
        )
        .unwrap();
    }

    #[test]
    fn test_report_flags_absence_and_tardiness() {
        let db = test_support::db();
        let ana = test_support::employee(&db, "Ana", 3000);
        let ben = test_support::employee(&db, "Ben", 3000);
        for day in 3..=7 {
            work(&db, &ana, day, 9, 30);
        }
        work(&db, &ben, 3, 9, 0);

        let alerts = generate_hr_alerts_report(
            &db,
            d(3),
            d(7),
            Some(AlertThresholds { absences: 3, tardies: 3 }),
        )
        .unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].employee_name, "Ana");
        assert_eq!(alerts[0].kind, AlertKind::Tardiness);
        assert_eq!(alerts[0].count, 5);
        assert_eq!(alerts[1].employee_name, "Ben");
        assert_eq!(alerts[1].kind, AlertKind::Absence);
        assert_eq!(alerts[1].dates, vec![d(4), d(5), d(6), d(7)]);
    }

    #[test]
    fn test_absent_employees_respect_cutoff_and_leave() {
        let db = test_support::db();
        let ana = test_support::employee(&db, "Ana", 3000);
        let ben = test_support::employee(&db, "Ben", 3000);
        let cara = test_support::employee(&db, "Cara", 3000);
        work(&db, &ana, 3, 9, 0);
        let leave = db
            .add_leave_request(&NewLeaveRequest {
                employee_id: cara.clone(),
                leave_type: "Sick".to_string(),
                start_date: d(3),
                end_date: d(3),
                reason: None,
            })
            .unwrap();
        db.process_leave_request(leave, crate::models::LeaveStatus::Approved, 1, None)
            .unwrap();

        let early = absent_employees_for_alert(&db, d(3).and_hms_opt(9, 0, 0).unwrap()).unwrap();
        assert!(early.is_empty());
        let late = absent_employees_for_alert(&db, d(3).and_hms_opt(10, 0, 0).unwrap()).unwrap();
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].id, ben);
    }

    #[test]
    fn test_repeated_lateness_window() {
        let db = test_support::db();
        let ana = test_support::employee(&db, "Ana", 3000);
        test_support::employee(&db, "Ben", 3000);
        for day in [3, 4, 5] {
            work(&db, &ana, day, 9, 45);
        }
        let flagged = repeated_lateness_alerts(&db, d(7)).unwrap();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].0.id, ana);
        assert_eq!(flagged[0].1, 3);

        // 10 March looks back to 4 March: two late days left.
        assert!(repeated_lateness_alerts(&db, d(10)).unwrap().is_empty());
    }

    #[test]
    fn test_weekly_statistics_totals() {
        let db = test_support::db();
        let ana = test_support::employee(&db, "Ana", 3000);
        work(&db, &ana, 3, 9, 0);
        work(&db, &ana, 4, 9, 30);

        let stats = weekly_statistics(&db, d(9)).unwrap();
        assert_eq!(stats.week_start, d(3));
        assert_eq!(stats.active_employees, 1);
        assert_eq!(stats.total_hours, Decimal::new(155, 1));
        assert_eq!(stats.late_arrivals, 1);
        assert_eq!(stats.absences, 3);
        assert!(stats.to_message().contains("Absences: 3"));
    }
}
