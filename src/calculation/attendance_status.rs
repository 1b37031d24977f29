//! Attendance status of an employee for a single day.

use chrono::{NaiveDate, NaiveTime};

use crate::models::{AttendanceLog, AttendanceStatus};

use super::{WorkCalendar, evaluate_lateness};

/// Schedule inputs for [`attendance_status_for_day`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRules {
    /// Scheduled start of the day.
    pub scheduled_start: NaiveTime,
    /// Grace minutes before an arrival counts as late.
    pub grace_minutes: i64,
    /// Assess lateness at all.
    pub lateness_enabled: bool,
}

/// Describes an employee's day from their logs.
///
/// `logs` must be the employee's logs for `date`, in any order. Lateness is
/// assessed only when enabled, on workdays, when not on leave, and after a
/// clock-in. The message lists, joined with `" | "`: "On Leave", or
/// "Non-Workday", or "Checked In" followed by the lateness verdict and
/// "Checked Out", or "Absent".
///
/// ```
/// use hr_engine::calculation::{StatusRules, WorkCalendar, attendance_status_for_day};
/// use chrono::{NaiveDate, NaiveTime};
///
/// let monday = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
/// let rules = StatusRules {
///     scheduled_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
///     grace_minutes: 15,
///     lateness_enabled: true,
/// };
/// let status = attendance_status_for_day("EMP0001", monday, &[], false, &WorkCalendar::default(), rules);
/// assert_eq!(status.message, "Absent");
/// ```
pub fn attendance_status_for_day(
    employee_id: &str,
    date: NaiveDate,
    logs: &[AttendanceLog],
    on_leave: bool,
    calendar: &WorkCalendar,
    rules: StatusRules,
) -> AttendanceStatus {
    let mut day_logs: Vec<&AttendanceLog> = logs.iter().filter(|l| l.log_date == date).collect();
    day_logs.sort_by_key(|l| l.clock_in);

    let first_clock_in = day_logs.first().map(|l| l.clock_in);
    let last_clock_out = day_logs.iter().rev().find_map(|l| l.clock_out);
    let checked_in = first_clock_in.is_some();
    let checked_out = last_clock_out.is_some();
    let is_workday = calendar.is_workday(date);

    let (is_late, lateness_minutes) = match first_clock_in {
        Some(clock_in) if rules.lateness_enabled && is_workday && !on_leave => {
            let check = evaluate_lateness(clock_in, rules.scheduled_start, rules.grace_minutes);
            (
                Some(check.is_late),
                check.is_late.then_some(check.minutes_late),
            )
        }
        _ => (None, None),
    };

    let mut parts: Vec<String> = Vec::new();
    if on_leave {
        parts.push("On Leave".to_string());
    } else if !is_workday {
        parts.push("Non-Workday".to_string());
    } else if checked_in {
        parts.push("Checked In".to_string());
        match (is_late, lateness_minutes) {
            (Some(true), Some(minutes)) => parts.push(format!("Late ({} min)", minutes)),
            (Some(false), _) => parts.push("On Time".to_string()),
            _ => {}
        }
        if checked_out {
            parts.push("Checked Out".to_string());
        }
    } else {
        parts.push("Absent".to_string());
    }

    AttendanceStatus {
        employee_id: employee_id.to_string(),
        date,
        checked_in,
        checked_out,
        first_clock_in,
        last_clock_out,
        is_late,
        lateness_minutes,
        on_leave,
        is_workday,
        message: parts.join(" | "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        monday().and_hms_opt(h, m, 0).unwrap()
    }

    fn rules() -> StatusRules {
        StatusRules {
            scheduled_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            grace_minutes: 15,
            lateness_enabled: true,
        }
    }

    fn log(id: i64, clock_in: NaiveDateTime, clock_out: Option<NaiveDateTime>) -> AttendanceLog {
        AttendanceLog {
            id,
            employee_id: "EMP0001".to_string(),
            clock_in,
            clock_out,
            log_date: clock_in.date(),
            source: "Manual".to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_on_time_and_checked_out() {
        let logs = vec![log(1, at(9, 5), Some(at(17, 0)))];
        let status = attendance_status_for_day("EMP0001", monday(), &logs, false, &WorkCalendar::default(), rules());
        assert_eq!(status.message, "Checked In | On Time | Checked Out");
        assert_eq!(status.is_late, Some(false));
        assert_eq!(status.lateness_minutes, None);
    }

    #[test]
    fn test_late_still_in() {
        let logs = vec![log(1, at(9, 40), None)];
        let status = attendance_status_for_day("EMP0001", monday(), &logs, false, &WorkCalendar::default(), rules());
        assert_eq!(status.message, "Checked In | Late (40 min)");
        assert_eq!(status.lateness_minutes, Some(40));
        assert!(!status.checked_out);
    }

    #[test]
    fn test_first_log_decides_lateness_and_last_out_is_reported() {
        let logs = vec![
            log(2, at(13, 0), None),
            log(1, at(8, 55), Some(at(12, 0))),
        ];
        let status = attendance_status_for_day("EMP0001", monday(), &logs, false, &WorkCalendar::default(), rules());
        assert_eq!(status.first_clock_in, Some(at(8, 55)));
        assert_eq!(status.last_clock_out, Some(at(12, 0)));
        assert_eq!(status.is_late, Some(false));
    }

    #[test]
    fn test_on_leave_overrides() {
        let status = attendance_status_for_day("EMP0001", monday(), &[], true, &WorkCalendar::default(), rules());
        assert_eq!(status.message, "On Leave");
        assert_eq!(status.is_late, None);
    }

    #[test]
    fn test_non_workday() {
        let saturday = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
        let status = attendance_status_for_day("EMP0001", saturday, &[], false, &WorkCalendar::default(), rules());
        assert_eq!(status.message, "Non-Workday");
        assert!(!status.is_workday);
    }

    #[test]
    fn test_lateness_disabled_omits_verdict() {
        let mut r = rules();
        r.lateness_enabled = false;
        let logs = vec![log(1, at(10, 0), None)];
        let status = attendance_status_for_day("EMP0001", monday(), &logs, false, &WorkCalendar::default(), r);
        assert_eq!(status.message, "Checked In");
        assert_eq!(status.is_late, None);
    }
}
