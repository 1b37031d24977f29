//! Daily overtime detection and attendance summaries.
//!
//! Hours above the standard day length count as overtime. The split is
//! made per calendar day, so a long Monday is not offset by a short Tuesday.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::keys;
use crate::models::{AttendanceLog, AttendanceSummary, AuditStep};

use super::WorkCalendar;

/// The result of detecting daily overtime for one day.
///
/// Contains the split between regular hours and overtime hours,
/// along with the audit step documenting the detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyOvertimeDetection {
    /// Hours up to the threshold.
    pub regular_hours: Decimal,
    /// Hours exceeding the threshold.
    pub overtime_hours: Decimal,
    /// The audit step recording this detection.
    pub audit_step: AuditStep,
}

/// Default standard day length in hours.
pub const DEFAULT_DAILY_OVERTIME_THRESHOLD: Decimal = Decimal::from_parts(8, 0, 0, false, 0);

/// Splits a day's hours into `(regular, overtime)` at `threshold`.
pub fn split_overtime(worked_hours: Decimal, threshold: Decimal) -> (Decimal, Decimal) {
    (
        worked_hours.min(threshold),
        (worked_hours - threshold).max(Decimal::ZERO),
    )
}

/// Splits hours worked in a day into regular and overtime hours.
///
/// # Arguments
///
/// * `worked_hours` - The total hours worked on the day
/// * `threshold` - The standard day length
/// * `step_number` - The step number for audit trail sequencing
///
/// # Examples
///
/// ```
/// use hr_engine::calculation::{detect_daily_overtime, DEFAULT_DAILY_OVERTIME_THRESHOLD};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let worked = Decimal::from_str("10.0").unwrap();
/// let result = detect_daily_overtime(worked, DEFAULT_DAILY_OVERTIME_THRESHOLD, 1);
///
/// assert_eq!(result.regular_hours, Decimal::from_str("8.0").unwrap());
/// assert_eq!(result.overtime_hours, Decimal::from_str("2.0").unwrap());
/// ```
pub fn detect_daily_overtime(
    worked_hours: Decimal,
    threshold: Decimal,
    step_number: u32,
) -> DailyOvertimeDetection {
    let (regular_hours, overtime_hours) = split_overtime(worked_hours, threshold);

    let reasoning = if overtime_hours > Decimal::ZERO {
        format!(
            "{} hours worked exceeds {} hour standard day by {} hours",
            worked_hours.normalize(),
            threshold.normalize(),
            overtime_hours.normalize()
        )
    } else {
        format!(
            "{} hours worked is within the {} hour standard day, no overtime",
            worked_hours.normalize(),
            threshold.normalize()
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "daily_overtime_detection".to_string(),
        rule_name: "Daily Overtime Detection".to_string(),
        policy_ref: keys::STANDARD_WORK_HOURS.to_string(),
        input: serde_json::json!({
            "worked_hours": worked_hours.normalize().to_string(),
            "threshold": threshold.normalize().to_string()
        }),
        output: serde_json::json!({
            "regular_hours": regular_hours.normalize().to_string(),
            "overtime_hours": overtime_hours.normalize().to_string()
        }),
        reasoning,
    };

    DailyOvertimeDetection {
        regular_hours,
        overtime_hours,
        audit_step,
    }
}

/// Hours per date for closed logs on working weekdays.
///
/// Public holidays are not excluded here: hours actually worked on a
/// holiday that falls on a working weekday still count.
pub fn daily_hours(logs: &[AttendanceLog], calendar: &WorkCalendar) -> BTreeMap<NaiveDate, Decimal> {
    let mut per_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for log in logs {
        if !calendar.is_work_weekday(log.log_date) {
            continue;
        }
        if let Some(hours) = log.worked_hours() {
            *per_day.entry(log.log_date).or_default() += hours;
        }
    }
    per_day
}

/// Summarises a period of attendance logs.
///
/// Only logs dated on a working weekday count, for hours and for
/// `days_attended` alike: weekend work is neither paid as overtime here nor
/// counted as an attended day. Open logs count towards attendance but
/// contribute no hours.
pub fn summarize_attendance(
    logs: &[AttendanceLog],
    calendar: &WorkCalendar,
    standard_hours: Decimal,
) -> AttendanceSummary {
    let per_day = daily_hours(logs, calendar);

    let mut summary = AttendanceSummary::default();
    for hours in per_day.values() {
        let (regular, overtime) = split_overtime(*hours, standard_hours);
        summary.total_hours += *hours;
        summary.regular_hours += regular;
        summary.overtime_hours += overtime;
    }

    let attended: std::collections::BTreeSet<NaiveDate> = logs
        .iter()
        .map(|l| l.log_date)
        .filter(|d| calendar.is_work_weekday(*d))
        .collect();
    summary.days_attended = attended.len() as u32;
    summary
}
