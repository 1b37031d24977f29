//! Attendance records and derived views.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::worked_hours;

/// One clock-in/clock-out pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceLog {
    /// Row id.
    pub id: i64,
    /// Employee id.
    pub employee_id: String,
    /// Clock-in timestamp.
    pub clock_in: NaiveDateTime,
    /// Clock-out timestamp; `None` while the employee is still clocked in.
    pub clock_out: Option<NaiveDateTime>,
    /// Calendar date the log belongs to (the clock-in date).
    pub log_date: NaiveDate,
    /// Where the log came from, e.g. "Manual", "Fingerprint".
    pub source: String,
    /// Free-text notes.
    pub notes: Option<String>,
}

impl AttendanceLog {
    /// Hours between clock-in and clock-out, `None` while open.
    pub fn worked_hours(&self) -> Option<Decimal> {
        worked_hours(Some(self.clock_in), self.clock_out)
    }

    /// True while the log has no clock-out.
    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }
}

/// Totals for an employee over a period.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttendanceSummary {
    /// All hours logged on workdays.
    pub total_hours: Decimal,
    /// Hours up to the standard day length, summed over days.
    pub regular_hours: Decimal,
    /// Hours above the standard day length, summed over days.
    pub overtime_hours: Decimal,
    /// Distinct dates with at least one workday log.
    pub days_attended: u32,
}

/// Where an employee stands on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceStatus {
    /// Employee id.
    pub employee_id: String,
    /// The day described.
    pub date: NaiveDate,
    /// At least one clock-in exists for the day.
    pub checked_in: bool,
    /// Some log of the day has a clock-out.
    pub checked_out: bool,
    /// First clock-in of the day.
    pub first_clock_in: Option<NaiveDateTime>,
    /// Last clock-out of the day.
    pub last_clock_out: Option<NaiveDateTime>,
    /// First clock-in was after the grace period. `None` when lateness is
    /// not assessed (not checked in, day off, on leave, or display disabled).
    pub is_late: Option<bool>,
    /// Minutes after the scheduled start, when late.
    pub lateness_minutes: Option<i64>,
    /// Covered by an approved leave request.
    pub on_leave: bool,
    /// The day is a configured workday and not a holiday.
    pub is_workday: bool,
    /// Human-readable summary, parts joined with `" | "`.
    pub message: String,
}
