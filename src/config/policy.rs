//! Runtime policy: configuration defaults overlaid by the `app_settings` table.
//!
//! The YAML file supplies defaults. Administrators can change individual
//! settings at runtime, which are stored as text key/value rows. A stored
//! value that fails to parse is ignored with a warning and the default
//! stays in effect.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::warn;

use crate::calculation::WorkCalendar;

use super::types::{
    AlertsConfig, AppConfig, GeneralConfig, LatePenaltyType, VacationMethod, WorkScheduleConfig,
};

/// Keys used in the `app_settings` table.
pub mod keys {
    /// Scheduled start time (`HH:MM:SS`).
    pub const STANDARD_START_TIME: &str = "standard_start_time";
    /// Scheduled end time (`HH:MM:SS`).
    pub const STANDARD_END_TIME: &str = "standard_end_time";
    /// Hours in a standard day.
    pub const STANDARD_WORK_HOURS: &str = "standard_work_hours_per_day";
    /// Comma separated weekday indices, 0 = Monday.
    pub const WORK_DAYS: &str = "work_days_indices";
    /// Overtime multiplier.
    pub const OVERTIME_MULTIPLIER: &str = "overtime_rate_multiplier";
    /// Lateness grace minutes.
    pub const LATE_ALLOWED_MINUTES: &str = "late_arrival_allowed_minutes";
    /// Lateness penalty type label.
    pub const LATE_PENALTY_TYPE: &str = "late_arrival_penalty_type";
    /// Lateness penalty amount.
    pub const LATE_PENALTY_AMOUNT: &str = "late_arrival_penalty_amount";
    /// Lunch break minutes.
    pub const LUNCH_BREAK_MINUTES: &str = "standard_lunch_break_minutes";
    /// Instant lateness display flag.
    pub const INSTANT_LATENESS_DISPLAY: &str = "enable_instant_lateness_display";
    /// Absence alert flag.
    pub const ABSENCE_ALERT_ENABLED: &str = "enable_absence_alert";
    /// Absence alert cutoff (`HH:MM:SS`).
    pub const ABSENCE_ALERT_CUTOFF: &str = "absence_alert_cutoff_time";
    /// Repeated lateness alert flag.
    pub const LATENESS_ALERT_ENABLED: &str = "enable_repeated_lateness_alert";
    /// Repeated lateness threshold count.
    pub const LATENESS_ALERT_THRESHOLD: &str = "lateness_alert_threshold_count";
    /// Repeated lateness window in days.
    pub const LATENESS_ALERT_PERIOD: &str = "lateness_alert_period_days";
    /// Vacation carry-over cap.
    pub const MAX_CARRY_OVER: &str = "max_vacation_carry_over_days";
    /// Vacation method label.
    pub const VACATION_METHOD: &str = "vacation_calculation_method";
    /// Default yearly vacation days.
    pub const DEFAULT_ANNUAL_LEAVE: &str = "default_annual_leave_days";
    /// Department busy threshold percentage.
    pub const LEAVE_BUSY_THRESHOLD: &str = "leave_busy_threshold_percent_dept";
    /// Comma separated `YYYY-MM-DD` public holidays.
    pub const PUBLIC_HOLIDAYS: &str = "public_holidays_list";
    /// Default deduction rate.
    pub const DEFAULT_DEDUCTION_RATE: &str = "default_deduction_rate";
    /// Default bonus rate.
    pub const DEFAULT_BONUS_RATE: &str = "default_bonus_rate";
    /// Default leave approver user id.
    pub const DEFAULT_LEAVE_APPROVER: &str = "default_leave_approver_user_id";
    /// Default contract approver user id.
    pub const DEFAULT_CONTRACT_APPROVER: &str = "default_contract_approver_user_id";
    /// Employee id prefix.
    pub const EMPLOYEE_ID_PREFIX: &str = "employee_id_prefix";
}

/// The policy in force for a given database.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Policy {
    /// General settings.
    pub general: GeneralConfig,
    /// Work schedule and payroll policy.
    pub schedule: WorkScheduleConfig,
    /// Alert settings.
    pub alerts: AlertsConfig,
}

impl Policy {
    /// Builds the policy from configuration defaults.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            general: config.general.clone(),
            schedule: config.work_schedule.clone(),
            alerts: config.alerts.clone(),
        }
    }

    /// The working calendar implied by this policy.
    pub fn calendar(&self) -> WorkCalendar {
        WorkCalendar::new(
            &self.schedule.work_days,
            self.schedule.public_holidays.iter().copied(),
        )
    }

    /// Overlays a stored setting.
    ///
    /// Returns `false` when the key is unknown or the value does not parse;
    /// the current value is kept in both cases.
    pub fn apply_setting(&mut self, key: &str, value: &str) -> bool {
        let s = &mut self.schedule;
        let a = &mut self.alerts;
        let g = &mut self.general;
        let applied = match key {
            keys::STANDARD_START_TIME => set(&mut s.standard_start_time, parse_time(value)),
            keys::STANDARD_END_TIME => set(&mut s.standard_end_time, parse_time(value)),
            keys::STANDARD_WORK_HOURS => {
                set(&mut s.standard_work_hours_per_day, parse_positive(value))
            }
            keys::WORK_DAYS => set(&mut s.work_days, parse_work_days(value)),
            keys::OVERTIME_MULTIPLIER => set(&mut s.overtime_rate_multiplier, parse_positive(value)),
            keys::LATE_ALLOWED_MINUTES => {
                set(&mut s.late_arrival_allowed_minutes, parse_non_negative_int(value))
            }
            keys::LATE_PENALTY_TYPE => {
                set(&mut s.late_arrival_penalty_type, LatePenaltyType::parse(value))
            }
            keys::LATE_PENALTY_AMOUNT => {
                set(&mut s.late_arrival_penalty_amount, parse_non_negative(value))
            }
            keys::LUNCH_BREAK_MINUTES => {
                set(&mut s.standard_lunch_break_minutes, parse_non_negative_int(value))
            }
            keys::INSTANT_LATENESS_DISPLAY => {
                set(&mut s.enable_instant_lateness_display, parse_bool(value))
            }
            keys::ABSENCE_ALERT_ENABLED => set(&mut a.enable_absence_alert, parse_bool(value)),
            keys::ABSENCE_ALERT_CUTOFF => set(&mut a.absence_alert_cutoff_time, parse_time(value)),
            keys::LATENESS_ALERT_ENABLED => {
                set(&mut a.enable_repeated_lateness_alert, parse_bool(value))
            }
            keys::LATENESS_ALERT_THRESHOLD => set(
                &mut a.lateness_alert_threshold_count,
                value.trim().parse::<usize>().ok(),
            ),
            keys::LATENESS_ALERT_PERIOD => {
                set(&mut a.lateness_alert_period_days, parse_non_negative_int(value))
            }
            keys::MAX_CARRY_OVER => {
                set(&mut s.max_vacation_carry_over_days, parse_non_negative_int(value))
            }
            keys::VACATION_METHOD => {
                set(&mut s.vacation_calculation_method, VacationMethod::parse(value))
            }
            keys::DEFAULT_ANNUAL_LEAVE => {
                set(&mut s.default_annual_leave_days, parse_non_negative_int(value))
            }
            keys::LEAVE_BUSY_THRESHOLD => {
                set(&mut s.leave_busy_threshold_percent, parse_non_negative(value))
            }
            keys::PUBLIC_HOLIDAYS => set(&mut s.public_holidays, Some(parse_holidays(value))),
            keys::DEFAULT_DEDUCTION_RATE => {
                set(&mut s.default_deduction_rate, parse_non_negative(value))
            }
            keys::DEFAULT_BONUS_RATE => set(&mut s.default_bonus_rate, parse_non_negative(value)),
            keys::DEFAULT_LEAVE_APPROVER => set(
                &mut g.default_leave_approver_user_id,
                value.trim().parse::<i64>().ok(),
            ),
            keys::DEFAULT_CONTRACT_APPROVER => set(
                &mut g.default_contract_approver_user_id,
                value.trim().parse::<i64>().ok(),
            ),
            keys::EMPLOYEE_ID_PREFIX => {
                let prefix = value.trim();
                set(
                    &mut g.employee_id_prefix,
                    (!prefix.is_empty()).then(|| prefix.to_string()),
                )
            }
            _ => return false,
        };
        if !applied {
            warn!(setting = key, value, "ignoring unparseable setting");
        }
        applied
    }

    /// The policy rendered as `app_settings` rows.
    pub fn to_settings(&self) -> Vec<(&'static str, String)> {
        let s = &self.schedule;
        let a = &self.alerts;
        let g = &self.general;
        vec![
            (keys::STANDARD_START_TIME, s.standard_start_time.format("%H:%M:%S").to_string()),
            (keys::STANDARD_END_TIME, s.standard_end_time.format("%H:%M:%S").to_string()),
            (keys::STANDARD_WORK_HOURS, s.standard_work_hours_per_day.to_string()),
            (
                keys::WORK_DAYS,
                s.work_days
                    .iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            (keys::OVERTIME_MULTIPLIER, s.overtime_rate_multiplier.to_string()),
            (keys::LATE_ALLOWED_MINUTES, s.late_arrival_allowed_minutes.to_string()),
            (keys::LATE_PENALTY_TYPE, s.late_arrival_penalty_type.as_str().to_string()),
            (keys::LATE_PENALTY_AMOUNT, s.late_arrival_penalty_amount.to_string()),
            (keys::LUNCH_BREAK_MINUTES, s.standard_lunch_break_minutes.to_string()),
            (keys::INSTANT_LATENESS_DISPLAY, bool_label(s.enable_instant_lateness_display)),
            (keys::ABSENCE_ALERT_ENABLED, bool_label(a.enable_absence_alert)),
            (
                keys::ABSENCE_ALERT_CUTOFF,
                a.absence_alert_cutoff_time.format("%H:%M:%S").to_string(),
            ),
            (keys::LATENESS_ALERT_ENABLED, bool_label(a.enable_repeated_lateness_alert)),
            (keys::LATENESS_ALERT_THRESHOLD, a.lateness_alert_threshold_count.to_string()),
            (keys::LATENESS_ALERT_PERIOD, a.lateness_alert_period_days.to_string()),
            (keys::MAX_CARRY_OVER, s.max_vacation_carry_over_days.to_string()),
            (keys::VACATION_METHOD, s.vacation_calculation_method.as_str().to_string()),
            (keys::DEFAULT_ANNUAL_LEAVE, s.default_annual_leave_days.to_string()),
            (keys::LEAVE_BUSY_THRESHOLD, s.leave_busy_threshold_percent.to_string()),
            (
                keys::PUBLIC_HOLIDAYS,
                s.public_holidays
                    .iter()
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            (keys::DEFAULT_DEDUCTION_RATE, s.default_deduction_rate.to_string()),
            (keys::DEFAULT_BONUS_RATE, s.default_bonus_rate.to_string()),
            (keys::DEFAULT_LEAVE_APPROVER, g.default_leave_approver_user_id.to_string()),
            (keys::DEFAULT_CONTRACT_APPROVER, g.default_contract_approver_user_id.to_string()),
            (keys::EMPLOYEE_ID_PREFIX, g.employee_id_prefix.clone()),
        ]
    }
}

fn set<T>(slot: &mut T, parsed: Option<T>) -> bool {
    match parsed {
        Some(v) => {
            *slot = v;
            true
        }
        None => false,
    }
}

fn bool_label(value: bool) -> String {
    let label = if value { "True" } else { "False" };
    label.to_string()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    let v = value.trim();
    NaiveTime::parse_from_str(v, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(v, "%H:%M"))
        .ok()
}

fn parse_positive(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.trim())
        .ok()
        .filter(|d| *d > Decimal::ZERO)
}

fn parse_non_negative(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.trim())
        .ok()
        .filter(|d| *d >= Decimal::ZERO)
}

fn parse_non_negative_int(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok().filter(|v| *v >= 0)
}

/// Parses `"0,1,2,3,4"`. Indices outside 0..=6 reject the whole value.
fn parse_work_days(value: &str) -> Option<Vec<u32>> {
    let mut days = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let day = part.parse::<u32>().ok().filter(|d| *d <= 6)?;
        if !days.contains(&day) {
            days.push(day);
        }
    }
    Some(days)
}

/// Parses `"2025-01-01, 2025-12-25"`. Malformed entries are skipped.
fn parse_holidays(value: &str) -> Vec<NaiveDate> {
    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .filter_map(|p| match NaiveDate::parse_from_str(p, "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                warn!(entry = p, "skipping malformed public holiday");
                None
            }
        })
        .collect()
}
