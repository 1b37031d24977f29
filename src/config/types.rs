//! Configuration types for the HR engine.
//!
//! These structures are deserialized from the YAML configuration file.
//! Every section and field has a default, so a partial file (or none of a
//! section) is valid.

use chrono::{NaiveDate, NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a late arrival is penalised on the payslip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LatePenaltyType {
    /// Lateness is tracked but not deducted.
    #[default]
    #[serde(rename = "None")]
    None,
    /// A fixed amount is deducted per late day.
    #[serde(rename = "Fixed Amount")]
    FixedAmount,
    /// A percentage of the daily rate is deducted per late day.
    #[serde(rename = "Percentage of Daily Rate")]
    PercentageOfDailyRate,
}

impl LatePenaltyType {
    /// The label stored in `app_settings`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LatePenaltyType::None => "None",
            LatePenaltyType::FixedAmount => "Fixed Amount",
            LatePenaltyType::PercentageOfDailyRate => "Percentage of Daily Rate",
        }
    }

    /// Parses a stored label.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "None" => Some(LatePenaltyType::None),
            "Fixed Amount" => Some(LatePenaltyType::FixedAmount),
            "Percentage of Daily Rate" => Some(LatePenaltyType::PercentageOfDailyRate),
            _ => None,
        }
    }
}

/// How the yearly vacation allocation becomes available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VacationMethod {
    /// The whole allocation is available from the first day of the year.
    #[default]
    #[serde(rename = "Fixed Annual Allocation")]
    FixedAnnualAllocation,
    /// One twelfth of the allocation is earned per completed month.
    #[serde(rename = "Monthly Accrual")]
    MonthlyAccrual,
}

impl VacationMethod {
    /// The label stored in `app_settings`.
    pub fn as_str(&self) -> &'static str {
        match self {
            VacationMethod::FixedAnnualAllocation => "Fixed Annual Allocation",
            VacationMethod::MonthlyAccrual => "Monthly Accrual",
        }
    }

    /// Parses a stored label.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Fixed Annual Allocation" => Some(VacationMethod::FixedAnnualAllocation),
            "Monthly Accrual" => Some(VacationMethod::MonthlyAccrual),
            _ => None,
        }
    }
}

/// Database location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path of the SQLite file.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "hr_system.db".to_string(),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Prefix for generated employee ids (e.g. "EMP" gives "EMP0001").
    pub employee_id_prefix: String,
    /// User id that approves leave when the employee has no manager account.
    pub default_leave_approver_user_id: i64,
    /// User id that approves contracts when the employee has no manager account.
    pub default_contract_approver_user_id: i64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            employee_id_prefix: "EMP".to_string(),
            default_leave_approver_user_id: 1,
            default_contract_approver_user_id: 1,
        }
    }
}

/// Working hours, overtime, lateness and leave policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkScheduleConfig {
    /// Working weekdays as indices, 0 = Monday through 6 = Sunday.
    pub work_days: Vec<u32>,
    /// Scheduled start of the working day.
    pub standard_start_time: NaiveTime,
    /// Scheduled end of the working day.
    pub standard_end_time: NaiveTime,
    /// Hours that make up a full working day; anything above is overtime.
    pub standard_work_hours_per_day: Decimal,
    /// Multiplier applied to the hourly rate for overtime hours.
    pub overtime_rate_multiplier: Decimal,
    /// Grace period after the start time before an arrival counts as late.
    pub late_arrival_allowed_minutes: i64,
    /// How lateness is penalised.
    pub late_arrival_penalty_type: LatePenaltyType,
    /// Fixed amount, or percentage, depending on the penalty type.
    pub late_arrival_penalty_amount: Decimal,
    /// Unpaid lunch break length in minutes.
    pub standard_lunch_break_minutes: i64,
    /// Maximum number of unused vacation days carried into the next year.
    pub max_vacation_carry_over_days: i64,
    /// How the vacation allocation is earned.
    pub vacation_calculation_method: VacationMethod,
    /// Vacation days given to new employees when none are specified.
    pub default_annual_leave_days: i64,
    /// Company-wide public holidays.
    pub public_holidays: Vec<NaiveDate>,
    /// Bonus paid every period as a fraction of basic salary.
    pub default_bonus_rate: Decimal,
    /// Deduction taken every period as a fraction of basic salary.
    pub default_deduction_rate: Decimal,
    /// Department absence percentage at which new leave is flagged as busy.
    pub leave_busy_threshold_percent: Decimal,
    /// Show lateness as soon as an employee clocks in.
    pub enable_instant_lateness_display: bool,
}

impl Default for WorkScheduleConfig {
    fn default() -> Self {
        Self {
            work_days: vec![0, 1, 2, 3, 4],
            standard_start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            standard_end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            standard_work_hours_per_day: Decimal::from(8),
            overtime_rate_multiplier: Decimal::new(15, 1),
            late_arrival_allowed_minutes: 15,
            late_arrival_penalty_type: LatePenaltyType::None,
            late_arrival_penalty_amount: Decimal::ZERO,
            standard_lunch_break_minutes: 60,
            max_vacation_carry_over_days: 5,
            vacation_calculation_method: VacationMethod::FixedAnnualAllocation,
            default_annual_leave_days: 21,
            public_holidays: Vec::new(),
            default_bonus_rate: Decimal::ZERO,
            default_deduction_rate: Decimal::ZERO,
            leave_busy_threshold_percent: Decimal::from(30),
            enable_instant_lateness_display: true,
        }
    }
}

/// Alert thresholds and scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Notify about employees who have not clocked in by the cutoff.
    pub enable_absence_alert: bool,
    /// Time of day after which a missing clock-in counts as an absence.
    pub absence_alert_cutoff_time: NaiveTime,
    /// Notify about employees who are late repeatedly.
    pub enable_repeated_lateness_alert: bool,
    /// Late arrivals within the window that trigger the alert.
    pub lateness_alert_threshold_count: usize,
    /// Length of the lateness window in days.
    pub lateness_alert_period_days: i64,
    /// Absences in a report period that trigger an absence alert.
    pub min_unexcused_absence_days_for_alert: usize,
    /// Late arrivals in a report period that trigger a tardiness alert.
    pub tardy_threshold_for_report: usize,
    /// Send weekly statistics.
    pub weekly_stats_enabled: bool,
    /// Weekday on which weekly statistics are sent.
    pub weekly_stats_day: Weekday,
    /// Time after which weekly statistics are sent.
    pub weekly_stats_time: NaiveTime,
    /// Seconds between scheduler ticks.
    pub poll_interval_secs: u64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enable_absence_alert: true,
            absence_alert_cutoff_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            enable_repeated_lateness_alert: true,
            lateness_alert_threshold_count: 3,
            lateness_alert_period_days: 7,
            min_unexcused_absence_days_for_alert: 3,
            tardy_threshold_for_report: 3,
            weekly_stats_enabled: true,
            weekly_stats_day: Weekday::Mon,
            weekly_stats_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            poll_interval_secs: 60,
        }
    }
}

/// Company identity shown on payslips and reports.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyConfig {
    /// Company name.
    pub name: String,
    /// Postal address.
    pub address: String,
    /// Contact phone.
    pub phone: String,
}

/// The complete application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database location.
    pub database: DatabaseConfig,
    /// General settings.
    pub general: GeneralConfig,
    /// Work schedule and payroll policy.
    pub work_schedule: WorkScheduleConfig,
    /// Alert settings.
    pub alerts: AlertsConfig,
    /// Company identity.
    pub company: CompanyConfig,
}
