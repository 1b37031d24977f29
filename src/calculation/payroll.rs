//! Monthly payslip calculation.
//!
//! A payslip is built in fixed steps, each recorded in the audit trace:
//! basic salary, expected workdays, overtime, allowances (plus the default
//! bonus), deductions (plus the default deduction and lateness penalties),
//! advance repayment, and finally gross and net pay.

use std::time::Instant;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::config::{Policy, keys};
use crate::error::{HrError, HrResult};
use crate::models::{
    AdvanceStatus, AttendanceLog, AuditStep, AuditTrace, PayCategory, PayItem, PayItemKind, PayLine,
    PayTotals, PayrollResult, SalaryAdvance,
};

use super::{late_arrivals, late_penalty, summarize_attendance};

/// Everything a payslip calculation reads.
#[derive(Debug, Clone, Copy)]
pub struct PayrollInput<'a> {
    /// Employee id.
    pub employee_id: &'a str,
    /// Monthly salary.
    pub salary: Decimal,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// Attendance logs dated inside the period.
    pub logs: &'a [AttendanceLog],
    /// The employee's allowances and deductions; items outside the period
    /// are filtered here.
    pub pay_items: &'a [PayItem],
    /// The advance to repay from this payslip, if any.
    pub advance: Option<&'a SalaryAdvance>,
    /// Policy in force.
    pub policy: &'a Policy,
}

fn money(value: Decimal) -> Decimal {
    value.round_dp(2)
}

fn flat_line(category: PayCategory, description: impl Into<String>, amount: Decimal) -> PayLine {
    PayLine {
        category,
        description: description.into(),
        units: Decimal::ONE,
        rate: amount,
        amount,
    }
}

fn step(
    trace: &AuditTrace,
    rule_id: &str,
    rule_name: &str,
    policy_ref: &str,
    input: serde_json::Value,
    output: serde_json::Value,
    reasoning: String,
) -> AuditStep {
    AuditStep {
        step_number: trace.next_step_number(),
        rule_id: rule_id.to_string(),
        rule_name: rule_name.to_string(),
        policy_ref: policy_ref.to_string(),
        input,
        output,
        reasoning,
    }
}

/// Instalment to take from this payslip for an advance.
///
/// Only Active advances whose repayment has started by the period end are
/// repaid. The instalment is capped at the remaining balance.
pub fn advance_instalment(advance: &SalaryAdvance, period_end: NaiveDate) -> Decimal {
    if advance.status != AdvanceStatus::Active || advance.repayment_start_date > period_end {
        return Decimal::ZERO;
    }
    advance
        .repayment_per_period
        .min(advance.remaining())
        .max(Decimal::ZERO)
}

/// Calculates a payslip for one employee and one period.
///
/// # Errors
///
/// Returns [`HrError::InvalidInput`] when the period is reversed or the
/// salary is negative.
///
/// # Example
///
/// ```
/// use hr_engine::calculation::{PayrollInput, calculate_payslip};
/// use hr_engine::config::Policy;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let policy = Policy::default();
/// let input = PayrollInput {
///     employee_id: "EMP0001",
///     salary: Decimal::from(4000),
///     period_start: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
///     period_end: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
///     logs: &[],
///     pay_items: &[],
///     advance: None,
///     policy: &policy,
/// };
/// let result = calculate_payslip(&input).unwrap();
/// assert_eq!(result.totals.net_pay, Decimal::from(4000));
/// assert_eq!(result.totals.expected_workdays, 21);
/// ```
pub fn calculate_payslip(input: &PayrollInput<'_>) -> HrResult<PayrollResult> {
    let started = Instant::now();
    if input.period_end < input.period_start {
        return Err(HrError::invalid(
            "period_end",
            format!(
                "{} is before the period start {}",
                input.period_end, input.period_start
            ),
        ));
    }
    if input.salary < Decimal::ZERO {
        return Err(HrError::invalid("salary", "must not be negative"));
    }

    let schedule = &input.policy.schedule;
    let calendar = input.policy.calendar();
    let mut trace = AuditTrace::default();
    let mut lines: Vec<PayLine> = Vec::new();
    let mut totals = PayTotals::default();

    // Basic salary
    let basic = money(input.salary);
    totals.basic_salary = basic;
    lines.push(flat_line(PayCategory::Basic, "Basic Salary", basic));
    trace.push(step(
        &trace,
        "basic_salary",
        "Basic Salary",
        "",
        serde_json::json!({ "salary": input.salary.normalize().to_string() }),
        serde_json::json!({ "basic_salary": basic.to_string() }),
        "Monthly salary is paid in full for the period".to_string(),
    ));

    // Expected workdays and rates
    let expected = calendar.expected_workdays(input.period_start, input.period_end);
    totals.expected_workdays = expected;
    let std_hours = schedule.standard_work_hours_per_day;
    let (daily_rate, hourly_rate) = if expected == 0 {
        trace.warn(
            "no_workdays",
            format!(
                "No workdays between {} and {}; overtime and lateness penalties are zero",
                input.period_start, input.period_end
            ),
            "medium",
        );
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let daily = input.salary / Decimal::from(expected);
        let hourly = if std_hours > Decimal::ZERO {
            daily / std_hours
        } else {
            Decimal::ZERO
        };
        (daily, hourly)
    };
    trace.push(step(
        &trace,
        "expected_workdays",
        "Expected Workdays",
        keys::WORK_DAYS,
        serde_json::json!({
            "period_start": input.period_start.to_string(),
            "period_end": input.period_end.to_string(),
            "holidays": schedule.public_holidays.len(),
        }),
        serde_json::json!({
            "expected_workdays": expected,
            "daily_rate": money(daily_rate).to_string(),
            "hourly_rate": money(hourly_rate).to_string(),
        }),
        format!(
            "{} workdays expected after excluding non-work days and public holidays",
            expected
        ),
    ));

    // Overtime
    let summary = summarize_attendance(input.logs, &calendar, std_hours);
    totals.days_attended = summary.days_attended;
    totals.overtime_hours = summary.overtime_hours;
    let multiplier = schedule.overtime_rate_multiplier;
    let overtime_rate = hourly_rate * multiplier;
    let overtime_pay = money(summary.overtime_hours * overtime_rate);
    totals.overtime_pay = overtime_pay;
    if overtime_pay > Decimal::ZERO {
        lines.push(PayLine {
            category: PayCategory::Overtime,
            description: format!("Overtime x{}", multiplier.normalize()),
            units: summary.overtime_hours,
            rate: money(overtime_rate),
            amount: overtime_pay,
        });
    }
    trace.push(step(
        &trace,
        "overtime_pay",
        "Overtime Pay",
        keys::OVERTIME_MULTIPLIER,
        serde_json::json!({
            "total_hours": summary.total_hours.normalize().to_string(),
            "overtime_hours": summary.overtime_hours.normalize().to_string(),
            "hourly_rate": money(hourly_rate).to_string(),
            "multiplier": multiplier.normalize().to_string(),
        }),
        serde_json::json!({ "overtime_pay": overtime_pay.to_string() }),
        format!(
            "{} overtime hours x {} hourly x {}",
            summary.overtime_hours.normalize(),
            money(hourly_rate),
            multiplier.normalize()
        ),
    ));

    // Allowances and bonus
    let applicable: Vec<&PayItem> = input
        .pay_items
        .iter()
        .filter(|i| i.applies_to_period(input.period_start, input.period_end))
        .collect();
    let mut total_allowances = Decimal::ZERO;
    for item in applicable.iter().filter(|i| i.kind == PayItemKind::Allowance) {
        total_allowances += item.amount;
        lines.push(flat_line(PayCategory::Allowance, item.item_type.clone(), item.amount));
    }
    let bonus = money(input.salary * schedule.default_bonus_rate);
    if bonus > Decimal::ZERO {
        total_allowances += bonus;
        lines.push(flat_line(PayCategory::Bonus, "Default Bonus", bonus));
    }
    totals.total_allowances = money(total_allowances);
    trace.push(step(
        &trace,
        "allowances",
        "Allowances",
        keys::DEFAULT_BONUS_RATE,
        serde_json::json!({
            "items": applicable.iter().filter(|i| i.kind == PayItemKind::Allowance).count(),
            "bonus_rate": schedule.default_bonus_rate.normalize().to_string(),
        }),
        serde_json::json!({
            "bonus": bonus.to_string(),
            "total_allowances": totals.total_allowances.to_string(),
        }),
        "Recurring allowances in force at period end, one-off allowances dated in the period, and the default bonus".to_string(),
    ));

    // Deductions, default deduction and lateness
    let mut total_deductions = Decimal::ZERO;
    for item in applicable.iter().filter(|i| i.kind == PayItemKind::Deduction) {
        total_deductions += item.amount;
        lines.push(flat_line(PayCategory::Deduction, item.item_type.clone(), item.amount));
    }
    let policy_deduction = money(input.salary * schedule.default_deduction_rate);
    if policy_deduction > Decimal::ZERO {
        total_deductions += policy_deduction;
        lines.push(flat_line(
            PayCategory::PolicyDeduction,
            "Default Deduction",
            policy_deduction,
        ));
    }
    let late = late_arrivals(
        input.logs,
        &calendar,
        schedule.standard_start_time,
        schedule.late_arrival_allowed_minutes,
    );
    totals.late_days = late.len() as u32;
    let penalty = late_penalty(
        schedule.late_arrival_penalty_type,
        schedule.late_arrival_penalty_amount,
        daily_rate,
        totals.late_days,
    );
    if penalty > Decimal::ZERO {
        total_deductions += penalty;
        lines.push(PayLine {
            category: PayCategory::LatePenalty,
            description: format!("Late arrivals ({})", schedule.late_arrival_penalty_type.as_str()),
            units: Decimal::from(totals.late_days),
            rate: money(penalty / Decimal::from(totals.late_days)),
            amount: penalty,
        });
    }
    totals.total_deductions = money(total_deductions);
    trace.push(step(
        &trace,
        "deductions",
        "Deductions",
        keys::LATE_PENALTY_TYPE,
        serde_json::json!({
            "items": applicable.iter().filter(|i| i.kind == PayItemKind::Deduction).count(),
            "deduction_rate": schedule.default_deduction_rate.normalize().to_string(),
            "late_days": totals.late_days,
            "penalty_type": schedule.late_arrival_penalty_type.as_str(),
        }),
        serde_json::json!({
            "default_deduction": policy_deduction.to_string(),
            "late_penalty": penalty.to_string(),
            "total_deductions": totals.total_deductions.to_string(),
        }),
        format!(
            "Stored deductions, the default deduction and penalties for {} late day(s)",
            totals.late_days
        ),
    ));

    // Advance repayment
    let (advance_id, repayment) = match input.advance {
        Some(advance) => {
            let instalment = money(advance_instalment(advance, input.period_end));
            if instalment > Decimal::ZERO {
                (Some(advance.id), instalment)
            } else {
                (None, Decimal::ZERO)
            }
        }
        None => (None, Decimal::ZERO),
    };
    totals.advance_repayment = repayment;
    if repayment > Decimal::ZERO {
        lines.push(flat_line(
            PayCategory::AdvanceRepayment,
            "Salary Advance Repayment",
            repayment,
        ));
    }
    trace.push(step(
        &trace,
        "advance_repayment",
        "Salary Advance Repayment",
        "",
        serde_json::json!({
            "advance_id": input.advance.map(|a| a.id),
            "remaining": input.advance.map(|a| a.remaining().normalize().to_string()),
        }),
        serde_json::json!({ "repayment": repayment.to_string() }),
        match input.advance {
            Some(_) if repayment > Decimal::ZERO => {
                "Instalment capped at the remaining advance balance".to_string()
            }
            Some(_) => "Advance not yet due or already repaid".to_string(),
            None => "No active advance".to_string(),
        },
    ));

    // Gross and net
    totals.gross_salary = money(basic + overtime_pay + totals.total_allowances);
    totals.net_pay = money(totals.gross_salary - totals.total_deductions - repayment);
    if totals.net_pay < Decimal::ZERO {
        trace.warn(
            "negative_net_pay",
            format!("Net pay is negative ({})", totals.net_pay),
            "high",
        );
    }
    trace.push(step(
        &trace,
        "net_pay",
        "Gross and Net Pay",
        "",
        serde_json::json!({
            "basic_salary": basic.to_string(),
            "overtime_pay": overtime_pay.to_string(),
            "total_allowances": totals.total_allowances.to_string(),
            "total_deductions": totals.total_deductions.to_string(),
            "advance_repayment": repayment.to_string(),
        }),
        serde_json::json!({
            "gross_salary": totals.gross_salary.to_string(),
            "net_pay": totals.net_pay.to_string(),
        }),
        "Gross is basic plus overtime plus allowances; net subtracts deductions and advance repayment".to_string(),
    ));

    trace.duration_us = started.elapsed().as_micros() as u64;
    let calculation_id = Uuid::new_v4();
    debug!(
        calculation_id = %calculation_id,
        employee_id = %input.employee_id,
        net_pay = %totals.net_pay,
        "Payslip calculated"
    );

    Ok(PayrollResult {
        calculation_id,
        timestamp: Utc::now(),
        employee_id: input.employee_id.to_string(),
        period_start: input.period_start,
        period_end: input.period_end,
        lines,
        totals,
        advance_id,
        audit_trace: trace,
    })
}
