//! Payslip generation for one employee or the whole payroll.

use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{PayrollInput, calculate_payslip};
use crate::error::{HrError, HrResult};
use crate::models::{EmployeeStatus, PayrollResult};
use crate::store::Database;

/// Calculates, without saving, the payslip of an active employee.
///
/// # Errors
///
/// - [`HrError::InvalidInput`] when `end` is before `start`
/// - [`HrError::EmployeeNotFound`] for unknown or archived employees
/// - [`HrError::InvalidInput`] when the employee is not Active
pub fn calculate_payroll_for_employee(
    db: &Database,
    employee_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> HrResult<PayrollResult> {
    if end < start {
        return Err(HrError::invalid(
            "period_end",
            format!("{} is before the period start {}", end, start),
        ));
    }
    let employee = db.get_employee(employee_id, false)?;
    if employee.status != EmployeeStatus::Active {
        return Err(HrError::invalid(
            "employee_id",
            format!("{} is '{}', payroll needs an Active employee", employee_id, employee.status),
        ));
    }

    let policy = db.load_policy()?;
    let logs = db.logs_for_period(employee_id, start, end)?;
    let pay_items = db.pay_items_for_period(employee_id, start, end)?;
    let advance = db.active_advance_for_repayment(employee_id, end)?;

    calculate_payslip(&PayrollInput {
        employee_id,
        salary: employee.salary,
        period_start: start,
        period_end: end,
        logs: &logs,
        pay_items: &pay_items,
        advance: advance.as_ref(),
        policy: &policy,
    })
}

/// Calculates and records a payslip. Returns the payslip id with the
/// calculation.
pub fn generate_payslip(
    db: &Database,
    employee_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    notes: Option<&str>,
) -> HrResult<(i64, PayrollResult)> {
    let result = calculate_payroll_for_employee(db, employee_id, start, end)?;
    let payslip_id = db.record_payslip(&result, notes)?;
    Ok((payslip_id, result))
}

/// Outcome of [`run_payroll`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRunReport {
    /// Identifies the run in logs.
    pub run_id: Uuid,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// `(employee id, payslip id, net pay)` for each payslip recorded.
    pub generated: Vec<(String, i64, Decimal)>,
    /// `(employee id, error message)` for each employee that failed.
    pub failures: Vec<(String, String)>,
    /// Sum of net pay over the generated payslips.
    pub total_net_pay: Decimal,
    /// Wall time in microseconds.
    pub duration_us: u64,
}

/// Generates payslips for every active employee.
///
/// A failure for one employee (for example a payslip already recorded for
/// the period) is collected in the report and the run continues.
pub fn run_payroll(db: &Database, start: NaiveDate, end: NaiveDate) -> HrResult<PayrollRunReport> {
    let started = Instant::now();
    let run_id = Uuid::new_v4();
    if end < start {
        return Err(HrError::invalid(
            "period_end",
            format!("{} is before the period start {}", end, start),
        ));
    }
    let employees = db.active_employees()?;
    info!(%run_id, %start, %end, employees = employees.len(), "payroll run started");

    let mut report = PayrollRunReport {
        run_id,
        period_start: start,
        period_end: end,
        generated: Vec::new(),
        failures: Vec::new(),
        total_net_pay: Decimal::ZERO,
        duration_us: 0,
    };
    for employee in employees {
        match generate_payslip(db, &employee.id, start, end, None) {
            Ok((payslip_id, result)) => {
                report.total_net_pay += result.totals.net_pay;
                report
                    .generated
                    .push((employee.id, payslip_id, result.totals.net_pay));
            }
            Err(err) => {
                warn!(%run_id, employee_id = %employee.id, error = %err, "payslip not generated");
                report.failures.push((employee.id, err.to_string()));
            }
        }
    }
    report.duration_us = started.elapsed().as_micros() as u64;
    info!(
        %run_id,
        generated = report.generated.len(),
        failed = report.failures.len(),
        total_net_pay = %report.total_net_pay,
        duration_us = report.duration_us,
        "payroll run finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewSalaryAdvance, PayItem, PayItemKind};
    use crate::store::{SOURCE_MANUAL, test_support};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    #[test]
    fn test_calculation_reads_stored_inputs() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 4200);
        db.add_pay_item(&PayItem {
            id: 0,
            employee_id: emp.clone(),
            kind: PayItemKind::Allowance,
            item_type: "Housing".to_string(),
            amount: Decimal::from(300),
            is_recurring: true,
            effective_date: d(1),
            end_date: None,
        })
        .unwrap();
        db.add_salary_advance(&NewSalaryAdvance {
            employee_id: emp.clone(),
            advance_date: d(1),
            amount: Decimal::from(500),
            repayment_per_period: Decimal::from(250),
            repayment_start_date: d(1),
        })
        .unwrap();

        let result = calculate_payroll_for_employee(&db, &emp, d(1), d(31)).unwrap();
        assert_eq!(result.totals.total_allowances, Decimal::from(300));
        assert_eq!(result.totals.advance_repayment, Decimal::from(250));
        assert_eq!(result.totals.net_pay, Decimal::from(4250));
        assert!(result.advance_id.is_some());
    }

    #[test]
    fn test_reversed_period_rejected() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 4200);
        assert!(matches!(
            calculate_payroll_for_employee(&db, &emp, d(31), d(1)),
            Err(HrError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_inactive_employee_rejected() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 4200);
        db.set_status(&emp, EmployeeStatus::Suspended, d(1)).unwrap();
        assert!(matches!(
            calculate_payroll_for_employee(&db, &emp, d(1), d(31)),
            Err(HrError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_overtime_from_logs() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 4200);
        // Monday 3 March, 10 hours.
        db.insert_log(
            &emp,
            d(3).and_hms_opt(8, 0, 0).unwrap(),
            Some(d(3).and_hms_opt(18, 0, 0).unwrap()),
            SOURCE_MANUAL,
            None,
        )
        .unwrap();
        let result = calculate_payroll_for_employee(&db, &emp, d(1), d(31)).unwrap();
        assert_eq!(result.totals.overtime_hours, Decimal::from(2));
        // 4200 / 21 / 8 = 25 per hour, x1.5 x2h
        assert_eq!(result.totals.overtime_pay, Decimal::from(75));
    }

    #[test]
    fn test_run_collects_failures_and_continues() {
        let db = test_support::db();
        let a = test_support::employee(&db, "Ana", 4200);
        let b = test_support::employee(&db, "Ben", 2100);
        generate_payslip(&db, &a, d(1), d(31), None).unwrap();

        let report = run_payroll(&db, d(1), d(31)).unwrap();
        assert_eq!(report.generated.len(), 1);
        assert_eq!(report.generated[0].0, b);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, a);
        assert_eq!(report.total_net_pay, Decimal::from(2100));
    }
}
