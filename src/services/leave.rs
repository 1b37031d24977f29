//! Leave requests with department load, and vacation balances.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::calculation::{DepartmentLoad, VacationBalance, VacationRules, department_load, vacation_balance};
use crate::config::Policy;
use crate::error::HrResult;
use crate::models::{Employee, LeaveRequest, NewLeaveRequest};
use crate::store::Database;

/// Result of [`request_leave`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequestOutcome {
    /// The stored request.
    pub request_id: i64,
    /// Department load over the requested dates; `None` without a department.
    pub department_load: Option<DepartmentLoad>,
    /// Overlapping approved leave of colleagues, with their names.
    pub concurrent_leaves: Vec<(LeaveRequest, String)>,
}

impl LeaveRequestOutcome {
    /// True when the department is at or over the busy threshold.
    pub fn department_busy(&self) -> bool {
        self.department_load.as_ref().is_some_and(|l| l.is_busy)
    }
}

/// Files a leave request and reports how busy the department is.
///
/// The request is stored even when the department is busy; the flag is
/// advice for the approver.
pub fn request_leave(db: &Database, new: &NewLeaveRequest) -> HrResult<LeaveRequestOutcome> {
    let request_id = db.add_leave_request(new)?;
    let employee = db.get_employee(&new.employee_id, false)?;

    let Some(department_id) = employee.department_id else {
        return Ok(LeaveRequestOutcome {
            request_id,
            department_load: None,
            concurrent_leaves: Vec::new(),
        });
    };

    let concurrent = db.concurrent_department_leaves(
        department_id,
        new.start_date,
        new.end_date,
        &new.employee_id,
    )?;
    let colleagues: BTreeSet<&str> = concurrent.iter().map(|(r, _)| r.employee_id.as_str()).collect();
    let headcount = db.active_employee_count(department_id)?;
    let threshold = db.load_policy()?.schedule.leave_busy_threshold_percent;
    let load = department_load(headcount, colleagues.len() as u32, threshold);
    if load.is_busy {
        warn!(
            request_id,
            department_id,
            percent_on_leave = %load.percent_on_leave,
            "leave requested while department is busy"
        );
    } else {
        info!(request_id, department_id, "department load checked");
    }
    Ok(LeaveRequestOutcome {
        request_id,
        department_load: Some(load),
        concurrent_leaves: concurrent,
    })
}

fn vacation_rules(policy: &Policy) -> VacationRules {
    VacationRules {
        method: policy.schedule.vacation_calculation_method,
        max_carry_over_days: policy.schedule.max_vacation_carry_over_days,
    }
}

fn balance_for(db: &Database, policy: &Policy, employee: &Employee, as_of: NaiveDate) -> HrResult<VacationBalance> {
    let ranges = db.approved_vacation_ranges(&employee.id)?;
    Ok(vacation_balance(
        employee.vacation_days,
        employee.exclude_vacation_policy,
        employee.start_date,
        &ranges,
        as_of,
        vacation_rules(policy),
    ))
}

/// An employee's vacation balance for the year of `as_of`.
pub fn vacation_balance_for(db: &Database, employee_id: &str, as_of: NaiveDate) -> HrResult<VacationBalance> {
    let employee = db.get_employee(employee_id, true)?;
    balance_for(db, &db.load_policy()?, &employee, as_of)
}

/// One row of [`leave_balance_report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveBalanceRow {
    /// Employee id.
    pub employee_id: String,
    /// Employee name.
    pub employee_name: String,
    /// Their balance.
    pub balance: VacationBalance,
}

/// Vacation balances of all active employees, by name.
pub fn leave_balance_report(db: &Database, as_of: NaiveDate) -> HrResult<Vec<LeaveBalanceRow>> {
    let policy = db.load_policy()?;
    db.active_employees()?
        .into_iter()
        .map(|employee| {
            let balance = balance_for(db, &policy, &employee, as_of)?;
            Ok(LeaveBalanceRow {
                employee_id: employee.id,
                employee_name: employee.name,
                balance,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LeaveStatus, NewEmployee};
    use crate::store::test_support;
    use rust_decimal::Decimal;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    fn leave(employee_id: &str, kind: &str, start: NaiveDate, end: NaiveDate) -> NewLeaveRequest {
        NewLeaveRequest {
            employee_id: employee_id.to_string(),
            leave_type: kind.to_string(),
            start_date: start,
            end_date: end,
            reason: None,
        }
    }

    fn staff(db: &Database, department_id: i64, n: usize) -> Vec<String> {
        (0..n)
            .map(|i| {
                let mut new = NewEmployee::new(&format!("Staff {i}"), Decimal::from(3000));
                new.department_id = Some(department_id);
                db.add_employee(&new).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_busy_department_flagged() {
        let db = test_support::db();
        let dept = db.add_department("Ops", None).unwrap();
        let ids = staff(&db, dept, 3);
        let first = db.add_leave_request(&leave(&ids[0], "Vacation", d(3, 3), d(3, 7))).unwrap();
        db.process_leave_request(first, LeaveStatus::Approved, 1, None).unwrap();

        // 1 of 3 on leave = 33.33% >= 30%
        let outcome = request_leave(&db, &leave(&ids[1], "Vacation", d(3, 5), d(3, 6))).unwrap();
        assert!(outcome.department_busy());
        assert_eq!(outcome.concurrent_leaves.len(), 1);
        assert_eq!(outcome.department_load.unwrap().percent_on_leave, Decimal::new(3333, 2));
    }

    #[test]
    fn test_no_department_is_never_busy() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        let outcome = request_leave(&db, &leave(&emp, "Sick", d(3, 3), d(3, 3))).unwrap();
        assert!(!outcome.department_busy());
        assert!(outcome.department_load.is_none());
    }

    #[test]
    fn test_balance_subtracts_approved_vacation_only() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        let vac = db.add_leave_request(&leave(&emp, "Vacation", d(3, 3), d(3, 7))).unwrap();
        let sick = db.add_leave_request(&leave(&emp, "Sick", d(4, 1), d(4, 2))).unwrap();
        db.add_leave_request(&leave(&emp, "Vacation", d(5, 1), d(5, 2))).unwrap();
        db.process_leave_request(vac, LeaveStatus::Approved, 1, None).unwrap();
        db.process_leave_request(sick, LeaveStatus::Approved, 1, None).unwrap();

        let balance = vacation_balance_for(&db, &emp, d(6, 1)).unwrap();
        // 21 allocated + 5 carried (no start date, no prior use) - 5 taken
        assert_eq!(balance.remaining(), Some(Decimal::from(21)));
    }

    #[test]
    fn test_report_marks_excluded_employees() {
        let db = test_support::db();
        let mut new = NewEmployee::new("Contractor", Decimal::from(3000));
        new.exclude_vacation_policy = true;
        db.add_employee(&new).unwrap();
        test_support::employee(&db, "Ana", 3000);

        let report = leave_balance_report(&db, d(6, 1)).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].employee_name, "Ana");
        assert_eq!(report[1].balance, VacationBalance::Excluded);
    }
}
