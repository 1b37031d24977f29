//! Payroll models.
//!
//! This module contains the stored payroll inputs (allowances, deductions,
//! salary advances), the [`PayrollResult`] produced by a calculation, and
//! the [`Payslip`] row recorded once a result is accepted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HrError, HrResult};

use super::AuditTrace;

/// Whether a [`PayItem`] adds to or subtracts from pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayItemKind {
    /// Adds to gross pay.
    Allowance,
    /// Subtracts from net pay.
    Deduction,
}

/// An allowance or deduction attached to an employee.
///
/// Recurring items apply to every period that ends while they are in
/// force. One-off items apply to the period containing their effective
/// date; rewards and penalties are stored this way.
///
/// # Example
///
/// ```
/// use hr_engine::models::{PayItem, PayItemKind};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let housing = PayItem {
///     id: 1,
///     employee_id: "EMP0001".to_string(),
///     kind: PayItemKind::Allowance,
///     item_type: "Housing".to_string(),
///     amount: Decimal::from(250),
///     is_recurring: true,
///     effective_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
///     end_date: None,
/// };
/// let (start, end) = (
///     NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
/// );
/// assert!(housing.applies_to_period(start, end));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayItem {
    /// Row id.
    pub id: i64,
    /// Employee id.
    pub employee_id: String,
    /// Allowance or deduction.
    pub kind: PayItemKind,
    /// Free-text type such as "Transport" or "Insurance".
    #[serde(rename = "type")]
    pub item_type: String,
    /// Amount per period.
    pub amount: Decimal,
    /// Applies every period while in force.
    pub is_recurring: bool,
    /// First day in force, or the date of a one-off item.
    pub effective_date: NaiveDate,
    /// Last day in force for recurring items.
    pub end_date: Option<NaiveDate>,
}

impl PayItem {
    /// Whether the item contributes to the period `[start, end]`.
    pub fn applies_to_period(&self, start: NaiveDate, end: NaiveDate) -> bool {
        if self.is_recurring {
            self.effective_date <= end && self.end_date.is_none_or(|e| e >= end)
        } else {
            start <= self.effective_date && self.effective_date <= end
        }
    }

    /// Rejects negative amounts and reversed ranges.
    pub fn validate(&self) -> HrResult<()> {
        if self.item_type.trim().is_empty() {
            return Err(HrError::invalid("type", "must not be empty"));
        }
        if self.amount < Decimal::ZERO {
            return Err(HrError::invalid("amount", "must not be negative"));
        }
        if self.end_date.is_some_and(|e| e < self.effective_date) {
            return Err(HrError::invalid("end_date", "is before the effective date"));
        }
        Ok(())
    }
}

labelled_enum! {
    /// Repayment state of a salary advance.
    pub enum AdvanceStatus {
        /// Still being repaid.
        Active => "Active",
        /// Nothing left to repay.
        FullyRepaid => "Fully Repaid",
    }
}

/// A salary advance repaid in instalments from future payslips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryAdvance {
    /// Row id.
    pub id: i64,
    /// Employee id.
    pub employee_id: String,
    /// When the advance was paid out.
    pub advance_date: NaiveDate,
    /// Amount advanced.
    pub amount: Decimal,
    /// Instalment taken from each payslip.
    pub repayment_per_period: Decimal,
    /// First period end date from which instalments are taken.
    pub repayment_start_date: NaiveDate,
    /// Sum of instalments taken so far.
    pub total_repaid: Decimal,
    /// Repayment state.
    pub status: AdvanceStatus,
}

impl SalaryAdvance {
    /// Amount still owed, never negative.
    pub fn remaining(&self) -> Decimal {
        (self.amount - self.total_repaid).max(Decimal::ZERO)
    }
}

/// Fields supplied when granting an advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSalaryAdvance {
    /// Employee id.
    pub employee_id: String,
    /// When the advance was paid out.
    pub advance_date: NaiveDate,
    /// Amount advanced.
    pub amount: Decimal,
    /// Instalment per payslip.
    pub repayment_per_period: Decimal,
    /// First period end date from which instalments are taken.
    pub repayment_start_date: NaiveDate,
}

impl NewSalaryAdvance {
    /// Amount and instalment must be positive and the instalment no larger
    /// than the amount.
    pub fn validate(&self) -> HrResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(HrError::invalid("amount", "must be positive"));
        }
        if self.repayment_per_period <= Decimal::ZERO {
            return Err(HrError::invalid("repayment_per_period", "must be positive"));
        }
        if self.repayment_per_period > self.amount {
            return Err(HrError::invalid(
                "repayment_per_period",
                "cannot exceed the advance amount",
            ));
        }
        Ok(())
    }
}

/// Represents the category of a payslip line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayCategory {
    /// Monthly salary.
    Basic,
    /// Overtime pay.
    Overtime,
    /// Stored allowance.
    Allowance,
    /// Default bonus from policy.
    Bonus,
    /// Stored deduction.
    Deduction,
    /// Default deduction from policy.
    PolicyDeduction,
    /// Lateness penalty.
    LatePenalty,
    /// Salary advance instalment.
    AdvanceRepayment,
}

impl PayCategory {
    /// True for categories that reduce pay.
    pub fn is_deduction(self) -> bool {
        matches!(
            self,
            PayCategory::Deduction
                | PayCategory::PolicyDeduction
                | PayCategory::LatePenalty
                | PayCategory::AdvanceRepayment
        )
    }
}

/// Represents a single line item on a payslip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayLine {
    /// The category of the line.
    pub category: PayCategory,
    /// Description, e.g. the allowance type.
    pub description: String,
    /// Units such as hours or days; one for flat amounts.
    pub units: Decimal,
    /// Rate per unit.
    pub rate: Decimal,
    /// Line amount, always non-negative.
    pub amount: Decimal,
}

/// Aggregated totals for a payroll calculation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PayTotals {
    /// Monthly salary.
    pub basic_salary: Decimal,
    /// Overtime pay.
    pub overtime_pay: Decimal,
    /// Allowances plus bonus.
    pub total_allowances: Decimal,
    /// Basic + overtime + allowances.
    pub gross_salary: Decimal,
    /// Deductions, default deduction and lateness penalties.
    pub total_deductions: Decimal,
    /// Salary advance instalment.
    pub advance_repayment: Decimal,
    /// Gross minus deductions minus advance repayment.
    pub net_pay: Decimal,
    /// Overtime hours paid.
    pub overtime_hours: Decimal,
    /// Days with a late arrival.
    pub late_days: u32,
    /// Workdays expected in the period.
    pub expected_workdays: u32,
    /// Days actually attended.
    pub days_attended: u32,
}

/// The complete result of a payroll calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollResult {
    /// Unique id of this calculation run.
    pub calculation_id: Uuid,
    /// When it was calculated.
    pub timestamp: DateTime<Utc>,
    /// Employee id.
    pub employee_id: String,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// Payslip lines.
    pub lines: Vec<PayLine>,
    /// Totals.
    pub totals: PayTotals,
    /// Advance being repaid, if any.
    pub advance_id: Option<i64>,
    /// Explanation of every step.
    pub audit_trace: AuditTrace,
}

/// A recorded payslip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payslip {
    /// Row id.
    pub id: i64,
    /// Employee id.
    pub employee_id: String,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// Monthly salary.
    pub basic_salary: Decimal,
    /// Overtime pay.
    pub overtime_pay: Decimal,
    /// Allowances plus bonus.
    pub total_allowances: Decimal,
    /// Gross salary.
    pub gross_salary: Decimal,
    /// Total deductions.
    pub total_deductions: Decimal,
    /// Advance instalment.
    pub advance_repayment: Decimal,
    /// Net pay.
    pub net_pay: Decimal,
    /// When the payslip was generated.
    pub generation_date: NaiveDateTime,
    /// Free-text notes.
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(recurring: bool, effective: NaiveDate, end: Option<NaiveDate>) -> PayItem {
        PayItem {
            id: 1,
            employee_id: "EMP0001".to_string(),
            kind: PayItemKind::Allowance,
            item_type: "Transport".to_string(),
            amount: Decimal::from(100),
            is_recurring: recurring,
            effective_date: effective,
            end_date: end,
        }
    }

    #[test]
    fn test_recurring_item_applies_while_in_force_at_period_end() {
        let start = date(2025, 3, 1);
        let end = date(2025, 3, 31);
        assert!(item(true, date(2025, 3, 15), None).applies_to_period(start, end));
        assert!(item(true, date(2024, 1, 1), Some(date(2025, 3, 31))).applies_to_period(start, end));
        // Ended mid-period: not in force at period end.
        assert!(!item(true, date(2024, 1, 1), Some(date(2025, 3, 30))).applies_to_period(start, end));
        // Starts after the period.
        assert!(!item(true, date(2025, 4, 1), None).applies_to_period(start, end));
    }

    #[test]
    fn test_one_off_item_applies_only_inside_period() {
        let start = date(2025, 3, 1);
        let end = date(2025, 3, 31);
        assert!(item(false, date(2025, 3, 1), None).applies_to_period(start, end));
        assert!(item(false, date(2025, 3, 31), None).applies_to_period(start, end));
        assert!(!item(false, date(2025, 2, 28), None).applies_to_period(start, end));
    }

    #[test]
    fn test_advance_remaining_never_negative() {
        let advance = SalaryAdvance {
            id: 1,
            employee_id: "EMP0001".to_string(),
            advance_date: date(2025, 1, 1),
            amount: Decimal::from(500),
            repayment_per_period: Decimal::from(200),
            repayment_start_date: date(2025, 1, 31),
            total_repaid: Decimal::from(600),
            status: AdvanceStatus::Active,
        };
        assert_eq!(advance.remaining(), Decimal::ZERO);
    }

    #[test]
    fn test_new_advance_validation() {
        let mut new = NewSalaryAdvance {
            employee_id: "EMP0001".to_string(),
            advance_date: date(2025, 1, 1),
            amount: Decimal::from(500),
            repayment_per_period: Decimal::from(100),
            repayment_start_date: date(2025, 1, 31),
        };
        assert!(new.validate().is_ok());
        new.repayment_per_period = Decimal::from(600);
        assert!(new.validate().is_err());
        new.repayment_per_period = Decimal::ZERO;
        assert!(new.validate().is_err());
    }

    #[test]
    fn test_deduction_categories() {
        assert!(PayCategory::LatePenalty.is_deduction());
        assert!(PayCategory::AdvanceRepayment.is_deduction());
        assert!(!PayCategory::Bonus.is_deduction());
    }
}
