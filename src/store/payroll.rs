//! Allowances, deductions, salary advances and recorded payslips.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rusqlite::{OptionalExtension, Row, params};
use tracing::{info, warn};

use crate::error::{HrError, HrResult, is_unique_violation};
use crate::models::{
    AdvanceStatus, NewSalaryAdvance, PayItem, PayItemKind, PayrollResult, Payslip, SalaryAdvance,
};

use super::{Database, get_decimal, now};

fn item_table(kind: PayItemKind) -> &'static str {
    match kind {
        PayItemKind::Allowance => "allowances",
        PayItemKind::Deduction => "deductions",
    }
}

fn pay_item_from_row(kind: PayItemKind, row: &Row<'_>) -> rusqlite::Result<PayItem> {
    Ok(PayItem {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        kind,
        item_type: row.get("type")?,
        amount: get_decimal(row, "amount")?,
        is_recurring: row.get("is_recurring")?,
        effective_date: row.get("effective_date")?,
        end_date: row.get("end_date")?,
    })
}

const ADVANCE_COLUMNS: &str = "id, employee_id, advance_date, amount, repayment_per_period,
     repayment_start_date, total_repaid, status";

fn advance_from_row(row: &Row<'_>) -> rusqlite::Result<SalaryAdvance> {
    Ok(SalaryAdvance {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        advance_date: row.get("advance_date")?,
        amount: get_decimal(row, "amount")?,
        repayment_per_period: get_decimal(row, "repayment_per_period")?,
        repayment_start_date: row.get("repayment_start_date")?,
        total_repaid: get_decimal(row, "total_repaid")?,
        status: row.get("status")?,
    })
}

const PAYSLIP_COLUMNS: &str = "id, employee_id, period_start, period_end, basic_salary,
     overtime_pay, total_allowances, gross_salary, total_deductions, advance_repayment,
     net_pay, generation_date, notes";

fn payslip_from_row(row: &Row<'_>) -> rusqlite::Result<Payslip> {
    Ok(Payslip {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        period_start: row.get("period_start")?,
        period_end: row.get("period_end")?,
        basic_salary: get_decimal(row, "basic_salary")?,
        overtime_pay: get_decimal(row, "overtime_pay")?,
        total_allowances: get_decimal(row, "total_allowances")?,
        gross_salary: get_decimal(row, "gross_salary")?,
        total_deductions: get_decimal(row, "total_deductions")?,
        advance_repayment: get_decimal(row, "advance_repayment")?,
        net_pay: get_decimal(row, "net_pay")?,
        generation_date: row.get("generation_date")?,
        notes: row.get("notes")?,
    })
}

impl Database {
    /// Stores an allowance or deduction; `item.id` is ignored.
    ///
    /// Rewards and penalties are one-off items (`is_recurring = false`)
    /// dated on the day they apply.
    pub fn add_pay_item(&self, item: &PayItem) -> HrResult<i64> {
        item.validate()?;
        self.get_employee(&item.employee_id, true)?;
        self.conn().execute(
            &format!(
                "INSERT INTO {} (employee_id, type, amount, is_recurring, effective_date, end_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                item_table(item.kind)
            ),
            params![
                item.employee_id,
                item.item_type.trim(),
                item.amount.to_string(),
                item.is_recurring,
                item.effective_date,
                item.end_date,
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        info!(
            employee_id = %item.employee_id,
            kind = ?item.kind,
            amount = %item.amount,
            "pay item added"
        );
        Ok(id)
    }

    /// Every allowance or deduction of the employee.
    pub fn pay_items(&self, employee_id: &str, kind: PayItemKind) -> HrResult<Vec<PayItem>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT id, employee_id, type, amount, is_recurring, effective_date, end_date
             FROM {} WHERE employee_id = ?1 ORDER BY effective_date, id",
            item_table(kind)
        ))?;
        let rows = stmt.query_map(params![employee_id], |r| pay_item_from_row(kind, r))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Allowances and deductions that apply to the pay period.
    pub fn pay_items_for_period(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> HrResult<Vec<PayItem>> {
        let mut items = self.pay_items(employee_id, PayItemKind::Allowance)?;
        items.extend(self.pay_items(employee_id, PayItemKind::Deduction)?);
        items.retain(|i| i.applies_to_period(start, end));
        Ok(items)
    }

    /// Deletes an allowance or deduction.
    pub fn delete_pay_item(&self, kind: PayItemKind, item_id: i64) -> HrResult<()> {
        let deleted = self.conn().execute(
            &format!("DELETE FROM {} WHERE id = ?1", item_table(kind)),
            params![item_id],
        )?;
        if deleted == 0 {
            return Err(HrError::invalid("id", format!("no {:?} with id {}", kind, item_id)));
        }
        Ok(())
    }

    /// Records a salary advance as Active with nothing repaid.
    pub fn add_salary_advance(&self, new: &NewSalaryAdvance) -> HrResult<i64> {
        new.validate()?;
        self.get_employee(&new.employee_id, true)?;
        self.conn().execute(
            "INSERT INTO salary_advances (
                employee_id, advance_date, amount, repayment_per_period, repayment_start_date,
                total_repaid, status
             ) VALUES (?1, ?2, ?3, ?4, ?5, '0', ?6)",
            params![
                new.employee_id,
                new.advance_date,
                new.amount.to_string(),
                new.repayment_per_period.to_string(),
                new.repayment_start_date,
                AdvanceStatus::Active,
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        info!(employee_id = %new.employee_id, advance_id = id, amount = %new.amount, "salary advance added");
        Ok(id)
    }

    /// Looks up a salary advance.
    pub fn get_salary_advance(&self, advance_id: i64) -> HrResult<SalaryAdvance> {
        self.conn()
            .query_row(
                &format!("SELECT {ADVANCE_COLUMNS} FROM salary_advances WHERE id = ?1"),
                params![advance_id],
                advance_from_row,
            )
            .optional()?
            .ok_or_else(|| HrError::invalid("advance_id", format!("no salary advance {}", advance_id)))
    }

    /// An employee's advances, oldest first.
    pub fn salary_advances_for_employee(&self, employee_id: &str) -> HrResult<Vec<SalaryAdvance>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ADVANCE_COLUMNS} FROM salary_advances
             WHERE employee_id = ?1 ORDER BY advance_date, id"
        ))?;
        let rows = stmt.query_map(params![employee_id], advance_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// The oldest Active advance whose repayment has started by `period_end`.
    pub fn active_advance_for_repayment(
        &self,
        employee_id: &str,
        period_end: NaiveDate,
    ) -> HrResult<Option<SalaryAdvance>> {
        Ok(self
            .conn()
            .query_row(
                &format!(
                    "SELECT {ADVANCE_COLUMNS} FROM salary_advances
                     WHERE employee_id = ?1 AND status = ?2 AND repayment_start_date <= ?3
                     ORDER BY advance_date, id LIMIT 1"
                ),
                params![employee_id, AdvanceStatus::Active, period_end],
                advance_from_row,
            )
            .optional()?)
    }

    /// Stores a calculated payslip and applies its advance repayment.
    ///
    /// Both writes happen in one transaction. An advance is marked Fully
    /// Repaid once its total repaid reaches the amount.
    ///
    /// # Errors
    ///
    /// [`HrError::DuplicatePayslip`] when the employee already has a
    /// payslip for the same period; nothing is written in that case.
    pub fn record_payslip(&self, result: &PayrollResult, notes: Option<&str>) -> HrResult<i64> {
        let totals = &result.totals;
        let tx = self.conn().unchecked_transaction()?;
        let inserted = tx.execute(
            "INSERT INTO payslips (
                employee_id, period_start, period_end, basic_salary, overtime_pay,
                total_allowances, gross_salary, total_deductions, advance_repayment, net_pay,
                generation_date, notes
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                result.employee_id,
                result.period_start,
                result.period_end,
                totals.basic_salary.to_string(),
                totals.overtime_pay.to_string(),
                totals.total_allowances.to_string(),
                totals.gross_salary.to_string(),
                totals.total_deductions.to_string(),
                totals.advance_repayment.to_string(),
                totals.net_pay.to_string(),
                now(),
                notes,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                warn!(employee_id = %result.employee_id, "payslip already recorded for period");
                return Err(HrError::DuplicatePayslip {
                    employee_id: result.employee_id.clone(),
                    period_start: result.period_start,
                    period_end: result.period_end,
                });
            }
            Err(e) => return Err(e.into()),
        }
        let payslip_id = tx.last_insert_rowid();

        if let Some(advance_id) = result.advance_id.filter(|_| totals.advance_repayment > Decimal::ZERO) {
            let advance = self.get_salary_advance(advance_id)?;
            let repaid = advance.total_repaid + totals.advance_repayment;
            let status = if repaid >= advance.amount {
                AdvanceStatus::FullyRepaid
            } else {
                AdvanceStatus::Active
            };
            tx.execute(
                "UPDATE salary_advances SET total_repaid = ?2, status = ?3 WHERE id = ?1",
                params![advance_id, repaid.to_string(), status],
            )?;
            info!(advance_id, total_repaid = %repaid, status = %status, "advance repayment applied");
        }

        tx.commit()?;
        info!(
            employee_id = %result.employee_id,
            payslip_id,
            net_pay = %totals.net_pay,
            calculation_id = %result.calculation_id,
            "payslip recorded"
        );
        Ok(payslip_id)
    }

    /// A recorded payslip, if it exists.
    pub fn get_payslip(&self, payslip_id: i64) -> HrResult<Option<Payslip>> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {PAYSLIP_COLUMNS} FROM payslips WHERE id = ?1"),
                params![payslip_id],
                payslip_from_row,
            )
            .optional()?)
    }

    /// An employee's payslips, newest period first.
    pub fn payslips_for_employee(&self, employee_id: &str) -> HrResult<Vec<Payslip>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {PAYSLIP_COLUMNS} FROM payslips
             WHERE employee_id = ?1 ORDER BY period_start DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![employee_id], payslip_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
