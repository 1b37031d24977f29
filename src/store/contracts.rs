//! Employment contracts and their approval.

use chrono::NaiveDate;
use rusqlite::{OptionalExtension, Row, params};
use tracing::{info, warn};

use crate::calculation::evaluate_lifecycle;
use crate::error::{HrError, HrResult};
use crate::models::{
    ApprovalStatus, Contract, ContractLifecycle, DEFAULT_NOTICE_PERIOD_DAYS, NewContract,
};

use super::{Database, get_opt_decimal, now};

const CONTRACT_SELECT: &str = "SELECT id, employee_id, contract_type, start_date,
     initial_duration_years, current_end_date, is_auto_renewable, renewal_term_years,
     notice_period_days, lifecycle_status, approval_status, assigned_approver_user_id,
     approval_comments, approval_processed_by_user_id, approval_processed_date, custom_terms,
     position, salary, created_at, updated_at
     FROM contracts";

fn contract_from_row(row: &Row<'_>) -> rusqlite::Result<Contract> {
    Ok(Contract {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        contract_type: row.get("contract_type")?,
        start_date: row.get("start_date")?,
        initial_duration_years: row.get("initial_duration_years")?,
        current_end_date: row.get("current_end_date")?,
        is_auto_renewable: row.get("is_auto_renewable")?,
        renewal_term_years: row.get("renewal_term_years")?,
        notice_period_days: row.get("notice_period_days")?,
        lifecycle_status: row.get("lifecycle_status")?,
        approval_status: row.get("approval_status")?,
        assigned_approver_user_id: row.get("assigned_approver_user_id")?,
        approval_comments: row.get("approval_comments")?,
        approval_processed_by_user_id: row.get("approval_processed_by_user_id")?,
        approval_processed_date: row.get("approval_processed_date")?,
        custom_terms: row.get("custom_terms")?,
        position: row.get("position")?,
        salary: get_opt_decimal(row, "salary")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl Database {
    /// Drafts a contract and routes it for approval.
    ///
    /// The approver is the account of the employee's manager, else the
    /// configured default contract approver.
    pub fn add_contract(&self, new: &NewContract) -> HrResult<i64> {
        new.validate()?;
        let employee = self.get_employee(&new.employee_id, false)?;
        let approver = self.approver_for(
            employee.manager_id.as_deref(),
            self.load_policy()?.general.default_contract_approver_user_id,
        )?;
        let stamp = now();
        self.conn().execute(
            "INSERT INTO contracts (
                employee_id, contract_type, start_date, initial_duration_years, current_end_date,
                is_auto_renewable, renewal_term_years, notice_period_days, lifecycle_status,
                approval_status, assigned_approver_user_id, custom_terms, position, salary,
                created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)",
            params![
                new.employee_id,
                new.contract_type,
                new.start_date,
                new.initial_duration_years,
                new.end_date(),
                new.is_auto_renewable,
                new.renewal_term_years,
                new.notice_period_days.unwrap_or(DEFAULT_NOTICE_PERIOD_DAYS),
                ContractLifecycle::Draft,
                ApprovalStatus::PendingApproval,
                approver,
                new.custom_terms,
                new.position,
                new.salary.map(|s| s.to_string()),
                stamp,
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        info!(contract_id = id, employee_id = %new.employee_id, approver_user_id = approver, "contract drafted");
        Ok(id)
    }

    /// Looks up a contract.
    pub fn get_contract(&self, contract_id: i64) -> HrResult<Contract> {
        self.conn()
            .query_row(
                &format!("{CONTRACT_SELECT} WHERE id = ?1"),
                params![contract_id],
                contract_from_row,
            )
            .optional()?
            .ok_or(HrError::ContractNotFound { contract_id })
    }

    /// An employee's contracts, newest start first.
    pub fn contracts_for_employee(&self, employee_id: &str) -> HrResult<Vec<Contract>> {
        let mut stmt = self.conn().prepare(&format!(
            "{CONTRACT_SELECT} WHERE employee_id = ?1 ORDER BY start_date DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![employee_id], contract_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Contracts waiting on this approver, oldest first.
    pub fn pending_contract_approvals(&self, approver_user_id: i64) -> HrResult<Vec<Contract>> {
        let mut stmt = self.conn().prepare(&format!(
            "{CONTRACT_SELECT} WHERE assigned_approver_user_id = ?1 AND approval_status = ?2
             ORDER BY created_at, id"
        ))?;
        let rows = stmt.query_map(
            params![approver_user_id, ApprovalStatus::PendingApproval],
            contract_from_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Approves or rejects a pending contract. Approval makes it Active.
    pub fn process_contract_approval(
        &self,
        contract_id: i64,
        decision: ApprovalStatus,
        user_id: i64,
        comments: Option<&str>,
    ) -> HrResult<Contract> {
        let contract = self.get_contract(contract_id)?;
        if contract.approval_status != ApprovalStatus::PendingApproval
            || decision == ApprovalStatus::PendingApproval
        {
            return Err(HrError::InvalidStatusTransition {
                entity: "contract approval".to_string(),
                from: contract.approval_status.to_string(),
                to: decision.to_string(),
            });
        }
        let lifecycle = match decision {
            ApprovalStatus::Approved => ContractLifecycle::Active,
            _ => contract.lifecycle_status,
        };
        let stamp = now();
        self.conn().execute(
            "UPDATE contracts SET approval_status = ?2, lifecycle_status = ?3,
                approval_processed_by_user_id = ?4, approval_comments = ?5,
                approval_processed_date = ?6, updated_at = ?6
             WHERE id = ?1",
            params![contract_id, decision, lifecycle, user_id, comments, stamp],
        )?;
        info!(contract_id, decision = %decision, "contract approval processed");
        self.get_contract(contract_id)
    }

    /// Ends a contract early.
    pub fn terminate_contract(&self, contract_id: i64) -> HrResult<Contract> {
        let contract = self.get_contract(contract_id)?;
        if matches!(
            contract.lifecycle_status,
            ContractLifecycle::Terminated | ContractLifecycle::Expired
        ) {
            return Err(HrError::InvalidStatusTransition {
                entity: "contract".to_string(),
                from: contract.lifecycle_status.to_string(),
                to: ContractLifecycle::Terminated.to_string(),
            });
        }
        self.conn().execute(
            "UPDATE contracts SET lifecycle_status = ?2, updated_at = ?3 WHERE id = ?1",
            params![contract_id, ContractLifecycle::Terminated, now()],
        )?;
        warn!(contract_id, employee_id = %contract.employee_id, "contract terminated");
        self.get_contract(contract_id)
    }

    /// Re-evaluates every contract on `today`, saving renewals and status
    /// changes. Returns the contracts that changed.
    pub fn refresh_lifecycles(&self, today: NaiveDate) -> HrResult<Vec<Contract>> {
        let contracts = {
            let mut stmt = self.conn().prepare(&format!(
                "{CONTRACT_SELECT} WHERE approval_status = ?1 AND lifecycle_status NOT IN (?2, ?3)"
            ))?;
            let rows = stmt.query_map(
                params![
                    ApprovalStatus::Approved,
                    ContractLifecycle::Terminated,
                    ContractLifecycle::Expired
                ],
                contract_from_row,
            )?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let tx = self.conn().unchecked_transaction()?;
        let stamp = now();
        let mut changed = Vec::new();
        for mut contract in contracts {
            let evaluation = evaluate_lifecycle(&contract, today);
            if !evaluation.changes(&contract) {
                continue;
            }
            tx.execute(
                "UPDATE contracts SET lifecycle_status = ?2, current_end_date = ?3, updated_at = ?4
                 WHERE id = ?1",
                params![contract.id, evaluation.status, evaluation.current_end_date, stamp],
            )?;
            if evaluation.renewals > 0 {
                info!(contract_id = contract.id, renewals = evaluation.renewals, "contract renewed");
            }
            contract.lifecycle_status = evaluation.status;
            contract.current_end_date = evaluation.current_end_date;
            contract.updated_at = stamp;
            changed.push(contract);
        }
        tx.commit()?;
        info!(changed = changed.len(), %today, "contract lifecycles refreshed");
        Ok(changed)
    }
}
