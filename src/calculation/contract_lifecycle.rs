//! Contract lifecycle evaluation.
//!
//! An approved contract is Active until its end date. Inside the notice
//! period it becomes Upcoming Renewal. Past the end date it either renews
//! (auto-renewable contracts move the end date forward by whole renewal
//! terms and become Renewed) or expires. A Renewed contract keeps that
//! status until its new term reaches the notice period. Drafts, rejected and terminated contracts are left
//! alone.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{ApprovalStatus, Contract, ContractLifecycle, add_years};

/// The outcome of [`evaluate_lifecycle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvaluation {
    /// Status the contract should now have.
    pub status: ContractLifecycle,
    /// End date after any renewals.
    pub current_end_date: Option<NaiveDate>,
    /// Number of renewal terms applied.
    pub renewals: u32,
}

impl LifecycleEvaluation {
    /// True when status or end date differ from the stored contract.
    pub fn changes(&self, contract: &Contract) -> bool {
        self.status != contract.lifecycle_status || self.current_end_date != contract.current_end_date
    }
}

/// Decides a contract's lifecycle status on `today`.
pub fn evaluate_lifecycle(contract: &Contract, today: NaiveDate) -> LifecycleEvaluation {
    let unchanged = LifecycleEvaluation {
        status: contract.lifecycle_status,
        current_end_date: contract.current_end_date,
        renewals: 0,
    };
    if contract.approval_status != ApprovalStatus::Approved
        || matches!(
            contract.lifecycle_status,
            ContractLifecycle::Terminated | ContractLifecycle::Expired
        )
    {
        return unchanged;
    }

    let Some(mut end) = contract.current_end_date else {
        return LifecycleEvaluation {
            status: ContractLifecycle::Active,
            ..unchanged
        };
    };

    let mut renewals = 0;
    if end < today {
        let term = contract
            .renewal_term_years
            .filter(|t| *t > 0 && contract.is_auto_renewable);
        match term {
            Some(term) => {
                while end < today {
                    match add_years(end, term) {
                        Some(next) => end = next,
                        None => break,
                    }
                    renewals += 1;
                }
            }
            None => {
                return LifecycleEvaluation {
                    status: ContractLifecycle::Expired,
                    current_end_date: Some(end),
                    renewals: 0,
                };
            }
        }
    }

    let days_left = (end - today).num_days();
    let status = if renewals > 0 {
        ContractLifecycle::Renewed
    } else if days_left <= contract.notice_period_days {
        ContractLifecycle::UpcomingRenewal
    } else if contract.lifecycle_status == ContractLifecycle::Renewed {
        ContractLifecycle::Renewed
    } else {
        ContractLifecycle::Active
    };
    LifecycleEvaluation {
        status,
        current_end_date: Some(end),
        renewals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContractType;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn contract(end: Option<NaiveDate>, auto: bool) -> Contract {
        let ts = d(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap();
        Contract {
            id: 1,
            employee_id: "EMP0001".to_string(),
            contract_type: ContractType::Temporary,
            start_date: d(2024, 1, 1),
            initial_duration_years: Some(1),
            current_end_date: end,
            is_auto_renewable: auto,
            renewal_term_years: auto.then_some(1),
            notice_period_days: 30,
            lifecycle_status: ContractLifecycle::Active,
            approval_status: ApprovalStatus::Approved,
            assigned_approver_user_id: Some(1),
            approval_comments: None,
            approval_processed_by_user_id: Some(1),
            approval_processed_date: Some(ts),
            custom_terms: None,
            position: None,
            salary: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_active_outside_notice_period() {
        let eval = evaluate_lifecycle(&contract(Some(d(2025, 1, 1)), false), d(2024, 6, 1));
        assert_eq!(eval.status, ContractLifecycle::Active);
    }

    #[test]
    fn test_upcoming_renewal_inside_notice_period() {
        let eval = evaluate_lifecycle(&contract(Some(d(2025, 1, 1)), false), d(2024, 12, 2));
        assert_eq!(eval.status, ContractLifecycle::UpcomingRenewal);
    }

    #[test]
    fn test_expired_without_auto_renew() {
        let eval = evaluate_lifecycle(&contract(Some(d(2025, 1, 1)), false), d(2025, 1, 2));
        assert_eq!(eval.status, ContractLifecycle::Expired);
        assert_eq!(eval.renewals, 0);
    }

    #[test]
    fn test_auto_renew_rolls_end_date_forward() {
        let c = contract(Some(d(2025, 1, 1)), true);
        let eval = evaluate_lifecycle(&c, d(2026, 3, 1));
        assert_eq!(eval.current_end_date, Some(d(2027, 1, 1)));
        assert_eq!(eval.renewals, 2);
        assert_eq!(eval.status, ContractLifecycle::Renewed);
        assert!(eval.changes(&c));

        let mut stored = c.clone();
        stored.lifecycle_status = eval.status;
        stored.current_end_date = eval.current_end_date;
        let later = evaluate_lifecycle(&stored, d(2026, 6, 1));
        assert_eq!(later.status, ContractLifecycle::Renewed);
        assert!(!later.changes(&stored));
        let notice = evaluate_lifecycle(&stored, d(2026, 12, 15));
        assert_eq!(notice.status, ContractLifecycle::UpcomingRenewal);
        assert_eq!(notice.renewals, 0);
    }

    #[test]
    fn test_open_ended_contract_stays_active() {
        let eval = evaluate_lifecycle(&contract(None, false), d(2030, 1, 1));
        assert_eq!(eval.status, ContractLifecycle::Active);
    }

    #[test]
    fn test_unapproved_contract_untouched() {
        let mut c = contract(Some(d(2025, 1, 1)), false);
        c.approval_status = ApprovalStatus::PendingApproval;
        c.lifecycle_status = ContractLifecycle::Draft;
        let eval = evaluate_lifecycle(&c, d(2026, 1, 1));
        assert_eq!(eval.status, ContractLifecycle::Draft);
        assert!(!eval.changes(&c));
    }
}
