//! Employment contracts.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{HrError, HrResult};

labelled_enum! {
    /// Kind of employment contract.
    pub enum ContractType {
        /// Open-ended.
        Permanent => "Permanent",
        /// Fixed term.
        Temporary => "Temporary",
        /// Probation.
        Trial => "Trial",
        /// Seasonal work.
        Seasonal => "Seasonal",
        /// Independent contractor.
        Freelance => "Freelance/Independent",
    }
}

labelled_enum! {
    /// Where a contract is in its life.
    pub enum ContractLifecycle {
        /// Not yet approved.
        Draft => "Draft",
        /// In force.
        Active => "Active",
        /// Past its end date without renewal.
        Expired => "Expired",
        /// Ended early.
        Terminated => "Terminated",
        /// In force, and the end date is within the notice period.
        UpcomingRenewal => "Upcoming Renewal",
        /// Auto-renewed past its previous end date; in force.
        Renewed => "Renewed",
    }
}

labelled_enum! {
    /// Approval state shared by contracts.
    pub enum ApprovalStatus {
        /// Waiting for the approver.
        PendingApproval => "Pending Approval",
        /// Approved.
        Approved => "Approved",
        /// Rejected.
        Rejected => "Rejected",
    }
}

/// A stored contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// Row id.
    pub id: i64,
    /// Employee id.
    pub employee_id: String,
    /// Contract kind.
    pub contract_type: ContractType,
    /// First day in force.
    pub start_date: NaiveDate,
    /// Initial term in years.
    pub initial_duration_years: Option<i64>,
    /// Current end date, moved forward on renewal. `None` for open-ended.
    pub current_end_date: Option<NaiveDate>,
    /// Renews automatically at the end date.
    pub is_auto_renewable: bool,
    /// Years added per renewal.
    pub renewal_term_years: Option<i64>,
    /// Days of notice before the end date.
    pub notice_period_days: i64,
    /// Lifecycle state.
    pub lifecycle_status: ContractLifecycle,
    /// Approval state.
    pub approval_status: ApprovalStatus,
    /// User expected to approve.
    pub assigned_approver_user_id: Option<i64>,
    /// Approver's comments.
    pub approval_comments: Option<String>,
    /// User who decided.
    pub approval_processed_by_user_id: Option<i64>,
    /// When it was decided.
    pub approval_processed_date: Option<NaiveDateTime>,
    /// Free-text terms.
    pub custom_terms: Option<String>,
    /// Position at signing.
    pub position: Option<String>,
    /// Salary at signing.
    pub salary: Option<Decimal>,
    /// Created timestamp.
    pub created_at: NaiveDateTime,
    /// Last update timestamp.
    pub updated_at: NaiveDateTime,
}

/// Fields supplied when drafting a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContract {
    /// Employee id.
    pub employee_id: String,
    /// Contract kind.
    pub contract_type: ContractType,
    /// First day in force.
    pub start_date: NaiveDate,
    /// Initial term in years; sets the end date when given.
    pub initial_duration_years: Option<i64>,
    /// Renews automatically.
    pub is_auto_renewable: bool,
    /// Years per renewal.
    pub renewal_term_years: Option<i64>,
    /// Notice period; 30 days when absent.
    pub notice_period_days: Option<i64>,
    /// Free-text terms.
    pub custom_terms: Option<String>,
    /// Position at signing.
    pub position: Option<String>,
    /// Salary at signing.
    pub salary: Option<Decimal>,
}

/// Notice period used when none is given.
pub const DEFAULT_NOTICE_PERIOD_DAYS: i64 = 30;

impl NewContract {
    /// Checks durations and that auto-renewal has a term.
    pub fn validate(&self) -> HrResult<()> {
        if self.initial_duration_years.is_some_and(|y| y <= 0) {
            return Err(HrError::invalid("initial_duration_years", "must be positive"));
        }
        if self.notice_period_days.is_some_and(|d| d < 0) {
            return Err(HrError::invalid("notice_period_days", "must not be negative"));
        }
        if self.is_auto_renewable && !self.renewal_term_years.is_some_and(|y| y > 0) {
            return Err(HrError::invalid(
                "renewal_term_years",
                "auto-renewable contracts need a positive renewal term",
            ));
        }
        Ok(())
    }

    /// End date implied by the start date and initial term.
    pub fn end_date(&self) -> Option<NaiveDate> {
        let years = self.initial_duration_years?;
        add_years(self.start_date, years)
    }
}

/// Adds whole years, clamping Feb 29 to Feb 28.
pub(crate) fn add_years(date: NaiveDate, years: i64) -> Option<NaiveDate> {
    let months = u32::try_from(years.checked_mul(12)?).ok()?;
    date.checked_add_months(chrono::Months::new(months))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_contract() -> NewContract {
        NewContract {
            employee_id: "EMP0001".to_string(),
            contract_type: ContractType::Temporary,
            start_date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            initial_duration_years: Some(1),
            is_auto_renewable: false,
            renewal_term_years: None,
            notice_period_days: None,
            custom_terms: None,
            position: None,
            salary: None,
        }
    }

    #[test]
    fn test_end_date_clamps_leap_day() {
        assert_eq!(
            new_contract().end_date(),
            NaiveDate::from_ymd_opt(2025, 2, 28)
        );
    }

    #[test]
    fn test_auto_renew_requires_term() {
        let mut c = new_contract();
        c.is_auto_renewable = true;
        assert!(c.validate().is_err());
        c.renewal_term_years = Some(1);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_freelance_label() {
        assert_eq!(
            "Freelance/Independent".parse::<ContractType>().unwrap(),
            ContractType::Freelance
        );
    }
}
