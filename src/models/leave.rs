//! Leave requests.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{HrError, HrResult};

labelled_enum! {
    /// Workflow state of a leave request.
    pub enum LeaveStatus {
        /// Waiting for the approver.
        PendingApproval => "Pending Approval",
        /// Granted.
        Approved => "Approved",
        /// Refused.
        Rejected => "Rejected",
        /// Withdrawn by the employee.
        Cancelled => "Cancelled",
    }
}

impl LeaveStatus {
    /// Whether a request in this state may move to `to`.
    ///
    /// Only pending requests can be decided or cancelled.
    pub fn can_transition_to(self, to: LeaveStatus) -> bool {
        self == LeaveStatus::PendingApproval && to != LeaveStatus::PendingApproval
    }
}

/// A stored leave request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Row id.
    pub id: i64,
    /// Requesting employee.
    pub employee_id: String,
    /// Free-text type such as "Vacation" or "Sick".
    pub leave_type: String,
    /// First day off.
    pub start_date: NaiveDate,
    /// Last day off, inclusive.
    pub end_date: NaiveDate,
    /// Reason given.
    pub reason: Option<String>,
    /// When the request was filed.
    pub request_date: NaiveDate,
    /// Workflow state.
    pub status: LeaveStatus,
    /// User expected to decide.
    pub assigned_approver_user_id: Option<i64>,
    /// User who decided.
    pub processed_by_user_id: Option<i64>,
    /// Approver's comments.
    pub approver_comments: Option<String>,
    /// When it was decided.
    pub processed_date: Option<NaiveDateTime>,
}

impl LeaveRequest {
    /// Calendar days covered, inclusive of both ends.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// True when `date` falls inside the request.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// True for approved vacation, matched case-insensitively.
    pub fn is_vacation(&self) -> bool {
        self.leave_type.trim().eq_ignore_ascii_case("vacation")
    }
}

/// Fields supplied when filing a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLeaveRequest {
    /// Requesting employee.
    pub employee_id: String,
    /// Free-text type.
    pub leave_type: String,
    /// First day off.
    pub start_date: NaiveDate,
    /// Last day off, inclusive.
    pub end_date: NaiveDate,
    /// Reason given.
    pub reason: Option<String>,
}

impl NewLeaveRequest {
    /// Rejects blank types and reversed ranges.
    pub fn validate(&self) -> HrResult<()> {
        if self.leave_type.trim().is_empty() {
            return Err(HrError::invalid("leave_type", "must not be empty"));
        }
        if self.start_date > self.end_date {
            return Err(HrError::invalid(
                "end_date",
                format!(
                    "end date {} is before start date {}",
                    self.end_date, self.start_date
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(start: NaiveDate, end: NaiveDate) -> LeaveRequest {
        LeaveRequest {
            id: 1,
            employee_id: "EMP0001".to_string(),
            leave_type: "VACATION".to_string(),
            start_date: start,
            end_date: end,
            reason: None,
            request_date: start,
            status: LeaveStatus::Approved,
            assigned_approver_user_id: None,
            processed_by_user_id: None,
            approver_comments: None,
            processed_date: None,
        }
    }

    #[test]
    fn test_days_are_inclusive() {
        let r = request(date(2025, 3, 3), date(2025, 3, 7));
        assert_eq!(r.days(), 5);
        assert_eq!(request(date(2025, 3, 3), date(2025, 3, 3)).days(), 1);
    }

    #[test]
    fn test_covers_boundaries() {
        let r = request(date(2025, 3, 3), date(2025, 3, 7));
        assert!(r.covers(date(2025, 3, 3)));
        assert!(r.covers(date(2025, 3, 7)));
        assert!(!r.covers(date(2025, 3, 8)));
    }

    #[test]
    fn test_vacation_type_case_insensitive() {
        assert!(request(date(2025, 1, 1), date(2025, 1, 1)).is_vacation());
    }

    #[test]
    fn test_only_pending_requests_transition() {
        assert!(LeaveStatus::PendingApproval.can_transition_to(LeaveStatus::Approved));
        assert!(LeaveStatus::PendingApproval.can_transition_to(LeaveStatus::Cancelled));
        assert!(!LeaveStatus::Approved.can_transition_to(LeaveStatus::Rejected));
        assert!(!LeaveStatus::PendingApproval.can_transition_to(LeaveStatus::PendingApproval));
    }

    #[test]
    fn test_reversed_range_rejected() {
        let new = NewLeaveRequest {
            employee_id: "EMP0001".to_string(),
            leave_type: "Sick".to_string(),
            start_date: date(2025, 3, 7),
            end_date: date(2025, 3, 3),
            reason: None,
        };
        assert!(new.validate().is_err());
    }
}
