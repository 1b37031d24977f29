//! Leave requests and their approval workflow.

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Row, params, params_from_iter};
use tracing::info;

use crate::error::{HrError, HrResult};
use crate::models::{LeaveRequest, LeaveStatus, NewLeaveRequest};

use super::{Database, now};

const LEAVE_COLUMNS: &str = "lr.id, lr.employee_id, lr.leave_type, lr.start_date, lr.end_date,
     lr.reason, lr.request_date, lr.status, lr.assigned_approver_user_id,
     lr.processed_by_user_id, lr.approver_comments, lr.processed_date";

fn leave_from_row(row: &Row<'_>) -> rusqlite::Result<LeaveRequest> {
    Ok(LeaveRequest {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        leave_type: row.get("leave_type")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        reason: row.get("reason")?,
        request_date: row.get("request_date")?,
        status: row.get("status")?,
        assigned_approver_user_id: row.get("assigned_approver_user_id")?,
        processed_by_user_id: row.get("processed_by_user_id")?,
        approver_comments: row.get("approver_comments")?,
        processed_date: row.get("processed_date")?,
    })
}

fn leave_with_name(row: &Row<'_>) -> rusqlite::Result<(LeaveRequest, String)> {
    Ok((leave_from_row(row)?, row.get("employee_name")?))
}

impl Database {
    /// The user who should approve an employee's requests: the linked
    /// account of their manager, else `fallback`.
    pub(super) fn approver_for(&self, manager_id: Option<&str>, fallback: i64) -> HrResult<i64> {
        if let Some(manager_id) = manager_id {
            if let Some(user) = self.get_user_for_employee(manager_id)? {
                return Ok(user.id);
            }
        }
        Ok(fallback)
    }

    /// Files a leave request in Pending Approval, dated today.
    pub fn add_leave_request(&self, new: &NewLeaveRequest) -> HrResult<i64> {
        new.validate()?;
        let employee = self.get_employee(&new.employee_id, false)?;
        let approver = self.approver_for(
            employee.manager_id.as_deref(),
            self.load_policy()?.general.default_leave_approver_user_id,
        )?;
        self.conn().execute(
            "INSERT INTO leave_requests (
                employee_id, leave_type, start_date, end_date, reason, request_date, status,
                assigned_approver_user_id
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                new.employee_id,
                new.leave_type.trim(),
                new.start_date,
                new.end_date,
                new.reason,
                now().date(),
                LeaveStatus::PendingApproval,
                approver,
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        info!(
            request_id = id,
            employee_id = %new.employee_id,
            approver_user_id = approver,
            "leave request filed"
        );
        Ok(id)
    }

    /// Looks up a leave request.
    pub fn get_leave_request(&self, request_id: i64) -> HrResult<LeaveRequest> {
        self.conn()
            .query_row(
                &format!("SELECT {LEAVE_COLUMNS} FROM leave_requests lr WHERE lr.id = ?1"),
                params![request_id],
                leave_from_row,
            )
            .optional()?
            .ok_or(HrError::LeaveRequestNotFound { request_id })
    }

    /// An employee's requests, newest first.
    pub fn leave_requests_for_employee(&self, employee_id: &str) -> HrResult<Vec<LeaveRequest>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests lr
             WHERE lr.employee_id = ?1 ORDER BY lr.start_date DESC, lr.id DESC"
        ))?;
        let rows = stmt.query_map(params![employee_id], leave_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Pending requests with the requester's name, oldest first.
    ///
    /// Optionally restricted to one approver and to requests filed within
    /// an inclusive date range.
    pub fn pending_leave_requests(
        &self,
        approver_user_id: Option<i64>,
        requested_between: Option<(NaiveDate, NaiveDate)>,
    ) -> HrResult<Vec<(LeaveRequest, String)>> {
        let mut sql = format!(
            "SELECT {LEAVE_COLUMNS}, e.name AS employee_name
             FROM leave_requests lr JOIN employees e ON e.id = lr.employee_id
             WHERE lr.status = ?"
        );
        let mut values = vec![Value::Text(LeaveStatus::PendingApproval.as_str().to_string())];
        if let Some(user_id) = approver_user_id {
            sql.push_str(" AND lr.assigned_approver_user_id = ?");
            values.push(Value::Integer(user_id));
        }
        if let Some((from, to)) = requested_between {
            sql.push_str(" AND lr.request_date BETWEEN ? AND ?");
            values.push(Value::Text(from.to_string()));
            values.push(Value::Text(to.to_string()));
        }
        sql.push_str(" ORDER BY lr.request_date, lr.id");

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), leave_with_name)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn set_leave_status(
        &self,
        request_id: i64,
        to: LeaveStatus,
        user_id: Option<i64>,
        comments: Option<&str>,
    ) -> HrResult<LeaveRequest> {
        let request = self.get_leave_request(request_id)?;
        if !request.status.can_transition_to(to) {
            return Err(HrError::InvalidStatusTransition {
                entity: "leave request".to_string(),
                from: request.status.to_string(),
                to: to.to_string(),
            });
        }
        self.conn().execute(
            "UPDATE leave_requests
             SET status = ?2, processed_by_user_id = ?3, approver_comments = ?4, processed_date = ?5
             WHERE id = ?1",
            params![request_id, to, user_id, comments, now()],
        )?;
        info!(request_id, status = %to, "leave request processed");
        self.get_leave_request(request_id)
    }

    /// Approves or rejects a pending request.
    ///
    /// # Errors
    ///
    /// - [`HrError::InvalidInput`] when `status` is not Approved or Rejected
    /// - [`HrError::InvalidStatusTransition`] when the request is no longer
    ///   pending
    pub fn process_leave_request(
        &self,
        request_id: i64,
        status: LeaveStatus,
        user_id: i64,
        comments: Option<&str>,
    ) -> HrResult<LeaveRequest> {
        if !matches!(status, LeaveStatus::Approved | LeaveStatus::Rejected) {
            return Err(HrError::invalid(
                "status",
                format!("a request can only be approved or rejected, not '{}'", status),
            ));
        }
        self.set_leave_status(request_id, status, Some(user_id), comments)
    }

    /// Withdraws a pending request.
    pub fn cancel_leave_request(&self, request_id: i64, user_id: Option<i64>) -> HrResult<LeaveRequest> {
        self.set_leave_status(request_id, LeaveStatus::Cancelled, user_id, None)
    }

    /// True when an approved request covers `date`.
    pub fn approved_leave_on(&self, employee_id: &str, date: NaiveDate) -> HrResult<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM leave_requests
             WHERE employee_id = ?1 AND status = ?2 AND start_date <= ?3 AND end_date >= ?3",
            params![employee_id, LeaveStatus::Approved, date],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    /// Approved leave ranges overlapping the inclusive period, any type.
    pub fn approved_leave_ranges(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> HrResult<Vec<(NaiveDate, NaiveDate)>> {
        let mut stmt = self.conn().prepare(
            "SELECT start_date, end_date FROM leave_requests
             WHERE employee_id = ?1 AND status = ?2 AND start_date <= ?4 AND end_date >= ?3
             ORDER BY start_date",
        )?;
        let rows = stmt.query_map(
            params![employee_id, LeaveStatus::Approved, start, end],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every approved vacation range of the employee.
    pub fn approved_vacation_ranges(&self, employee_id: &str) -> HrResult<Vec<(NaiveDate, NaiveDate)>> {
        let mut stmt = self.conn().prepare(
            "SELECT start_date, end_date FROM leave_requests
             WHERE employee_id = ?1 AND status = ?2 AND LOWER(TRIM(leave_type)) = 'vacation'
             ORDER BY start_date",
        )?;
        let rows = stmt.query_map(params![employee_id, LeaveStatus::Approved], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Approved leave of other employees in the department overlapping
    /// the period, with their names.
    pub fn concurrent_department_leaves(
        &self,
        department_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        exclude_employee_id: &str,
    ) -> HrResult<Vec<(LeaveRequest, String)>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {LEAVE_COLUMNS}, e.name AS employee_name
             FROM leave_requests lr JOIN employees e ON e.id = lr.employee_id
             WHERE e.department_id = ?1 AND lr.employee_id != ?2 AND lr.status = ?3
               AND lr.start_date <= ?5 AND lr.end_date >= ?4
             ORDER BY lr.start_date"
        ))?;
        let rows = stmt.query_map(
            params![department_id, exclude_employee_id, LeaveStatus::Approved, start, end],
            leave_with_name,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
