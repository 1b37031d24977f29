//! Clock-in/clock-out rows in `attendance_log`.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{OptionalExtension, Row, params};
use tracing::{debug, info};

use crate::error::{HrError, HrResult};
use crate::models::{AttendanceLog, EmployeeStatus};

use super::Database;

/// Source label for logs entered through the application.
pub const SOURCE_MANUAL: &str = "Manual";
/// Source label for logs imported from the fingerprint terminal.
pub const SOURCE_FINGERPRINT: &str = "Fingerprint";

const LOG_COLUMNS: &str = "id, employee_id, clock_in, clock_out, log_date, source, notes";

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<AttendanceLog> {
    Ok(AttendanceLog {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        clock_in: row.get("clock_in")?,
        clock_out: row.get("clock_out")?,
        log_date: row.get("log_date")?,
        source: row.get("source")?,
        notes: row.get("notes")?,
    })
}

impl Database {
    /// Opens an attendance log for an active employee and records the
    /// action in the employee's history.
    ///
    /// Only a log opened on the same day blocks a new clock-in.
    ///
    /// # Errors
    ///
    /// - [`HrError::EmployeeNotFound`] for unknown or archived employees
    /// - [`HrError::Attendance`] when the employee is not Active
    /// - [`HrError::AlreadyClockedIn`] when a log is still open on `at`'s day
    pub fn clock_in(
        &self,
        employee_id: &str,
        at: NaiveDateTime,
        source: &str,
        notes: Option<&str>,
    ) -> HrResult<i64> {
        self.require_active(employee_id)?;
        if self.open_clock_in(employee_id, at.date())?.is_some() {
            return Err(HrError::AlreadyClockedIn {
                employee_id: employee_id.to_string(),
            });
        }
        let tx = self.conn().unchecked_transaction()?;
        let id = self.insert_log(employee_id, at, None, source, notes)?;
        self.log_action(employee_id, &format!("Clocked In ({source})"), None)?;
        tx.commit()?;
        info!(employee_id, log_id = id, %at, "clocked in");
        Ok(id)
    }

    /// Closes the log the employee opened on `at`'s day.
    ///
    /// # Errors
    ///
    /// - [`HrError::EmployeeNotFound`] for unknown or archived employees
    /// - [`HrError::Attendance`] when the employee is not Active
    /// - [`HrError::NotClockedIn`] when no log is open on that day
    /// - [`HrError::InvalidInput`] when `at` is not after the clock-in
    pub fn clock_out(&self, employee_id: &str, at: NaiveDateTime) -> HrResult<AttendanceLog> {
        self.require_active(employee_id)?;
        let mut log = self
            .open_clock_in(employee_id, at.date())?
            .ok_or_else(|| HrError::NotClockedIn {
                employee_id: employee_id.to_string(),
            })?;
        if at <= log.clock_in {
            return Err(HrError::invalid(
                "clock_out",
                format!("{} is not after clock-in at {}", at, log.clock_in),
            ));
        }
        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "UPDATE attendance_log SET clock_out = ?2 WHERE id = ?1",
            params![log.id, at],
        )?;
        self.log_action(employee_id, "Clocked Out", None)?;
        tx.commit()?;
        log.clock_out = Some(at);
        info!(employee_id, log_id = log.id, %at, "clocked out");
        Ok(log)
    }

    fn require_active(&self, employee_id: &str) -> HrResult<()> {
        let employee = self.get_employee(employee_id, false)?;
        if employee.status != EmployeeStatus::Active {
            return Err(HrError::Attendance {
                employee_id: employee_id.to_string(),
                message: format!("employee status is '{}'", employee.status),
            });
        }
        Ok(())
    }

    /// Inserts a complete or open log without clock-state checks.
    ///
    /// The log date is the clock-in date.
    pub fn insert_log(
        &self,
        employee_id: &str,
        clock_in: NaiveDateTime,
        clock_out: Option<NaiveDateTime>,
        source: &str,
        notes: Option<&str>,
    ) -> HrResult<i64> {
        if clock_out.is_some_and(|out| out <= clock_in) {
            return Err(HrError::invalid("clock_out", "must be after clock-in"));
        }
        self.conn().execute(
            "INSERT INTO attendance_log (employee_id, clock_in, clock_out, log_date, source, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![employee_id, clock_in, clock_out, clock_in.date(), source, notes],
        )?;
        let id = self.conn().last_insert_rowid();
        debug!(employee_id, log_id = id, source, "attendance log inserted");
        Ok(id)
    }

    /// True when a log with exactly this clock-in exists.
    pub fn has_log_at(&self, employee_id: &str, clock_in: NaiveDateTime) -> HrResult<bool> {
        let found: Option<i64> = self
            .conn()
            .query_row(
                "SELECT id FROM attendance_log WHERE employee_id = ?1 AND clock_in = ?2",
                params![employee_id, clock_in],
                |r| r.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// An employee's logs dated within the inclusive range, oldest first.
    pub fn logs_for_period(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> HrResult<Vec<AttendanceLog>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {LOG_COLUMNS} FROM attendance_log
             WHERE employee_id = ?1 AND log_date BETWEEN ?2 AND ?3
             ORDER BY clock_in"
        ))?;
        let rows = stmt.query_map(params![employee_id, start, end], log_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// The employee's latest log dated `date` without a clock-out.
    pub fn open_clock_in(&self, employee_id: &str, date: NaiveDate) -> HrResult<Option<AttendanceLog>> {
        Ok(self
            .conn()
            .query_row(
                &format!(
                    "SELECT {LOG_COLUMNS} FROM attendance_log
                     WHERE employee_id = ?1 AND log_date = ?2 AND clock_out IS NULL
                     ORDER BY clock_in DESC LIMIT 1"
                ),
                params![employee_id, date],
                log_from_row,
            )
            .optional()?)
    }

    /// Dates with at least one log for the employee in the range.
    pub fn logged_dates(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> HrResult<BTreeSet<NaiveDate>> {
        let mut stmt = self.conn().prepare(
            "SELECT DISTINCT log_date FROM attendance_log
             WHERE employee_id = ?1 AND log_date BETWEEN ?2 AND ?3",
        )?;
        let rows = stmt.query_map(params![employee_id, start, end], |r| r.get(0))?;
        Ok(rows.collect::<Result<BTreeSet<_>, _>>()?)
    }

    /// Ids of employees with any log on `date`.
    pub fn employees_logged_on(&self, date: NaiveDate) -> HrResult<BTreeSet<String>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT DISTINCT employee_id FROM attendance_log WHERE log_date = ?1")?;
        let rows = stmt.query_map(params![date], |r| r.get(0))?;
        Ok(rows.collect::<Result<BTreeSet<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_clock_in_then_out() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        db.clock_in(&emp, at(3, 9, 0), SOURCE_MANUAL, None).unwrap();
        let log = db.clock_out(&emp, at(3, 17, 30)).unwrap();
        assert_eq!(log.worked_hours(), Some(rust_decimal::Decimal::new(85, 1)));
        assert!(db.open_clock_in(&emp, at(3, 0, 0).date()).unwrap().is_none());
        let history: Vec<String> = db
            .action_log(&emp)
            .unwrap()
            .into_iter()
            .map(|e| e.description)
            .collect();
        assert!(history.contains(&"Clocked In (Manual)".to_string()));
        assert!(history.contains(&"Clocked Out".to_string()));
    }

    #[test]
    fn test_double_clock_in_rejected() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        db.clock_in(&emp, at(3, 9, 0), SOURCE_MANUAL, None).unwrap();
        assert!(matches!(
            db.clock_in(&emp, at(3, 10, 0), SOURCE_MANUAL, None),
            Err(HrError::AlreadyClockedIn { .. })
        ));
    }

    #[test]
    fn test_clock_out_without_clock_in() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        assert!(matches!(
            db.clock_out(&emp, at(3, 17, 0)),
            Err(HrError::NotClockedIn { .. })
        ));
    }

    #[test]
    fn test_clock_out_before_clock_in_rejected() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        db.clock_in(&emp, at(3, 9, 0), SOURCE_MANUAL, None).unwrap();
        assert!(matches!(
            db.clock_out(&emp, at(3, 9, 0)),
            Err(HrError::InvalidInput { .. })
        ));
        assert!(db.open_clock_in(&emp, at(3, 0, 0).date()).unwrap().is_some());
    }

    #[test]
    fn test_open_log_from_earlier_day_is_left_alone() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        db.clock_in(&emp, at(3, 9, 0), SOURCE_MANUAL, None).unwrap();

        assert!(matches!(
            db.clock_out(&emp, at(10, 17, 0)),
            Err(HrError::NotClockedIn { .. })
        ));
        db.clock_in(&emp, at(10, 9, 0), SOURCE_MANUAL, None).unwrap();
        let log = db.clock_out(&emp, at(10, 17, 0)).unwrap();
        assert_eq!(log.log_date, at(10, 0, 0).date());
        assert_eq!(log.worked_hours(), Some(rust_decimal::Decimal::from(8)));

        let old = db.logs_for_period(&emp, at(3, 0, 0).date(), at(3, 0, 0).date()).unwrap();
        assert_eq!(old.len(), 1);
        assert!(old[0].clock_out.is_none());
    }

    #[test]
    fn test_suspended_employee_cannot_clock_out() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        db.clock_in(&emp, at(3, 9, 0), SOURCE_MANUAL, None).unwrap();
        db.set_status(&emp, EmployeeStatus::Suspended, at(3, 0, 0).date())
            .unwrap();
        assert!(matches!(
            db.clock_out(&emp, at(3, 17, 0)),
            Err(HrError::Attendance { .. })
        ));
        assert!(db.open_clock_in(&emp, at(3, 0, 0).date()).unwrap().is_some());
    }

    #[test]
    fn test_inactive_employee_cannot_clock_in() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        db.set_status(&emp, EmployeeStatus::Suspended, at(1, 0, 0).date())
            .unwrap();
        assert!(matches!(
            db.clock_in(&emp, at(3, 9, 0), SOURCE_MANUAL, None),
            Err(HrError::Attendance { .. })
        ));
        assert!(matches!(
            db.clock_in("EMP9999", at(3, 9, 0), SOURCE_MANUAL, None),
            Err(HrError::EmployeeNotFound { .. })
        ));
    }

    #[test]
    fn test_period_queries() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        db.insert_log(&emp, at(3, 9, 0), Some(at(3, 12, 0)), SOURCE_FINGERPRINT, None)
            .unwrap();
        db.insert_log(&emp, at(3, 13, 0), Some(at(3, 17, 0)), SOURCE_FINGERPRINT, None)
            .unwrap();
        db.insert_log(&emp, at(5, 9, 0), None, SOURCE_MANUAL, None).unwrap();
        db.insert_log(&emp, at(20, 9, 0), None, SOURCE_MANUAL, None).unwrap();

        let start = at(1, 0, 0).date();
        let end = at(10, 0, 0).date();
        assert_eq!(db.logs_for_period(&emp, start, end).unwrap().len(), 3);
        let dates: Vec<_> = db.logged_dates(&emp, start, end).unwrap().into_iter().collect();
        assert_eq!(dates, vec![at(3, 0, 0).date(), at(5, 0, 0).date()]);
        assert!(db.has_log_at(&emp, at(3, 13, 0)).unwrap());
        assert!(db.employees_logged_on(at(5, 0, 0).date()).unwrap().contains(&emp));
    }
}
