//! Employee records, id generation, archiving and shift rotation.

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Row, params, params_from_iter};
use tracing::{info, warn};

use crate::config::keys;
use crate::error::{HrError, HrResult, is_unique_violation};
use crate::models::{
    ActionLogEntry, Employee, EmployeeFilter, EmployeeStatus, NewEmployee, WorkShift,
};

use super::schema::EMPLOYEE_ID_COUNTER;
use super::{Database, get_decimal, now};

const EMPLOYEE_SELECT: &str = "SELECT e.*, d.name AS department_name
     FROM employees e LEFT JOIN departments d ON d.id = e.department_id";

fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get("id")?,
        name: row.get("name")?,
        department_id: row.get("department_id")?,
        department_name: row.get("department_name")?,
        position: row.get("position")?,
        salary: get_decimal(row, "salary")?,
        vacation_days: row.get("vacation_days")?,
        status: row.get("status")?,
        termination_date: row.get("termination_date")?,
        start_date: row.get("start_date")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        gender: row.get("gender")?,
        marital_status: row.get("marital_status")?,
        education: row.get("education")?,
        device_user_id: row.get("device_user_id")?,
        current_shift: row.get("current_shift")?,
        manager_id: row.get("manager_id")?,
        exclude_vacation_policy: row.get("exclude_vacation_policy")?,
        is_archived: row.get("is_archived")?,
        archived_date: row.get("archived_date")?,
    })
}

fn blank_to_none(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Database {
    fn allocate_employee_id(&self) -> HrResult<String> {
        let prefix = self
            .get_setting(keys::EMPLOYEE_ID_PREFIX)?
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| self.default_policy().general.employee_id_prefix.clone());
        let n = self.increment_counter(EMPLOYEE_ID_COUNTER)?;
        Ok(format!("{}{:04}", prefix.trim(), n))
    }

    /// Reserves the next generated employee id, e.g. `EMP0007`.
    pub fn next_employee_id(&self) -> HrResult<String> {
        let tx = self.conn().unchecked_transaction()?;
        let id = self.allocate_employee_id()?;
        tx.commit()?;
        Ok(id)
    }

    fn check_references(&self, new: &NewEmployee, own_id: Option<&str>) -> HrResult<()> {
        if let Some(device_user_id) = blank_to_none(new.device_user_id.as_deref()) {
            if let Some(other) = self.find_by_device_user_id(&device_user_id)? {
                if Some(other.id.as_str()) != own_id {
                    return Err(HrError::DuplicateDeviceUserId { device_user_id });
                }
            }
        }
        if let Some(department_id) = new.department_id {
            self.get_department(department_id)?;
        }
        if let Some(manager_id) = new.manager_id.as_deref().filter(|m| !m.is_empty()) {
            if Some(manager_id) == own_id {
                return Err(HrError::invalid("manager_id", "an employee cannot manage themselves"));
            }
            self.get_employee(manager_id, true)?;
        }
        Ok(())
    }

    /// Validates and inserts an employee, returning the generated id.
    ///
    /// # Errors
    ///
    /// - [`HrError::InvalidInput`] when a field fails validation
    /// - [`HrError::DuplicateDeviceUserId`] when another employee already
    ///   has the device user id
    /// - [`HrError::DepartmentNotFound`] / [`HrError::EmployeeNotFound`] for
    ///   a missing department or manager
    pub fn add_employee(&self, new: &NewEmployee) -> HrResult<String> {
        new.validate()?;
        self.check_references(new, None)?;
        let vacation_days = match new.vacation_days {
            Some(days) => days,
            None => self.load_policy()?.schedule.default_annual_leave_days,
        };
        let device_user_id = blank_to_none(new.device_user_id.as_deref());

        let tx = self.conn().unchecked_transaction()?;
        let id = self.allocate_employee_id()?;
        let inserted = tx.execute(
            "INSERT INTO employees (
                id, name, department_id, position, salary, vacation_days, status, start_date,
                phone, email, gender, marital_status, education, device_user_id, current_shift,
                manager_id, exclude_vacation_policy
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                id,
                new.name.trim(),
                new.department_id,
                blank_to_none(new.position.as_deref()),
                new.salary.to_string(),
                vacation_days,
                new.status.unwrap_or(EmployeeStatus::Active),
                new.start_date,
                blank_to_none(new.phone.as_deref()),
                blank_to_none(new.email.as_deref()),
                blank_to_none(new.gender.as_deref()),
                blank_to_none(new.marital_status.as_deref()),
                blank_to_none(new.education.as_deref()),
                device_user_id,
                new.current_shift.unwrap_or(WorkShift::Morning),
                blank_to_none(new.manager_id.as_deref()),
                new.exclude_vacation_policy,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) && device_user_id.is_some() => {
                return Err(HrError::DuplicateDeviceUserId {
                    device_user_id: device_user_id.unwrap_or_default(),
                });
            }
            Err(e) => return Err(e.into()),
        }
        tx.commit()?;
        info!(employee_id = %id, name = %new.name.trim(), "employee added");
        Ok(id)
    }

    /// Fetches an employee. Archived employees are only returned when
    /// `include_archived` is set.
    pub fn get_employee(&self, employee_id: &str, include_archived: bool) -> HrResult<Employee> {
        let employee = self
            .conn()
            .query_row(
                &format!("{EMPLOYEE_SELECT} WHERE e.id = ?1"),
                params![employee_id],
                employee_from_row,
            )
            .optional()?
            .filter(|e| include_archived || !e.is_archived);
        employee.ok_or_else(|| HrError::EmployeeNotFound {
            employee_id: employee_id.to_string(),
        })
    }

    /// The employee enrolled on the fingerprint terminal under this id.
    pub fn find_by_device_user_id(&self, device_user_id: &str) -> HrResult<Option<Employee>> {
        Ok(self
            .conn()
            .query_row(
                &format!("{EMPLOYEE_SELECT} WHERE e.device_user_id = ?1"),
                params![device_user_id.trim()],
                employee_from_row,
            )
            .optional()?)
    }

    /// Lists employees matching the filter, ordered by name.
    pub fn list_employees(&self, filter: &EmployeeFilter) -> HrResult<Vec<Employee>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if !filter.include_archived {
            clauses.push("e.is_archived = 0");
        }
        if let Some(status) = filter.status {
            clauses.push("e.status = ?");
            values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(department_id) = filter.department_id {
            clauses.push("e.department_id = ?");
            values.push(Value::Integer(department_id));
        }
        if let Some(name) = filter.name_contains.as_deref().filter(|n| !n.is_empty()) {
            clauses.push("LOWER(e.name) LIKE ?");
            values.push(Value::Text(format!("%{}%", name.to_lowercase())));
        }
        let mut sql = EMPLOYEE_SELECT.to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY e.name, e.id");

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), employee_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Active, non-archived employees ordered by name.
    pub fn active_employees(&self) -> HrResult<Vec<Employee>> {
        self.list_employees(&EmployeeFilter {
            status: Some(EmployeeStatus::Active),
            ..Default::default()
        })
    }

    /// Replaces an employee's editable fields.
    ///
    /// `status` and `current_shift` are left unchanged when `None`;
    /// `vacation_days` likewise.
    pub fn update_employee(&self, employee_id: &str, changes: &NewEmployee) -> HrResult<()> {
        changes.validate()?;
        let current = self.get_employee(employee_id, true)?;
        self.check_references(changes, Some(employee_id))?;
        let device_user_id = blank_to_none(changes.device_user_id.as_deref());

        let updated = self.conn().execute(
            "UPDATE employees SET
                name = ?2, department_id = ?3, position = ?4, salary = ?5, vacation_days = ?6,
                status = ?7, start_date = ?8, phone = ?9, email = ?10, gender = ?11,
                marital_status = ?12, education = ?13, device_user_id = ?14, current_shift = ?15,
                manager_id = ?16, exclude_vacation_policy = ?17
             WHERE id = ?1",
            params![
                employee_id,
                changes.name.trim(),
                changes.department_id,
                blank_to_none(changes.position.as_deref()),
                changes.salary.to_string(),
                changes.vacation_days.unwrap_or(current.vacation_days),
                changes.status.unwrap_or(current.status),
                changes.start_date,
                blank_to_none(changes.phone.as_deref()),
                blank_to_none(changes.email.as_deref()),
                blank_to_none(changes.gender.as_deref()),
                blank_to_none(changes.marital_status.as_deref()),
                blank_to_none(changes.education.as_deref()),
                device_user_id,
                changes.current_shift.unwrap_or(current.current_shift),
                blank_to_none(changes.manager_id.as_deref()),
                changes.exclude_vacation_policy,
            ],
        );
        match updated {
            Ok(_) => {
                info!(employee_id, "employee updated");
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => Err(HrError::DuplicateDeviceUserId {
                device_user_id: device_user_id.unwrap_or_default(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes an employee and, through cascades, their records.
    pub fn delete_employee(&self, employee_id: &str) -> HrResult<()> {
        let deleted = self
            .conn()
            .execute("DELETE FROM employees WHERE id = ?1", params![employee_id])?;
        if deleted == 0 {
            return Err(HrError::EmployeeNotFound {
                employee_id: employee_id.to_string(),
            });
        }
        warn!(employee_id, "employee deleted");
        Ok(())
    }

    /// Changes an employee's status.
    ///
    /// Terminating records `effective` as the termination date; any other
    /// status clears it.
    pub fn set_status(
        &self,
        employee_id: &str,
        status: EmployeeStatus,
        effective: NaiveDate,
    ) -> HrResult<()> {
        let termination_date = (status == EmployeeStatus::Terminated).then_some(effective);
        let updated = self.conn().execute(
            "UPDATE employees SET status = ?2, termination_date = ?3 WHERE id = ?1",
            params![employee_id, status, termination_date],
        )?;
        if updated == 0 {
            return Err(HrError::EmployeeNotFound {
                employee_id: employee_id.to_string(),
            });
        }
        info!(employee_id, status = %status, "employee status changed");
        Ok(())
    }

    /// Archives Terminated employees whose termination date is on or
    /// before `cutoff` (`YYYY-MM-DD`). Returns how many were archived.
    ///
    /// # Errors
    ///
    /// [`HrError::InvalidInput`] when `cutoff` is empty or not a date.
    pub fn archive_terminated_employees(&self, cutoff: &str) -> HrResult<usize> {
        let cutoff = cutoff.trim();
        if cutoff.is_empty() {
            return Err(HrError::invalid("cutoff", "a cutoff date is required"));
        }
        let cutoff = NaiveDate::parse_from_str(cutoff, "%Y-%m-%d").map_err(|_| {
            HrError::invalid("cutoff", format!("'{}' is not a YYYY-MM-DD date", cutoff))
        })?;
        let archived = self.conn().execute(
            "UPDATE employees SET is_archived = 1, archived_date = ?2
             WHERE status = ?3 AND is_archived = 0
               AND termination_date IS NOT NULL AND termination_date <= ?1",
            params![cutoff, now(), EmployeeStatus::Terminated],
        )?;
        info!(%cutoff, archived, "terminated employees archived");
        Ok(archived)
    }

    /// Moves every active, non-archived employee to the next shift.
    ///
    /// Morning -> Evening -> Night -> Morning; an unrecognised stored shift
    /// restarts at Morning. Returns the number of employees rotated.
    pub fn rotate_shifts(&self) -> HrResult<usize> {
        let cases: String = WorkShift::ALL
            .iter()
            .map(|s| format!("WHEN '{}' THEN '{}' ", s.as_str(), s.next().as_str()))
            .collect();
        let sql = format!(
            "UPDATE employees SET current_shift = CASE current_shift {cases}ELSE '{}' END
             WHERE status = ?1 AND is_archived = 0",
            WorkShift::Morning.as_str()
        );
        let rotated = self.conn().execute(&sql, params![EmployeeStatus::Active])?;
        info!(rotated, "shifts rotated");
        Ok(rotated)
    }

    /// Appends to an employee's action history.
    pub fn log_action(
        &self,
        employee_id: &str,
        description: &str,
        performed_by_user_id: Option<i64>,
    ) -> HrResult<i64> {
        self.conn().execute(
            "INSERT INTO employee_action_log (employee_id, action_description, performed_by_user_id, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![employee_id, description, performed_by_user_id, now()],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// An employee's action history, newest first.
    pub fn action_log(&self, employee_id: &str) -> HrResult<Vec<ActionLogEntry>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, employee_id, action_description, performed_by_user_id, timestamp
             FROM employee_action_log WHERE employee_id = ?1 ORDER BY timestamp DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![employee_id], |r| {
            Ok(ActionLogEntry {
                id: r.get(0)?,
                employee_id: r.get(1)?,
                description: r.get(2)?,
                performed_by_user_id: r.get(3)?,
                timestamp: r.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support;
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_ids_are_sequential_with_prefix() {
        let db = test_support::db();
        assert_eq!(test_support::employee(&db, "Ana", 3000), "EMP0001");
        assert_eq!(test_support::employee(&db, "Ben", 3000), "EMP0002");
        db.set_setting(keys::EMPLOYEE_ID_PREFIX, "HR").unwrap();
        assert_eq!(db.next_employee_id().unwrap(), "HR0003");
    }

    #[test]
    fn test_duplicate_device_user_id_rejected() {
        let db = test_support::db();
        let mut new = NewEmployee::new("Ana", Decimal::from(3000));
        new.device_user_id = Some("101".to_string());
        db.add_employee(&new).unwrap();

        new.name = "Ben".to_string();
        let err = db.add_employee(&new).unwrap_err();
        assert!(matches!(err, HrError::DuplicateDeviceUserId { device_user_id } if device_user_id == "101"));
        assert_eq!(db.list_employees(&EmployeeFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_update_keeps_own_device_user_id() {
        let db = test_support::db();
        let mut new = NewEmployee::new("Ana", Decimal::from(3000));
        new.device_user_id = Some("101".to_string());
        let id = db.add_employee(&new).unwrap();
        new.position = Some("Clerk".to_string());
        db.update_employee(&id, &new).unwrap();
        assert_eq!(db.get_employee(&id, false).unwrap().position.as_deref(), Some("Clerk"));
    }

    #[test]
    fn test_default_vacation_days_from_policy() {
        let db = test_support::db();
        let id = test_support::employee(&db, "Ana", 3000);
        assert_eq!(db.get_employee(&id, false).unwrap().vacation_days, 21);
    }

    #[test]
    fn test_unknown_department_rejected() {
        let db = test_support::db();
        let mut new = NewEmployee::new("Ana", Decimal::from(3000));
        new.department_id = Some(99);
        assert!(matches!(
            db.add_employee(&new),
            Err(HrError::DepartmentNotFound { .. })
        ));
    }

    #[test]
    fn test_list_filters_by_name_and_status() {
        let db = test_support::db();
        let ana = test_support::employee(&db, "Ana Lopez", 3000);
        test_support::employee(&db, "Ben Ode", 3000);
        db.set_status(&ana, EmployeeStatus::Suspended, date(2025, 1, 1)).unwrap();

        let found = db
            .list_employees(&EmployeeFilter {
                name_contains: Some("LOPEZ".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(db.active_employees().unwrap().len(), 1);
    }

    #[test]
    fn test_archive_only_terminated_before_cutoff() {
        let db = test_support::db();
        let early = test_support::employee(&db, "Early", 3000);
        let late = test_support::employee(&db, "Late", 3000);
        let active = test_support::employee(&db, "Active", 3000);
        db.set_status(&early, EmployeeStatus::Terminated, date(2024, 5, 1)).unwrap();
        db.set_status(&late, EmployeeStatus::Terminated, date(2024, 8, 1)).unwrap();

        assert_eq!(db.archive_terminated_employees("2024-06-30").unwrap(), 1);
        assert!(db.get_employee(&early, false).is_err());
        assert!(db.get_employee(&early, true).unwrap().is_archived);
        assert!(!db.get_employee(&late, false).unwrap().is_archived);
        assert!(!db.get_employee(&active, false).unwrap().is_archived);
    }

    #[test]
    fn test_archive_rejects_bad_cutoff() {
        let db = test_support::db();
        assert!(matches!(
            db.archive_terminated_employees(""),
            Err(HrError::InvalidInput { .. })
        ));
        assert!(matches!(
            db.archive_terminated_employees("30/06/2024"),
            Err(HrError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_rotate_shifts_cycles_active_only() {
        let db = test_support::db();
        let a = test_support::employee(&db, "A", 3000);
        let b = test_support::employee(&db, "B", 3000);
        db.set_status(&b, EmployeeStatus::Terminated, date(2025, 1, 1)).unwrap();
        db.conn()
            .execute("UPDATE employees SET current_shift = 'Night' WHERE id = ?1", [&a])
            .unwrap();

        assert_eq!(db.rotate_shifts().unwrap(), 1);
        assert_eq!(db.get_employee(&a, false).unwrap().current_shift, WorkShift::Morning);
        assert_eq!(db.get_employee(&b, false).unwrap().current_shift, WorkShift::Morning);
        db.rotate_shifts().unwrap();
        assert_eq!(db.get_employee(&a, false).unwrap().current_shift, WorkShift::Evening);
    }

    #[test]
    fn test_rotate_unknown_shift_restarts_at_morning() {
        let db = test_support::db();
        let a = test_support::employee(&db, "A", 3000);
        db.conn()
            .execute("UPDATE employees SET current_shift = 'Graveyard' WHERE id = ?1", [&a])
            .unwrap();
        db.rotate_shifts().unwrap();
        assert_eq!(db.get_employee(&a, false).unwrap().current_shift, WorkShift::Morning);
    }

    #[test]
    fn test_action_log_round_trip() {
        let db = test_support::db();
        let a = test_support::employee(&db, "A", 3000);
        db.log_action(&a, "Promoted", Some(1)).unwrap();
        let log = db.action_log(&a).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].description, "Promoted");
    }

    #[test]
    fn test_delete_missing_employee() {
        let db = test_support::db();
        assert!(matches!(
            db.delete_employee("EMP9999"),
            Err(HrError::EmployeeNotFound { .. })
        ));
    }
}
