use rusqlite::{OptionalExtension, Row, params};
use tracing::info;

use crate::error::{HrError, HrResult, is_unique_violation};
use crate::models::{Department, EmployeeStatus};

use super::Database;

fn department_from_row(row: &Row<'_>) -> rusqlite::Result<Department> {
    Ok(Department {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
    })
}

fn duplicate_name(name: &str) -> HrError {
    HrError::invalid("name", format!("department '{}' already exists", name))
}

impl Database {
    /// Creates a department. Names are unique.
    pub fn add_department(&self, name: &str, description: Option<&str>) -> HrResult<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HrError::invalid("name", "must not be empty"));
        }
        match self.conn().execute(
            "INSERT INTO departments (name, description) VALUES (?1, ?2)",
            params![name, description],
        ) {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(duplicate_name(name)),
            Err(e) => return Err(e.into()),
        }
        let id = self.conn().last_insert_rowid();
        info!(department_id = id, name, "department added");
        Ok(id)
    }

    /// Looks up a department by id.
    pub fn get_department(&self, department_id: i64) -> HrResult<Department> {
        self.conn()
            .query_row(
                "SELECT id, name, description FROM departments WHERE id = ?1",
                params![department_id],
                department_from_row,
            )
            .optional()?
            .ok_or_else(|| HrError::DepartmentNotFound {
                department: department_id.to_string(),
            })
    }

    /// Looks up a department by exact name.
    pub fn get_department_by_name(&self, name: &str) -> HrResult<Department> {
        self.conn()
            .query_row(
                "SELECT id, name, description FROM departments WHERE name = ?1",
                params![name.trim()],
                department_from_row,
            )
            .optional()?
            .ok_or_else(|| HrError::DepartmentNotFound {
                department: name.to_string(),
            })
    }

    /// All departments, by name.
    pub fn list_departments(&self) -> HrResult<Vec<Department>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, name, description FROM departments ORDER BY name")?;
        let rows = stmt.query_map([], department_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Renames or redescribes a department.
    pub fn update_department(
        &self,
        department_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> HrResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HrError::invalid("name", "must not be empty"));
        }
        let updated = match self.conn().execute(
            "UPDATE departments SET name = ?2, description = ?3 WHERE id = ?1",
            params![department_id, name, description],
        ) {
            Ok(n) => n,
            Err(e) if is_unique_violation(&e) => return Err(duplicate_name(name)),
            Err(e) => return Err(e.into()),
        };
        if updated == 0 {
            return Err(HrError::DepartmentNotFound {
                department: department_id.to_string(),
            });
        }
        Ok(())
    }

    /// Deletes a department; its employees become unassigned.
    pub fn delete_department(&self, department_id: i64) -> HrResult<()> {
        let deleted = self
            .conn()
            .execute("DELETE FROM departments WHERE id = ?1", params![department_id])?;
        if deleted == 0 {
            return Err(HrError::DepartmentNotFound {
                department: department_id.to_string(),
            });
        }
        info!(department_id, "department deleted");
        Ok(())
    }

    /// Headcount used for leave load: Active or On Leave, not archived.
    pub fn active_employee_count(&self, department_id: i64) -> HrResult<u32> {
        let count: u32 = self.conn().query_row(
            "SELECT COUNT(*) FROM employees
             WHERE department_id = ?1 AND is_archived = 0 AND status IN (?2, ?3)",
            params![department_id, EmployeeStatus::Active, EmployeeStatus::OnLeave],
            |r| r.get(0),
        )?;
        Ok(count)
    }
}
