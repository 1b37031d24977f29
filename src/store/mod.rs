//! SQLite persistence.
//!
//! [`Database`] owns one `rusqlite` connection with foreign keys enabled.
//! The schema is created on open and every table is reached through the
//! `impl Database` blocks in the submodules. Money is stored as decimal
//! text and dates as ISO-8601 text, so values survive a round trip exactly
//! and compare correctly as strings.

mod attendance;
mod contracts;
mod departments;
mod employees;
mod evaluations;
mod leave;
mod payroll;
pub mod schema;
mod settings;
mod users;

use std::path::Path;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime, Timelike};
use rusqlite::Connection;
use rusqlite::types::Type;
use rust_decimal::Decimal;
use tracing::info;

use crate::config::Policy;
use crate::error::HrResult;

pub use attendance::{SOURCE_FINGERPRINT, SOURCE_MANUAL};
pub use users::{hash_password, verify_password};

/// Handle to the HR database.
///
/// # Example
///
/// ```
/// use hr_engine::config::Policy;
/// use hr_engine::store::Database;
///
/// let db = Database::open_in_memory(Policy::default()).unwrap();
/// assert!(db.get_user_by_username("admin").unwrap().is_some());
/// ```
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    defaults: Policy,
}

impl Database {
    /// Opens (creating if needed) the database file at `path`.
    ///
    /// `defaults` seeds `app_settings` on first run and is the base that
    /// stored settings are overlaid on in [`Database::load_policy`].
    pub fn open<P: AsRef<Path>>(path: P, defaults: Policy) -> HrResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        schema::initialize(&conn, &defaults)?;
        info!(path = %path.display(), "database opened");
        Ok(Self { conn, defaults })
    }

    /// Opens a private in-memory database. Used by tests and previews.
    pub fn open_in_memory(defaults: Policy) -> HrResult<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn, &defaults)?;
        Ok(Self { conn, defaults })
    }

    /// The policy this database was opened with, before stored overrides.
    pub fn default_policy(&self) -> &Policy {
        &self.defaults
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Current local time to the second, as stored in timestamp columns.
pub(crate) fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Reads a decimal stored as text.
pub(crate) fn get_decimal(row: &rusqlite::Row<'_>, column: &str) -> rusqlite::Result<Decimal> {
    let idx = row.as_ref().column_index(column)?;
    let text: String = row.get(idx)?;
    parse_decimal(idx, &text)
}

/// Reads a nullable decimal stored as text.
pub(crate) fn get_opt_decimal(
    row: &rusqlite::Row<'_>,
    column: &str,
) -> rusqlite::Result<Option<Decimal>> {
    let idx = row.as_ref().column_index(column)?;
    let text: Option<String> = row.get(idx)?;
    text.map(|t| parse_decimal(idx, &t)).transpose()
}

fn parse_decimal(idx: usize, text: &str) -> rusqlite::Result<Decimal> {
    Decimal::from_str(text.trim())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::NewEmployee;

    pub fn db() -> Database {
        Database::open_in_memory(Policy::default()).unwrap()
    }

    pub fn employee(db: &Database, name: &str, salary: i64) -> String {
        db.add_employee(&NewEmployee::new(name, Decimal::from(salary)))
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_seeds_counter_settings_and_admin() {
        let db = test_support::db();
        let counter: i64 = db
            .conn()
            .query_row(
                "SELECT current_value FROM app_counters WHERE counter_name = ?1",
                [schema::EMPLOYEE_ID_COUNTER],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(counter, 1);
        assert_eq!(
            db.get_setting("standard_start_time").unwrap().as_deref(),
            Some("09:00:00")
        );
        assert!(db.authenticate("admin", "admin").unwrap().is_some());
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let db = test_support::db();
        let result = db.conn().execute(
            "INSERT INTO attendance_log (employee_id, clock_in, log_date) VALUES ('NOPE', '2025-01-01 09:00:00', '2025-01-01')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_reopen_keeps_stored_settings() {
        let path = std::env::temp_dir().join(format!("hr_engine_reopen_{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);
        {
            let db = Database::open(&path, Policy::default()).unwrap();
            db.set_setting("late_arrival_allowed_minutes", "5").unwrap();
        }
        let db = Database::open(&path, Policy::default()).unwrap();
        assert_eq!(db.load_policy().unwrap().schedule.late_arrival_allowed_minutes, 5);
        drop(db);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_decimal_text_round_trip() {
        let db = test_support::db();
        let value: Decimal = db
            .conn()
            .query_row("SELECT '1234.50' AS v", [], |r| get_decimal(r, "v"))
            .unwrap();
        assert_eq!(value, Decimal::new(123450, 2));
        let missing: Option<Decimal> = db
            .conn()
            .query_row("SELECT NULL AS v", [], |r| get_opt_decimal(r, "v"))
            .unwrap();
        assert_eq!(missing, None);
    }
}
