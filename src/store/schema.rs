//! Table definitions and first-run seed data.

use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::config::Policy;
use crate::error::HrResult;
use crate::models::Role;

use super::users::hash_password;

/// Name of the counter that numbers generated employee ids.
pub const EMPLOYEE_ID_COUNTER: &str = "next_employee_id";

/// Username of the account created on first run.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS departments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT
);

CREATE TABLE IF NOT EXISTS employees (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    department_id INTEGER REFERENCES departments(id) ON DELETE SET NULL,
    position TEXT,
    salary TEXT NOT NULL DEFAULT '0',
    vacation_days INTEGER NOT NULL DEFAULT 21,
    status TEXT NOT NULL DEFAULT 'Active',
    termination_date TEXT,
    start_date TEXT,
    phone TEXT,
    email TEXT,
    gender TEXT,
    marital_status TEXT,
    education TEXT,
    device_user_id TEXT UNIQUE,
    current_shift TEXT NOT NULL DEFAULT 'Morning',
    manager_id TEXT REFERENCES employees(id) ON DELETE SET NULL,
    exclude_vacation_policy INTEGER NOT NULL DEFAULT 0,
    is_archived INTEGER NOT NULL DEFAULT 0,
    archived_date TEXT
);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL,
    employee_id TEXT UNIQUE REFERENCES employees(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS attendance_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id TEXT NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    clock_in TEXT NOT NULL,
    clock_out TEXT,
    log_date TEXT NOT NULL,
    source TEXT NOT NULL DEFAULT 'Manual',
    notes TEXT
);
CREATE INDEX IF NOT EXISTS idx_attendance_employee_date ON attendance_log(employee_id, log_date);

CREATE TABLE IF NOT EXISTS leave_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id TEXT NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    leave_type TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    reason TEXT,
    request_date TEXT NOT NULL,
    status TEXT NOT NULL,
    assigned_approver_user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    processed_by_user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    approver_comments TEXT,
    processed_date TEXT
);

CREATE TABLE IF NOT EXISTS allowances (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id TEXT NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    type TEXT NOT NULL,
    amount TEXT NOT NULL,
    is_recurring INTEGER NOT NULL DEFAULT 1,
    effective_date TEXT NOT NULL,
    end_date TEXT
);

CREATE TABLE IF NOT EXISTS deductions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id TEXT NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    type TEXT NOT NULL,
    amount TEXT NOT NULL,
    is_recurring INTEGER NOT NULL DEFAULT 1,
    effective_date TEXT NOT NULL,
    end_date TEXT
);

CREATE TABLE IF NOT EXISTS salary_advances (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id TEXT NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    advance_date TEXT NOT NULL,
    amount TEXT NOT NULL,
    repayment_per_period TEXT NOT NULL,
    repayment_start_date TEXT NOT NULL,
    total_repaid TEXT NOT NULL DEFAULT '0',
    status TEXT NOT NULL DEFAULT 'Active'
);

CREATE TABLE IF NOT EXISTS payslips (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id TEXT NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    period_start TEXT NOT NULL,
    period_end TEXT NOT NULL,
    basic_salary TEXT NOT NULL,
    overtime_pay TEXT NOT NULL DEFAULT '0',
    total_allowances TEXT NOT NULL,
    gross_salary TEXT NOT NULL,
    total_deductions TEXT NOT NULL,
    advance_repayment TEXT NOT NULL DEFAULT '0',
    net_pay TEXT NOT NULL,
    generation_date TEXT NOT NULL,
    notes TEXT,
    UNIQUE (employee_id, period_start, period_end)
);

CREATE TABLE IF NOT EXISTS contracts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id TEXT NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    contract_type TEXT NOT NULL,
    start_date TEXT NOT NULL,
    initial_duration_years INTEGER,
    current_end_date TEXT,
    is_auto_renewable INTEGER NOT NULL DEFAULT 0,
    renewal_term_years INTEGER,
    notice_period_days INTEGER NOT NULL DEFAULT 30,
    lifecycle_status TEXT NOT NULL DEFAULT 'Draft',
    approval_status TEXT NOT NULL DEFAULT 'Pending Approval',
    assigned_approver_user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    approval_comments TEXT,
    approval_processed_by_user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    approval_processed_date TEXT,
    custom_terms TEXT,
    position TEXT,
    salary TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS evaluation_criteria (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    max_points INTEGER NOT NULL CHECK (max_points > 0)
);

CREATE TABLE IF NOT EXISTS employee_evaluations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id TEXT NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    evaluation_period TEXT,
    evaluation_date TEXT NOT NULL,
    total_score TEXT NOT NULL,
    evaluator_user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    comments TEXT
);

CREATE TABLE IF NOT EXISTS evaluation_details (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    evaluation_id INTEGER NOT NULL REFERENCES employee_evaluations(id) ON DELETE CASCADE,
    criterion_id INTEGER NOT NULL REFERENCES evaluation_criteria(id),
    score TEXT NOT NULL,
    comment TEXT
);

CREATE TABLE IF NOT EXISTS app_settings (
    setting_key TEXT PRIMARY KEY,
    setting_value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS app_counters (
    counter_name TEXT PRIMARY KEY,
    current_value INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS employee_action_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id TEXT NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    action_description TEXT NOT NULL,
    performed_by_user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    timestamp TEXT NOT NULL
);
";

/// Creates every table that does not exist yet and seeds first-run rows.
///
/// Safe to run on every open: seed rows use `INSERT OR IGNORE`, so stored
/// settings and counters are never reset.
pub(crate) fn initialize(conn: &Connection, defaults: &Policy) -> HrResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;

    conn.execute(
        "INSERT OR IGNORE INTO app_counters (counter_name, current_value) VALUES (?1, 1)",
        params![EMPLOYEE_ID_COUNTER],
    )?;

    let mut seeded = 0;
    {
        let mut stmt = conn.prepare(
            "INSERT OR IGNORE INTO app_settings (setting_key, setting_value) VALUES (?1, ?2)",
        )?;
        for (key, value) in defaults.to_settings() {
            seeded += stmt.execute(params![key, value])?;
        }
    }
    if seeded > 0 {
        debug!(seeded, "default settings written");
    }

    let users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
    if users == 0 {
        conn.execute(
            "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)",
            params![
                DEFAULT_ADMIN_USERNAME,
                hash_password(DEFAULT_ADMIN_PASSWORD),
                Role::Admin
            ],
        )?;
        info!(username = DEFAULT_ADMIN_USERNAME, "default administrator created");
    }
    Ok(())
}
