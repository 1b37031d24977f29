//! Importing fingerprint terminal exports as attendance logs.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::calculation::{SkippedRow, daily_event_summary, parse_fingerprint_csv};
use crate::error::{HrError, HrResult};
use crate::models::Employee;
use crate::store::{Database, SOURCE_FINGERPRINT};

/// What an import did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Events parsed from the file.
    pub events: usize,
    /// Rows that could not be parsed.
    pub skipped: Vec<SkippedRow>,
    /// Attendance logs written.
    pub logs_created: usize,
    /// Days already imported, left untouched.
    pub duplicates: usize,
    /// Days with events but no check-in.
    pub days_without_check_in: usize,
    /// Days with a check-in but no later check-out, not imported.
    pub days_without_check_out: usize,
    /// Terminal ids that match no employee.
    pub unknown_device_ids: BTreeSet<String>,
}

/// Imports a fingerprint CSV export from disk.
pub fn import_fingerprint_csv(db: &Database, path: impl AsRef<Path>) -> HrResult<ImportReport> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| HrError::CsvImport {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    import_fingerprint_reader(db, file, &path.display().to_string())
}

fn match_employee(db: &Database, device_user_id: &str) -> HrResult<Option<Employee>> {
    if let Some(employee) = db.find_by_device_user_id(device_user_id)? {
        return Ok(Some(employee));
    }
    match db.get_employee(device_user_id, false) {
        Ok(employee) => Ok(Some(employee)),
        Err(HrError::EmployeeNotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Imports fingerprint events from any reader.
///
/// Events are summarised per employee and day. Each day becomes one log
/// from the first check-in to the last check-out. A day with no check-out
/// after its first check-in is reported and skipped, so no imported day is
/// left open. Terminal ids match an employee's device user id
/// first, then the employee id. A day whose first check-in is already
/// logged counts as a duplicate.
pub fn import_fingerprint_reader<R: Read>(db: &Database, reader: R, source: &str) -> HrResult<ImportReport> {
    let parsed = parse_fingerprint_csv(reader, source)?;
    let mut report = ImportReport {
        events: parsed.events.len(),
        skipped: parsed.skipped,
        ..ImportReport::default()
    };

    for day in daily_event_summary(&parsed.events) {
        let Some(employee) = match_employee(db, &day.device_user_id)? else {
            report.unknown_device_ids.insert(day.device_user_id);
            continue;
        };
        let Some(clock_in) = day.first_check_in else {
            report.days_without_check_in += 1;
            continue;
        };
        if db.has_log_at(&employee.id, clock_in)? {
            report.duplicates += 1;
            continue;
        }
        let Some(clock_out) = day.last_check_out.filter(|out| *out > clock_in) else {
            warn!(employee_id = %employee.id, date = %day.date, "no check-out after first check-in, day skipped");
            report.days_without_check_out += 1;
            continue;
        };
        let notes = format!(
            "{} events, {} min worked, {} min break",
            day.event_count,
            day.work_seconds / 60,
            day.break_seconds / 60
        );
        db.insert_log(&employee.id, clock_in, Some(clock_out), SOURCE_FINGERPRINT, Some(&notes))?;
        report.logs_created += 1;
    }

    if !report.unknown_device_ids.is_empty() {
        warn!(
            source = %source,
            unknown = ?report.unknown_device_ids,
            "fingerprint ids with no matching employee"
        );
    }
    info!(
        source = %source,
        events = report.events,
        skipped = report.skipped.len(),
        logs_created = report.logs_created,
        duplicates = report.duplicates,
        without_check_out = report.days_without_check_out,
        "fingerprint import finished"
    );
    Ok(report)
}
