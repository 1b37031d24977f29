//! Fingerprint terminal log parsing and daily summaries.
//!
//! Terminals export CSV with the columns `EmployeeID`, `Timestamp`
//! (`YYYY-MM-DD HH:MM:SS`), `EventCode` and an optional `DeviceID`. Header
//! names are matched case-insensitively with spaces removed. Rows that
//! cannot be read are skipped and reported, never fatal.

use std::collections::BTreeMap;
use std::io::Read;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{HrError, HrResult};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const REQUIRED_HEADERS: [&str; 3] = ["employeeid", "timestamp", "eventcode"];

/// Terminal event codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintEventKind {
    /// Code 0.
    CheckIn,
    /// Code 1.
    CheckOut,
    /// Code 2, leaving for a break.
    BreakOut,
    /// Code 3, returning from a break.
    BreakIn,
}

impl FingerprintEventKind {
    /// Maps a terminal code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::CheckIn),
            1 => Some(Self::CheckOut),
            2 => Some(Self::BreakOut),
            3 => Some(Self::BreakIn),
            _ => None,
        }
    }

    /// The terminal code.
    pub fn code(self) -> i64 {
        match self {
            Self::CheckIn => 0,
            Self::CheckOut => 1,
            Self::BreakOut => 2,
            Self::BreakIn => 3,
        }
    }
}

/// One parsed terminal event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintEvent {
    /// The id enrolled on the terminal.
    pub device_user_id: String,
    /// When the event happened.
    pub timestamp: NaiveDateTime,
    /// Event kind.
    pub kind: FingerprintEventKind,
    /// Terminal id, when exported.
    pub device_id: Option<String>,
}

/// A row that was not imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// Line number in the file, header is line 1.
    pub line: u64,
    /// Why it was skipped.
    pub reason: String,
}

/// Result of parsing a terminal export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOutcome {
    /// Events in file order.
    pub events: Vec<FingerprintEvent>,
    /// Rows that were skipped.
    pub skipped: Vec<SkippedRow>,
}

fn normalize_header(name: &str) -> String {
    name.trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

struct Columns {
    employee: usize,
    timestamp: usize,
    event_code: usize,
    device: Option<usize>,
}

fn parse_row(record: &csv::StringRecord, columns: &Columns) -> Result<FingerprintEvent, String> {
    let field = |col: usize| record.get(col).unwrap_or("").trim();
    let device_user_id = field(columns.employee);
    let timestamp = field(columns.timestamp);
    let code = field(columns.event_code);
    if device_user_id.is_empty() || timestamp.is_empty() || code.is_empty() {
        return Err("missing employee id, timestamp or event code".to_string());
    }
    let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .map_err(|e| format!("invalid timestamp '{}': {}", timestamp, e))?;
    let code: i64 = code
        .parse()
        .map_err(|_| format!("invalid event code '{}'", code))?;
    let kind = FingerprintEventKind::from_code(code)
        .ok_or_else(|| format!("unknown event code {}", code))?;
    let device_id = columns
        .device
        .map(field)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    Ok(FingerprintEvent {
        device_user_id: device_user_id.to_string(),
        timestamp,
        kind,
        device_id,
    })
}

/// Parses a terminal CSV export.
///
/// `source` names the input in errors and logs.
///
/// # Errors
///
/// [`HrError::CsvImport`] when the header cannot be read or a required
/// column is missing.
///
/// # Example
///
/// ```
/// use hr_engine::calculation::{FingerprintEventKind, parse_fingerprint_csv};
///
/// let data = "Employee ID,Timestamp,Event Code\n\
///             42,2025-03-03 08:58:00,0\n\
///             42,not a time,1\n";
/// let outcome = parse_fingerprint_csv(data.as_bytes(), "inline").unwrap();
/// assert_eq!(outcome.events.len(), 1);
/// assert_eq!(outcome.events[0].kind, FingerprintEventKind::CheckIn);
/// assert_eq!(outcome.skipped.len(), 1);
/// ```
pub fn parse_fingerprint_csv<R: Read>(reader: R, source: &str) -> HrResult<ParseOutcome> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| HrError::CsvImport {
            path: source.to_string(),
            message: e.to_string(),
        })?
        .iter()
        .map(normalize_header)
        .collect();

    let missing: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .copied()
        .filter(|h| !headers.iter().any(|found| found == h))
        .collect();
    if !missing.is_empty() {
        return Err(HrError::CsvImport {
            path: source.to_string(),
            message: format!(
                "missing required headers: {}. Found: {}",
                missing.join(", "),
                headers.join(", ")
            ),
        });
    }

    let column = |name: &str| headers.iter().position(|h| h == name);
    let (Some(employee), Some(timestamp), Some(event_code)) =
        (column("employeeid"), column("timestamp"), column("eventcode"))
    else {
        return Err(HrError::CsvImport {
            path: source.to_string(),
            message: "required headers could not be located".to_string(),
        });
    };
    let columns = Columns {
        employee,
        timestamp,
        event_code,
        device: column("deviceid"),
    };

    let mut outcome = ParseOutcome::default();
    for (index, record) in csv_reader.records().enumerate() {
        let fallback_line = index as u64 + 2;
        let parsed = match record {
            Ok(record) => {
                let line = record.position().map_or(fallback_line, |p| p.line());
                (line, parse_row(&record, &columns))
            }
            Err(e) => (
                e.position().map_or(fallback_line, |p| p.line()),
                Err(e.to_string()),
            ),
        };
        match parsed {
            (_, Ok(event)) => outcome.events.push(event),
            (line, Err(reason)) => {
                warn!(source = %source, line, reason = %reason, "Skipping fingerprint row");
                outcome.skipped.push(SkippedRow { line, reason });
            }
        }
    }
    Ok(outcome)
}

/// One employee's terminal activity on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEventSummary {
    /// The id enrolled on the terminal.
    pub device_user_id: String,
    /// Calendar day.
    pub date: NaiveDate,
    /// Earliest check-in.
    pub first_check_in: Option<NaiveDateTime>,
    /// Latest check-out.
    pub last_check_out: Option<NaiveDateTime>,
    /// Seconds between check-in (or return from break) and the next
    /// break-out or check-out.
    pub work_seconds: i64,
    /// Seconds between break-out and the next break-in.
    pub break_seconds: i64,
    /// Events seen that day.
    pub event_count: usize,
}

#[derive(Debug, Clone, Copy)]
enum Presence {
    Away,
    Working(NaiveDateTime),
    OnBreak(NaiveDateTime),
}

/// Groups events by employee and day and totals work and break time.
///
/// A return from break resumes work, so the interval up to the following
/// check-out counts as worked. A break still open at check-out is closed
/// as break time. Results are ordered by device user id, then date.
pub fn daily_event_summary(events: &[FingerprintEvent]) -> Vec<DailyEventSummary> {
    let mut grouped: BTreeMap<(String, NaiveDate), Vec<&FingerprintEvent>> = BTreeMap::new();
    for event in events {
        grouped
            .entry((event.device_user_id.clone(), event.timestamp.date()))
            .or_default()
            .push(event);
    }

    grouped
        .into_iter()
        .map(|((device_user_id, date), mut day)| {
            day.sort_by_key(|e| e.timestamp);
            let mut summary = DailyEventSummary {
                device_user_id,
                date,
                first_check_in: None,
                last_check_out: None,
                work_seconds: 0,
                break_seconds: 0,
                event_count: day.len(),
            };
            let mut presence = Presence::Away;
            for event in day {
                let t = event.timestamp;
                presence = match (event.kind, presence) {
                    (FingerprintEventKind::CheckIn, state) => {
                        if summary.first_check_in.is_none() {
                            summary.first_check_in = Some(t);
                        }
                        match state {
                            Presence::Working(since) => Presence::Working(since),
                            Presence::OnBreak(since) => {
                                summary.break_seconds += (t - since).num_seconds();
                                Presence::Working(t)
                            }
                            Presence::Away => Presence::Working(t),
                        }
                    }
                    (FingerprintEventKind::CheckOut, state) => {
                        match state {
                            Presence::Working(since) => {
                                summary.work_seconds += (t - since).num_seconds();
                            }
                            Presence::OnBreak(since) => {
                                summary.break_seconds += (t - since).num_seconds();
                            }
                            Presence::Away => {}
                        }
                        summary.last_check_out = Some(t);
                        Presence::Away
                    }
                    (FingerprintEventKind::BreakOut, state) => {
                        if let Presence::Working(since) = state {
                            summary.work_seconds += (t - since).num_seconds();
                        }
                        match state {
                            Presence::OnBreak(since) => Presence::OnBreak(since),
                            _ => Presence::OnBreak(t),
                        }
                    }
                    (FingerprintEventKind::BreakIn, state) => match state {
                        Presence::OnBreak(since) => {
                            summary.break_seconds += (t - since).num_seconds();
                            Presence::Working(t)
                        }
                        Presence::Working(since) => Presence::Working(since),
                        Presence::Away => Presence::Working(t),
                    },
                };
            }
            summary
        })
        .collect()
}
