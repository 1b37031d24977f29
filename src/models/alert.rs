//! HR alerts and outbound notifications.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What an alert is about. Ordering is the report sort order within an
/// employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Workdays with no attendance and no approved leave.
    Absence,
    /// Late arrivals.
    Tardiness,
    /// A leave request waiting for a decision.
    PendingLeave,
}

/// One line of the HR alerts report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HrAlert {
    /// Employee id.
    pub employee_id: String,
    /// Employee name.
    pub employee_name: String,
    /// Alert kind.
    pub kind: AlertKind,
    /// Number of occurrences.
    pub count: usize,
    /// Dates involved.
    pub dates: Vec<NaiveDate>,
    /// Human-readable details.
    pub details: String,
}

/// A message handed to a [`crate::scheduler::Notifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Short topic, e.g. "absence_alert".
    pub category: String,
    /// One-line subject.
    pub subject: String,
    /// Full text.
    pub body: String,
}
