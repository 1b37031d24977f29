//! Core data models for the HR engine.
//!
//! This module contains the domain records stored in the database and the
//! result types produced by the calculation layer.

/// Declares a closed set of labels stored as TEXT in SQLite.
///
/// Generates the enum plus `as_str`, `Display`, `FromStr` and the rusqlite
/// conversions. Serde uses the same labels.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant ),+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The label stored in the database.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::HrError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| {
                        crate::error::HrError::invalid(
                            stringify!($name),
                            format!("unknown value '{}'", s),
                        )
                    })
            }
        }

        impl rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: crate::error::HrError| {
                        rusqlite::types::FromSqlError::Other(Box::new(e))
                    })
            }
        }
    };
}

mod alert;
mod attendance;
mod audit;
mod contract;
mod department;
mod employee;
mod evaluation;
mod leave;
mod payroll;
mod user;
mod validation;

pub use alert::{AlertKind, HrAlert, Notification};
pub use attendance::{AttendanceLog, AttendanceStatus, AttendanceSummary};
pub use audit::{AuditStep, AuditTrace, AuditWarning};
pub(crate) use contract::add_years;
pub use contract::{
    ApprovalStatus, Contract, ContractLifecycle, ContractType, DEFAULT_NOTICE_PERIOD_DAYS, NewContract,
};
pub use department::Department;
pub use employee::{ActionLogEntry, Employee, EmployeeFilter, EmployeeStatus, NewEmployee, WorkShift};
pub use evaluation::{
    Evaluation, EvaluationCriterion, EvaluationDetail, NewEvaluation, ScoreInput,
};
pub use leave::{LeaveRequest, LeaveStatus, NewLeaveRequest};
pub use payroll::{
    AdvanceStatus, NewSalaryAdvance, PayCategory, PayItem, PayItemKind, PayLine, PayTotals,
    PayrollResult, Payslip, SalaryAdvance,
};
pub use user::{Role, User};
pub use validation::{validate_email, validate_phone};
