//! Vacation entitlement and balance.
//!
//! The balance for a year is the entitlement earned so far, plus days
//! carried over from the previous year (capped), minus approved vacation
//! days taken in the year. Days are counted as inclusive calendar days.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::VacationMethod;

/// Inputs that come from policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VacationRules {
    /// How the allocation is earned.
    pub method: VacationMethod,
    /// Cap on unused days carried into the next year.
    pub max_carry_over_days: i64,
}

/// An employee's vacation position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VacationBalance {
    /// The employee is excluded from the vacation policy.
    Excluded,
    /// A computed balance.
    Days {
        /// Calendar year described.
        year: i32,
        /// Days earned this year.
        entitled: Decimal,
        /// Days carried from last year.
        carried_over: Decimal,
        /// Approved vacation days taken this year.
        taken: i64,
        /// entitled + carried_over - taken. Negative when overdrawn.
        remaining: Decimal,
    },
}

impl VacationBalance {
    /// Remaining days, `None` for excluded employees.
    pub fn remaining(&self) -> Option<Decimal> {
        match self {
            VacationBalance::Excluded => None,
            VacationBalance::Days { remaining, .. } => Some(*remaining),
        }
    }
}

impl std::fmt::Display for VacationBalance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VacationBalance::Excluded => f.write_str("N/A (Excluded)"),
            VacationBalance::Days { remaining, .. } => write!(f, "{}", remaining.normalize()),
        }
    }
}

/// Days of `[start, end]` that fall inside `year`, inclusive.
pub fn days_in_year(start: NaiveDate, end: NaiveDate, year: i32) -> i64 {
    let (Some(year_start), Some(year_end)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        return 0;
    };
    let from = start.max(year_start);
    let to = end.min(year_end);
    if to < from { 0 } else { (to - from).num_days() + 1 }
}

/// Whole months from `from` to `to`, clamped to `0..=12`.
fn completed_months(from: NaiveDate, to: NaiveDate) -> i64 {
    if to < from {
        return 0;
    }
    let mut months = i64::from(to.year() - from.year()) * 12 + i64::from(to.month())
        - i64::from(from.month());
    if to.day() < from.day() {
        months -= 1;
    }
    months.clamp(0, 12)
}

fn entitlement(
    allocation: i64,
    method: VacationMethod,
    employment_start: Option<NaiveDate>,
    year: i32,
    as_of: NaiveDate,
) -> Decimal {
    let allocation = Decimal::from(allocation.max(0));
    match method {
        VacationMethod::FixedAnnualAllocation => allocation,
        VacationMethod::MonthlyAccrual => {
            let Some(year_start) = NaiveDate::from_ymd_opt(year, 1, 1) else {
                return Decimal::ZERO;
            };
            let accrual_start = employment_start.map_or(year_start, |s| s.max(year_start));
            let months = completed_months(accrual_start, as_of);
            (allocation * Decimal::from(months) / Decimal::from(12)).round_dp(2)
        }
    }
}

/// Computes the vacation balance as of a date.
///
/// `approved_vacations` are the inclusive date ranges of the employee's
/// approved vacation requests, in any year.
///
/// ```
/// use hr_engine::calculation::{VacationBalance, VacationRules, vacation_balance};
/// use hr_engine::config::VacationMethod;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
/// let rules = VacationRules { method: VacationMethod::FixedAnnualAllocation, max_carry_over_days: 0 };
/// let balance = vacation_balance(21, false, Some(d(1, 1)), &[(d(3, 3), d(3, 7))], d(6, 1), rules);
/// assert_eq!(balance.remaining(), Some(Decimal::from(16)));
/// ```
pub fn vacation_balance(
    allocation_days: i64,
    excluded: bool,
    employment_start: Option<NaiveDate>,
    approved_vacations: &[(NaiveDate, NaiveDate)],
    as_of: NaiveDate,
    rules: VacationRules,
) -> VacationBalance {
    if excluded {
        return VacationBalance::Excluded;
    }
    let year = as_of.year();

    let taken: i64 = approved_vacations
        .iter()
        .map(|(s, e)| days_in_year(*s, *e, year))
        .sum();

    let entitled = entitlement(allocation_days, rules.method, employment_start, year, as_of);

    let started_before_year = employment_start.is_none_or(|s| s.year() < year);
    let carried_over = if started_before_year && rules.max_carry_over_days > 0 {
        let prev_year = year - 1;
        let taken_prev: i64 = approved_vacations
            .iter()
            .map(|(s, e)| days_in_year(*s, *e, prev_year))
            .sum();
        let prev_entitled = NaiveDate::from_ymd_opt(prev_year, 12, 31).map_or(Decimal::ZERO, |end| {
            entitlement(allocation_days, rules.method, employment_start, prev_year, end)
        });
        (prev_entitled - Decimal::from(taken_prev))
            .max(Decimal::ZERO)
            .min(Decimal::from(rules.max_carry_over_days))
    } else {
        Decimal::ZERO
    };

    VacationBalance::Days {
        year,
        entitled,
        carried_over,
        taken,
        remaining: entitled + carried_over - Decimal::from(taken),
    }
}
