//! Late arrival detection and penalties.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::LatePenaltyType;
use crate::models::AttendanceLog;

use super::WorkCalendar;

/// Whether an arrival was late, and by how much.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatenessCheck {
    /// Arrived after start + grace.
    pub is_late: bool,
    /// Whole minutes after the scheduled start (not after the grace
    /// period), rounded to nearest. Zero when on time.
    pub minutes_late: i64,
}

/// Compares a clock-in against the scheduled start plus grace period.
///
/// An arrival exactly at the end of the grace period is on time. Lateness
/// minutes are counted from the scheduled start.
///
/// ```
/// use hr_engine::calculation::evaluate_lateness;
/// use chrono::{NaiveDate, NaiveTime};
///
/// let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
/// let clock_in = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap().and_hms_opt(9, 20, 0).unwrap();
///
/// let check = evaluate_lateness(clock_in, start, 15);
/// assert!(check.is_late);
/// assert_eq!(check.minutes_late, 20);
/// ```
pub fn evaluate_lateness(
    clock_in: NaiveDateTime,
    scheduled_start: NaiveTime,
    grace_minutes: i64,
) -> LatenessCheck {
    let start = clock_in.date().and_time(scheduled_start);
    let allowed = start + TimeDelta::minutes(grace_minutes.max(0));
    if clock_in <= allowed {
        return LatenessCheck {
            is_late: false,
            minutes_late: 0,
        };
    }
    let seconds = (clock_in - start).num_seconds();
    // Round half up to the nearest minute.
    let minutes = (seconds + 30) / 60;
    LatenessCheck {
        is_late: true,
        minutes_late: minutes.max(0),
    }
}

/// First clock-ins that were late, one per workday at most.
///
/// Only the first clock-in of each workday is considered, so a return from
/// lunch never counts as a late arrival.
pub fn late_arrivals(
    logs: &[AttendanceLog],
    calendar: &WorkCalendar,
    scheduled_start: NaiveTime,
    grace_minutes: i64,
) -> Vec<(NaiveDate, NaiveDateTime)> {
    let mut first_in: BTreeMap<NaiveDate, NaiveDateTime> = BTreeMap::new();
    for log in logs.iter().filter(|l| calendar.is_workday(l.log_date)) {
        first_in
            .entry(log.log_date)
            .and_modify(|t| *t = (*t).min(log.clock_in))
            .or_insert(log.clock_in);
    }
    first_in
        .into_iter()
        .filter(|(_, clock_in)| evaluate_lateness(*clock_in, scheduled_start, grace_minutes).is_late)
        .collect()
}

/// Penalty for `late_days` late arrivals under the configured policy.
///
/// `amount` is a currency amount for [`LatePenaltyType::FixedAmount`] and a
/// percentage of `daily_rate` for [`LatePenaltyType::PercentageOfDailyRate`].
/// The result is rounded to two decimal places.
pub fn late_penalty(
    penalty_type: LatePenaltyType,
    amount: Decimal,
    daily_rate: Decimal,
    late_days: u32,
) -> Decimal {
    let days = Decimal::from(late_days);
    let penalty = match penalty_type {
        LatePenaltyType::None => Decimal::ZERO,
        LatePenaltyType::FixedAmount => amount * days,
        LatePenaltyType::PercentageOfDailyRate => {
            daily_rate * amount / Decimal::ONE_HUNDRED * days
        }
    };
    penalty.max(Decimal::ZERO).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn clock(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 3)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn nine() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn test_within_grace_is_on_time() {
        let check = evaluate_lateness(clock(9, 10, 0), nine(), 15);
        assert!(!check.is_late);
        assert_eq!(check.minutes_late, 0);
    }

    #[test]
    fn test_at_grace_boundary_is_on_time() {
        assert!(!evaluate_lateness(clock(9, 15, 0), nine(), 15).is_late);
        assert!(evaluate_lateness(clock(9, 15, 1), nine(), 15).is_late);
    }

    #[test]
    fn test_minutes_counted_from_scheduled_start() {
        let check = evaluate_lateness(clock(9, 45, 0), nine(), 15);
        assert!(check.is_late);
        assert_eq!(check.minutes_late, 45);
    }

    #[test]
    fn test_minutes_rounded_to_nearest() {
        assert_eq!(evaluate_lateness(clock(9, 20, 29), nine(), 15).minutes_late, 20);
        assert_eq!(evaluate_lateness(clock(9, 20, 30), nine(), 15).minutes_late, 21);
    }

    #[test]
    fn test_zero_grace() {
        assert!(evaluate_lateness(clock(9, 0, 1), nine(), 0).is_late);
    }

    #[test]
    fn test_late_arrivals_one_per_day_first_clock_in() {
        let log = |id: i64, t: NaiveDateTime| AttendanceLog {
            id,
            employee_id: "EMP0001".to_string(),
            clock_in: t,
            clock_out: None,
            log_date: t.date(),
            source: "Manual".to_string(),
            notes: None,
        };
        let tuesday = |h, m| {
            NaiveDate::from_ymd_opt(2025, 3, 4)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap()
        };
        let saturday = NaiveDate::from_ymd_opt(2025, 3, 8)
            .unwrap()
            .and_hms_opt(11, 0, 0)
            .unwrap();
        let logs = vec![
            log(1, clock(9, 30, 0)),   // Monday, late
            log(2, clock(14, 0, 0)),   // Monday after lunch
            log(3, tuesday(13, 0)),    // Tuesday afternoon
            log(4, tuesday(9, 0)),     // Tuesday first, on time
            log(5, saturday),          // not a workday
        ];
        let late = late_arrivals(&logs, &WorkCalendar::default(), nine(), 15);
        assert_eq!(late, vec![(clock(9, 30, 0).date(), clock(9, 30, 0))]);
    }

    #[test]
    fn test_no_penalty_policy() {
        assert_eq!(
            late_penalty(LatePenaltyType::None, dec("50"), dec("200"), 3),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_fixed_penalty_per_day() {
        assert_eq!(
            late_penalty(LatePenaltyType::FixedAmount, dec("10"), dec("200"), 3),
            dec("30")
        );
    }

    #[test]
    fn test_percentage_penalty_of_daily_rate() {
        // 10% of 181.82 = 18.182 per day, three days = 54.546 -> 54.55
        assert_eq!(
            late_penalty(
                LatePenaltyType::PercentageOfDailyRate,
                dec("10"),
                dec("181.82"),
                3
            ),
            dec("54.55")
        );
    }
}
