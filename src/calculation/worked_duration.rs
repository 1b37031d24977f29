use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::warn;

const SECONDS_PER_HOUR: Decimal = Decimal::from_parts(3600, 0, 0, false, 0);

/// Hours between clock-in and clock-out, rounded to two decimal places.
///
/// Returns `None` when either timestamp is missing and zero when the
/// clock-out is not after the clock-in.
///
/// ```
/// use hr_engine::calculation::worked_hours;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let day = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
/// let clock_in = day.and_hms_opt(9, 0, 0).unwrap();
/// let clock_out = day.and_hms_opt(17, 30, 0).unwrap();
/// assert_eq!(worked_hours(Some(clock_in), Some(clock_out)), Some(Decimal::new(85, 1)));
/// assert_eq!(worked_hours(Some(clock_in), None), None);
/// ```
pub fn worked_hours(
    clock_in: Option<NaiveDateTime>,
    clock_out: Option<NaiveDateTime>,
) -> Option<Decimal> {
    let (clock_in, clock_out) = (clock_in?, clock_out?);
    if clock_out <= clock_in {
        warn!(%clock_in, %clock_out, "clock-out not after clock-in, counting zero hours");
        return Some(Decimal::ZERO);
    }
    let seconds = (clock_out - clock_in).num_seconds();
    Some((Decimal::from(seconds) / SECONDS_PER_HOUR).round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 3)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_full_day() {
        assert_eq!(worked_hours(Some(at(9, 0)), Some(at(17, 0))), Some(Decimal::from(8)));
    }

    #[test]
    fn test_partial_hour_rounds_to_cents() {
        // 20 minutes = 0.3333...
        assert_eq!(
            worked_hours(Some(at(9, 0)), Some(at(9, 20))),
            Some(Decimal::new(33, 2))
        );
    }

    #[test]
    fn test_reversed_times_count_zero() {
        assert_eq!(worked_hours(Some(at(17, 0)), Some(at(9, 0))), Some(Decimal::ZERO));
        assert_eq!(worked_hours(Some(at(9, 0)), Some(at(9, 0))), Some(Decimal::ZERO));
    }

    #[test]
    fn test_missing_times() {
        assert_eq!(worked_hours(None, Some(at(9, 0))), None);
        assert_eq!(worked_hours(Some(at(9, 0)), None), None);
    }

    #[test]
    fn test_overnight_shift() {
        let start = at(22, 0);
        let end = NaiveDate::from_ymd_opt(2025, 3, 4)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        assert_eq!(worked_hours(Some(start), Some(end)), Some(Decimal::from(8)));
    }
}
