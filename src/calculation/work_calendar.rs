//! Working calendar: which dates are workdays.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

/// Configured working weekdays plus public holidays.
///
/// # Example
///
/// ```
/// use hr_engine::calculation::WorkCalendar;
/// use chrono::NaiveDate;
///
/// let new_year = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(); // Wednesday
/// let calendar = WorkCalendar::new(&[0, 1, 2, 3, 4], [new_year]);
///
/// assert!(!calendar.is_workday(new_year));
/// let jan_start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
/// let jan_end = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
/// assert_eq!(calendar.expected_workdays(jan_start, jan_end), 22);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkCalendar {
    work_weekdays: [bool; 7],
    holidays: BTreeSet<NaiveDate>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self::new(&[0, 1, 2, 3, 4], [])
    }
}

impl WorkCalendar {
    /// Builds a calendar from weekday indices (0 = Monday) and holidays.
    /// Indices above 6 are ignored.
    pub fn new(work_days: &[u32], holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut work_weekdays = [false; 7];
        for &d in work_days {
            if let Some(slot) = work_weekdays.get_mut(d as usize) {
                *slot = true;
            }
        }
        Self {
            work_weekdays,
            holidays: holidays.into_iter().collect(),
        }
    }

    /// True when the date's weekday is a configured working day.
    pub fn is_work_weekday(&self, date: NaiveDate) -> bool {
        self.work_weekdays[date.weekday().num_days_from_monday() as usize]
    }

    /// True for a configured public holiday.
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// A working weekday that is not a public holiday.
    pub fn is_workday(&self, date: NaiveDate) -> bool {
        self.is_work_weekday(date) && !self.is_holiday(date)
    }

    /// All workdays in `[start, end]`; empty when `start > end`.
    pub fn workdays_in(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| self.is_workday(*d))
            .collect()
    }

    /// Number of workdays in `[start, end]`.
    pub fn expected_workdays(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| self.is_workday(*d))
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekend_is_not_workday() {
        let cal = WorkCalendar::default();
        assert!(cal.is_workday(date(2025, 3, 3))); // Monday
        assert!(!cal.is_workday(date(2025, 3, 8))); // Saturday
        assert!(!cal.is_workday(date(2025, 3, 9))); // Sunday
    }

    #[test]
    fn test_holiday_excluded_from_expected_workdays() {
        let plain = WorkCalendar::default();
        let with_holiday = WorkCalendar::new(&[0, 1, 2, 3, 4], [date(2025, 3, 5)]);
        let (start, end) = (date(2025, 3, 3), date(2025, 3, 9));
        assert_eq!(plain.expected_workdays(start, end), 5);
        assert_eq!(with_holiday.expected_workdays(start, end), 4);
        assert!(with_holiday.is_work_weekday(date(2025, 3, 5)));
    }

    #[test]
    fn test_six_day_week() {
        let cal = WorkCalendar::new(&[0, 1, 2, 3, 4, 5], []);
        assert_eq!(cal.expected_workdays(date(2025, 3, 3), date(2025, 3, 9)), 6);
    }

    #[test]
    fn test_reversed_range_is_empty() {
        let cal = WorkCalendar::default();
        assert_eq!(cal.expected_workdays(date(2025, 3, 9), date(2025, 3, 3)), 0);
        assert!(cal.workdays_in(date(2025, 3, 9), date(2025, 3, 3)).is_empty());
    }

    #[test]
    fn test_out_of_range_index_ignored() {
        let cal = WorkCalendar::new(&[0, 9], []);
        assert_eq!(cal.expected_workdays(date(2025, 3, 3), date(2025, 3, 9)), 1);
    }

    proptest! {
        #[test]
        fn prop_expected_workdays_bounded_by_range(offset in 0i64..400, len in 0i64..120) {
            let start = date(2024, 1, 1) + chrono::Duration::days(offset);
            let end = start + chrono::Duration::days(len);
            let cal = WorkCalendar::default();
            let n = cal.expected_workdays(start, end) as i64;
            prop_assert!(n <= len + 1);
            // Any 7 consecutive days contain exactly 5 Mon-Fri days.
            prop_assert!(n >= ((len + 1) / 7) * 5);
            prop_assert_eq!(n as usize, cal.workdays_in(start, end).len());
        }
    }
}
