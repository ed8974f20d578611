//! Weekday arithmetic for collection rescheduling.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Default spacing between collection attempts.
pub const DEFAULT_RESCHEDULE_BUSINESS_DAYS: u32 = 10;

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Adds `count` business days to `start`. The start day is never counted; counting begins
/// on the following day and skips Saturdays and Sundays. Holidays are not considered.
pub fn add_business_days(start: NaiveDate, count: u32) -> NaiveDate {
    let mut current = start;
    let mut added = 0;
    while added < count {
        current = match current.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => return current,
        };
        if is_business_day(current) {
            added += 1;
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn friday_plus_ten_skips_two_weekends() {
        assert_eq!(add_business_days(date(2024, 1, 5), 10), date(2024, 1, 19));
    }

    #[test]
    fn saturday_start_counts_from_monday() {
        assert_eq!(add_business_days(date(2024, 1, 6), 1), date(2024, 1, 8));
    }

    #[test]
    fn zero_days_is_identity() {
        assert_eq!(add_business_days(date(2024, 1, 6), 0), date(2024, 1, 6));
    }

    #[test]
    fn result_is_always_a_weekday() {
        let mut start = date(2024, 2, 1);
        for _ in 0..14 {
            assert!(is_business_day(add_business_days(start, 10)));
            start = start.succ_opt().unwrap();
        }
    }
}
