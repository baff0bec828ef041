//! Report date range calculation
//!
//! The scheduled run requests attendance FOR a window of past days. On a
//! Monday the window stretches back a full week so entries faculty made over
//! the weekend are captured; every other weekday covers yesterday only.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Inclusive calendar date range for one report request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Start date formatted the way the Roll Call form expects (MM/DD/YYYY)
    #[must_use]
    pub fn form_start(&self) -> String {
        self.start.format("%m/%d/%Y").to_string()
    }

    /// End date formatted the way the Roll Call form expects (MM/DD/YYYY)
    #[must_use]
    pub fn form_end(&self) -> String {
        self.end.format("%m/%d/%Y").to_string()
    }
}

/// Compute the report date range for a run happening on `today`.
///
/// `today` is injected rather than read from the clock so the rule can be
/// tested against fixed dates.
#[must_use]
pub fn compute_range(today: NaiveDate) -> DateRange {
    if today.weekday() == Weekday::Mon {
        // Monday: the full prior week, weekend entries included
        DateRange {
            start: today - Duration::days(7),
            end: today,
        }
    } else {
        // Tuesday-Sunday: yesterday only
        let yesterday = today - Duration::days(1);
        DateRange {
            start: yesterday,
            end: yesterday,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monday_covers_the_prior_week_inclusive() {
        // 2024-12-16 is a Monday
        let range = compute_range(date(2024, 12, 16));
        assert_eq!(range.start, date(2024, 12, 9));
        assert_eq!(range.end, date(2024, 12, 16));
        assert_eq!((range.end - range.start).num_days(), 7);
    }

    #[test]
    fn midweek_covers_exactly_yesterday() {
        // 2024-12-18 is a Wednesday
        let range = compute_range(date(2024, 12, 18));
        assert_eq!(range.start, date(2024, 12, 17));
        assert_eq!(range.end, date(2024, 12, 17));
    }

    #[test]
    fn every_non_monday_weekday_is_a_single_day_span() {
        // 2024-12-17 (Tue) through 2024-12-22 (Sun)
        for day in 17..=22 {
            let today = date(2024, 12, day);
            let range = compute_range(today);
            assert_eq!(range.start, range.end, "failed for {today}");
            assert_eq!(range.end, today - Duration::days(1));
        }
    }

    #[test]
    fn start_never_exceeds_end() {
        let mut day = date(2024, 1, 1);
        for _ in 0..366 {
            let range = compute_range(day);
            assert!(range.start <= range.end, "failed for {day}");
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn monday_range_crosses_month_and_year_boundaries() {
        // 2025-01-06 is the first Monday of 2025
        let range = compute_range(date(2025, 1, 6));
        assert_eq!(range.start, date(2024, 12, 30));
        assert_eq!(range.end, date(2025, 1, 6));
    }

    #[test]
    fn form_fields_use_us_date_format() {
        let range = compute_range(date(2024, 12, 18));
        assert_eq!(range.form_start(), "12/17/2024");
        assert_eq!(range.form_end(), "12/17/2024");
    }
}
