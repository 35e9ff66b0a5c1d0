//! business day calendar
//!
//! Weekends and brazilian national holidays are non-business days. Holiday
//! sets are computed once per year and kept in a cache owned by the
//! calendar, so one instance can be shared between threads.

pub mod holidays;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::CalendarConfig;
use crate::errors::{CreditError, Result};

pub use holidays::{easter_sunday, national_holidays};

type HolidaySet = Arc<HashSet<NaiveDate>>;

/// holiday and weekend aware calendar
#[derive(Debug)]
pub struct BusinessCalendar {
    extra_holidays: Vec<(u32, u32)>,
    max_anchor_attempts: u32,
    holidays: RwLock<HashMap<i32, HolidaySet>>,
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::new(&CalendarConfig::default(), 100)
    }
}

impl BusinessCalendar {
    pub fn new(config: &CalendarConfig, max_anchor_attempts: u32) -> Self {
        Self {
            extra_holidays: config.extra_holidays.clone(),
            max_anchor_attempts,
            holidays: RwLock::new(HashMap::new()),
        }
    }

    pub fn max_anchor_attempts(&self) -> u32 {
        self.max_anchor_attempts
    }

    /// holiday set for a year, computed on first use
    pub fn holidays(&self, year: i32) -> HolidaySet {
        if let Some(set) = self.holidays.read().get(&year) {
            return Arc::clone(set);
        }

        let mut cache = self.holidays.write();
        let set = cache.entry(year).or_insert_with(|| {
            tracing::debug!(year, "computing holiday set");
            Arc::new(national_holidays(year, &self.extra_holidays))
        });
        Arc::clone(set)
    }

    /// number of years currently cached
    pub fn cached_years(&self) -> usize {
        self.holidays.read().len()
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays(date.year()).contains(&date)
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }

    /// first business day strictly after `date`
    pub fn next_business_day(&self, date: NaiveDate) -> NaiveDate {
        let mut current = date + Duration::days(1);
        while !self.is_business_day(current) {
            current += Duration::days(1);
        }
        current
    }

    /// `date` itself when it is a business day, else the next one
    pub fn resolve_or_next(&self, date: NaiveDate) -> NaiveDate {
        if self.is_business_day(date) {
            date
        } else {
            self.next_business_day(date)
        }
    }

    /// next date falling on `day_of_month`, starting from the month of `from`
    ///
    /// The current month is used while the day is still reachable (`inclusive`
    /// allows `from` itself). Otherwise the same day of the next month is
    /// used, and when that month has no such day the result is the last day
    /// of the month after next.
    pub fn anchored_due_date(&self, from: NaiveDate, day_of_month: u32, inclusive: bool) -> Result<NaiveDate> {
        if !(1..=31).contains(&day_of_month) {
            return Err(CreditError::invalid_input(format!(
                "day of month must be between 1 and 31, got {}",
                day_of_month
            )));
        }

        let today = from.day();
        let reachable = if inclusive { today <= day_of_month } else { today < day_of_month };
        if reachable {
            if let Some(candidate) = NaiveDate::from_ymd_opt(from.year(), from.month(), day_of_month) {
                return Ok(candidate);
            }
        }

        let (year, month) = shift_month(from.year(), from.month(), 1);
        if let Some(candidate) = NaiveDate::from_ymd_opt(year, month, day_of_month) {
            return Ok(candidate);
        }

        let (year, month) = shift_month(from.year(), from.month(), 2);
        Ok(last_day_of_month(year, month))
    }

    /// resolve to a business day, re-anchoring to day 1 of the following
    /// month whenever the roll lands past `max_anchor_day`
    pub fn anchor_resolved_to_business_day(&self, date: NaiveDate, max_anchor_day: u32) -> Result<NaiveDate> {
        let mut current = date;
        let mut attempts = 0;

        loop {
            current = self.resolve_or_next(current);

            let day = current.day();
            let target = if day > max_anchor_day { 1 } else { day };
            if target != day {
                current = self.anchored_due_date(current, target, false)?;
            }

            attempts += 1;
            if attempts > self.max_anchor_attempts {
                tracing::warn!(%date, attempts, "anchor resolution exceeded its guard");
                return Err(CreditError::CalendarLoop { date, attempts });
            }

            if self.is_business_day(current) {
                return Ok(current);
            }
        }
    }

    /// business days in the closed interval between two dates
    pub fn business_days_between(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| self.is_business_day(*d))
            .count() as u32
    }
}

/// signed calendar days from `start` to `end`
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    last_day_of_month(year, month).day()
}

/// (year, month) moved forward by `months`
pub fn shift_month(year: i32, month: u32, months: u32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + months as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// date for `day` in the given month, clamped to the month length
pub fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let day = day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(|| last_day_of_month(year, month))
}

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = shift_month(year, month, 1);
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekends_and_holidays() {
        let cal = BusinessCalendar::default();

        assert!(cal.is_business_day(ymd(2025, 1, 2))); // thursday
        assert!(!cal.is_business_day(ymd(2025, 1, 4))); // saturday
        assert!(!cal.is_business_day(ymd(2025, 1, 5))); // sunday
        assert!(!cal.is_business_day(ymd(2025, 1, 1))); // new year
        assert!(!cal.is_business_day(ymd(2025, 3, 4))); // carnaval
        assert!(!cal.is_business_day(ymd(2025, 6, 19))); // corpus christi
        assert!(cal.is_business_day(ymd(2025, 11, 20))); // not in the default set
    }

    #[test]
    fn test_extra_holidays_from_config() {
        let config = CalendarConfig { extra_holidays: vec![(11, 20)] };
        let cal = BusinessCalendar::new(&config, 100);

        assert!(!cal.is_business_day(ymd(2025, 11, 20)));
    }

    #[test]
    fn test_holiday_cache_is_per_year() {
        let cal = BusinessCalendar::default();
        assert_eq!(cal.cached_years(), 0);

        cal.is_business_day(ymd(2025, 5, 2));
        cal.is_business_day(ymd(2025, 8, 2));
        assert_eq!(cal.cached_years(), 1);

        cal.is_business_day(ymd(2026, 1, 2));
        assert_eq!(cal.cached_years(), 2);
        assert!(Arc::ptr_eq(&cal.holidays(2025), &cal.holidays(2025)));
    }

    #[test]
    fn test_next_business_day_skips_given_date() {
        let cal = BusinessCalendar::default();

        // friday -> monday
        assert_eq!(cal.next_business_day(ymd(2025, 1, 3)), ymd(2025, 1, 6));
        // friday before carnaval monday/tuesday: mon 3rd is a business day
        assert_eq!(cal.next_business_day(ymd(2025, 2, 28)), ymd(2025, 3, 3));
        // monday -> wednesday across carnaval tuesday
        assert_eq!(cal.next_business_day(ymd(2025, 3, 3)), ymd(2025, 3, 5));
    }

    #[test]
    fn test_resolve_or_next() {
        let cal = BusinessCalendar::default();

        assert_eq!(cal.resolve_or_next(ymd(2025, 1, 2)), ymd(2025, 1, 2));
        assert_eq!(cal.resolve_or_next(ymd(2025, 1, 1)), ymd(2025, 1, 2));
        // easter weekend, friday to monday
        assert_eq!(cal.resolve_or_next(ymd(2025, 4, 18)), ymd(2025, 4, 22));
    }

    #[test]
    fn test_anchored_due_date_current_month() {
        let cal = BusinessCalendar::default();

        assert_eq!(cal.anchored_due_date(ymd(2025, 5, 10), 10, true).unwrap(), ymd(2025, 5, 10));
        assert_eq!(cal.anchored_due_date(ymd(2025, 5, 10), 10, false).unwrap(), ymd(2025, 6, 10));
        assert_eq!(cal.anchored_due_date(ymd(2025, 5, 3), 20, false).unwrap(), ymd(2025, 5, 20));
    }

    #[test]
    fn test_anchored_due_date_next_month() {
        let cal = BusinessCalendar::default();

        assert_eq!(cal.anchored_due_date(ymd(2025, 5, 25), 5, true).unwrap(), ymd(2025, 6, 5));
        // day 31 missing in april, may has it
        assert_eq!(cal.anchored_due_date(ymd(2025, 4, 10), 31, true).unwrap(), ymd(2025, 5, 31));
        assert_eq!(cal.anchored_due_date(ymd(2025, 12, 20), 15, true).unwrap(), ymd(2026, 1, 15));
    }

    #[test]
    fn test_anchored_due_date_falls_back_to_month_after_next() {
        let cal = BusinessCalendar::default();

        // 31 already passed in january and february has no 31st
        assert_eq!(cal.anchored_due_date(ymd(2025, 1, 31), 31, false).unwrap(), ymd(2025, 3, 31));
        // 30 in a leap february
        assert_eq!(cal.anchored_due_date(ymd(2024, 1, 30), 30, false).unwrap(), ymd(2024, 3, 31));
        // june has no 31st, july does
        assert_eq!(cal.anchored_due_date(ymd(2025, 5, 31), 31, false).unwrap(), ymd(2025, 7, 31));
    }

    #[test]
    fn test_anchored_due_date_rejects_bad_day() {
        let cal = BusinessCalendar::default();

        assert!(matches!(
            cal.anchored_due_date(ymd(2025, 1, 1), 0, true),
            Err(CreditError::InvalidInput { .. })
        ));
        assert!(cal.anchored_due_date(ymd(2025, 1, 1), 32, true).is_err());
    }

    #[test]
    fn test_anchor_resolved_to_business_day() {
        let cal = BusinessCalendar::default();

        // already a business day within the limit
        assert_eq!(cal.anchor_resolved_to_business_day(ymd(2025, 5, 12), 28).unwrap(), ymd(2025, 5, 12));

        // saturday 2025-03-29 rolls to monday 31st, past 28, re-anchored to april 1st
        assert_eq!(cal.anchor_resolved_to_business_day(ymd(2025, 3, 29), 28).unwrap(), ymd(2025, 4, 1));

        // 2026-01-01 is a holiday; 2nd is a friday
        assert_eq!(cal.anchor_resolved_to_business_day(ymd(2025, 12, 31), 28).unwrap(), ymd(2026, 1, 2));
    }

    #[test]
    fn test_anchor_resolution_guard() {
        let cal = BusinessCalendar::new(&CalendarConfig::default(), 0);

        let err = cal.anchor_resolved_to_business_day(ymd(2025, 5, 12), 28).unwrap_err();
        assert_eq!(err, CreditError::CalendarLoop { date: ymd(2025, 5, 12), attempts: 1 });
    }

    #[test]
    fn test_business_days_between() {
        let cal = BusinessCalendar::default();

        // mon 6th .. fri 10th january 2025
        assert_eq!(cal.business_days_between(ymd(2025, 1, 6), ymd(2025, 1, 10)), 5);
        assert_eq!(cal.business_days_between(ymd(2025, 1, 10), ymd(2025, 1, 6)), 5);
        // whole week of carnaval 2025: 3rd..7th, tuesday off
        assert_eq!(cal.business_days_between(ymd(2025, 3, 3), ymd(2025, 3, 9)), 4);
    }

    #[test]
    fn test_month_helpers() {
        assert_eq!(shift_month(2025, 11, 3), (2026, 2));
        assert_eq!(shift_month(2025, 1, 0), (2025, 1));
        assert_eq!(clamped_date(2025, 2, 31), ymd(2025, 2, 28));
        assert_eq!(clamped_date(2024, 2, 31), ymd(2024, 2, 29));
        assert_eq!(last_day_of_month(2025, 12), ymd(2025, 12, 31));
        assert_eq!(days_between(ymd(2025, 1, 31), ymd(2025, 3, 1)), 29);
        assert_eq!(days_between(ymd(2025, 3, 1), ymd(2025, 1, 31)), -29);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2025, 1), 31);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
    }
}
