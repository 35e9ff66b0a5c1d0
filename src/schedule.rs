use chrono::{Datelike, NaiveDate};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::calendar::{clamped_date, days_between, shift_month, BusinessCalendar};
use crate::errors::{CreditError, Result};

/// inputs that fully determine a schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleKey {
    pub operation_date: NaiveDate,
    pub anchor_day: u32,
    pub term: u32,
    pub grace_days: u32,
}

/// one row of a schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueDate {
    pub date: NaiveDate,
    /// calendar days from the operation date
    pub days_since_operation: u32,
}

/// generated due dates, seed row first
#[derive(Debug, Clone)]
pub struct Schedule {
    pub key: ScheduleKey,
    pub dates: Arc<[DueDate]>,
    pub from_cache: bool,
}

impl Schedule {
    /// rows after the seed
    pub fn installments(&self) -> &[DueDate] {
        self.dates.get(1..).unwrap_or(&[])
    }

    pub fn first_due(&self) -> Option<NaiveDate> {
        self.installments().first().map(|d| d.date)
    }

    pub fn last_due(&self) -> Option<NaiveDate> {
        self.installments().last().map(|d| d.date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// builds installment schedules and memoizes them per key
pub struct ScheduleGenerator {
    calendar: Arc<BusinessCalendar>,
    cache: RwLock<HashMap<ScheduleKey, Arc<[DueDate]>>>,
}

impl ScheduleGenerator {
    pub fn new(calendar: Arc<BusinessCalendar>) -> Self {
        Self {
            calendar,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    pub fn cached_schedules(&self) -> usize {
        self.cache.read().len()
    }

    pub fn clear_cache(&self) {
        self.cache.write().clear();
    }

    /// schedule for `key`, from the cache when already built
    pub fn generate(&self, key: ScheduleKey) -> Result<Schedule> {
        if let Some(dates) = self.cache.read().get(&key) {
            return Ok(Schedule {
                key,
                dates: Arc::clone(dates),
                from_cache: true,
            });
        }

        let dates: Arc<[DueDate]> = self.build(&key)?.into();
        tracing::debug!(?key, rows = dates.len(), "schedule generated");

        let dates = Arc::clone(self.cache.write().entry(key).or_insert(dates));
        Ok(Schedule {
            key,
            dates,
            from_cache: false,
        })
    }

    fn build(&self, key: &ScheduleKey) -> Result<Vec<DueDate>> {
        if key.term == 0 {
            return Err(CreditError::invalid_input("term must be at least one installment"));
        }
        if !(1..=31).contains(&key.anchor_day) {
            return Err(CreditError::invalid_input(format!(
                "anchor day must be between 1 and 31, got {}",
                key.anchor_day
            )));
        }

        let operation = key.operation_date;
        let grace = i64::from(key.grace_days);

        // months are counted from the unresolved anchor so rolls never drift the series
        let (mut year, mut month) = (operation.year(), operation.month());
        let mut anchor = self.anchor(year, month, key.anchor_day);
        let mut attempts = 0;
        loop {
            let elapsed = days_between(operation, anchor);
            if elapsed > 0 && elapsed >= grace {
                break;
            }

            attempts += 1;
            if attempts > self.calendar.max_anchor_attempts() {
                return Err(CreditError::CalendarLoop {
                    date: operation,
                    attempts,
                });
            }

            (year, month) = shift_month(year, month, 1);
            anchor = self.anchor(year, month, key.anchor_day);
        }

        let mut dates = Vec::with_capacity(key.term as usize + 1);
        dates.push(DueDate {
            date: operation,
            days_since_operation: 0,
        });

        for i in 0..key.term {
            let (y, m) = shift_month(year, month, i);
            let date = self.anchor(y, m, key.anchor_day);
            let elapsed = u32::try_from(days_between(operation, date))
                .map_err(|_| CreditError::calculation(format!("due date {} precedes {}", date, operation)))?;

            dates.push(DueDate {
                date,
                days_since_operation: elapsed,
            });
        }

        Ok(dates)
    }

    // short months clamp to their last day; anchored_due_date's month-after-next fallback is not used here
    fn anchor(&self, year: i32, month: u32, day: u32) -> NaiveDate {
        self.calendar.resolve_or_next(clamped_date(year, month, day))
    }
}
