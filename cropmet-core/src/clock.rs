//! Simulation calendar
//!
//! The [`Clock`] steps one day at a time from a start date to an end date
//! inclusive. [`DayMonth`] is a yearless date used for season boundaries and
//! the sampler's year split.

use crate::errors::{MetError, MetResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
}

impl Clock {
    pub fn new(start: NaiveDate, end: NaiveDate) -> MetResult<Self> {
        if end < start {
            return Err(MetError::InvalidParameter {
                name: "end".to_string(),
                message: format!("end date {end} is before start date {start}"),
            });
        }
        Ok(Self {
            start,
            end,
            today: start,
        })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn tomorrow(&self) -> Option<NaiveDate> {
        self.today.succ_opt()
    }

    pub fn day_of_year(&self) -> u32 {
        self.today.ordinal()
    }

    /// Move to the next day. Returns `false` once past the end date.
    pub fn advance(&mut self) -> bool {
        if let Some(next) = self.today.succ_opt() {
            self.today = next;
        }
        !self.finished()
    }

    pub fn finished(&self) -> bool {
        self.today > self.end
    }

    /// Restart from the start date.
    pub fn reset(&mut self) {
        self.today = self.start;
    }

    /// Number of days from start to end inclusive.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// A day of a month with no year, written like `1-dec` or `15-3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayMonth {
    day: u32,
    month: u32,
}

impl DayMonth {
    pub fn new(day: u32, month: u32) -> MetResult<Self> {
        // 2000 is a leap year so the 29th of February is allowed.
        NaiveDate::from_ymd_opt(2000, month, day)
            .map(|_| Self { day, month })
            .ok_or_else(|| MetError::InvalidDayMonth(format!("{day}-{month}")))
    }

    /// First day of `month` (1-12).
    pub(crate) const fn first_of(month: u32) -> Self {
        Self { day: 1, month }
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        date.day() == self.day && date.month() == self.month
    }

    /// This day-month in `year`, `None` for the 29th of February of a common year.
    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }
}

impl FromStr for DayMonth {
    type Err = MetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MetError::InvalidDayMonth(s.to_string());
        let (day, month) = s
            .trim()
            .split_once(['-', '/', ' '])
            .ok_or_else(invalid)?;
        let day: u32 = day.trim().parse().map_err(|_| invalid())?;
        let month = month.trim();
        let month = match month.parse::<u32>() {
            Ok(m) => m,
            Err(_) => {
                let lower = month.to_ascii_lowercase();
                MONTHS
                    .iter()
                    .position(|m| lower.starts_with(m))
                    .map(|i| i as u32 + 1)
                    .ok_or_else(invalid)?
            }
        };
        DayMonth::new(day, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for DayMonth {
    type Error = MetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayMonth> for String {
    fn from(value: DayMonth) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DayMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.day, MONTHS[(self.month - 1) as usize])
    }
}
