//! Simulation dates.
//!
//! A date is a day count since the epoch 0.1.1 on a 365-day non-leap
//! calendar with the usual month lengths. One tick advances one day.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

const MONTH_LENGTHS: [u16; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const DAYS_PER_YEAR: i64 = 365;

/// Cumulative days before each month (index 0 = January).
const MONTH_OFFSETS: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Date(i64);

/// Signed day delta between two dates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Timespan(pub i64);

impl Date {
    pub const fn from_days(days: i64) -> Self {
        Date(days)
    }

    /// Build from year/month/day. Month and day are 1-based; out-of-range
    /// components clamp to the nearest valid value.
    pub fn from_ymd(year: i64, month: u8, day: u8) -> Self {
        let month_index = (month.clamp(1, 12) - 1) as usize;
        let max_day = MONTH_LENGTHS[month_index] as u8;
        let day = day.clamp(1, max_day) as i64;
        Date(year * DAYS_PER_YEAR + MONTH_OFFSETS[month_index] + day - 1)
    }

    pub const fn days(self) -> i64 {
        self.0
    }

    pub fn year(self) -> i64 {
        self.0.div_euclid(DAYS_PER_YEAR)
    }

    /// 1-based month.
    pub fn month(self) -> u8 {
        let of_year = self.0.rem_euclid(DAYS_PER_YEAR);
        for (i, &offset) in MONTH_OFFSETS.iter().enumerate().rev() {
            if of_year >= offset {
                return (i + 1) as u8;
            }
        }
        1
    }

    /// 1-based day of month.
    pub fn day(self) -> u8 {
        let of_year = self.0.rem_euclid(DAYS_PER_YEAR);
        let month_index = (self.month() - 1) as usize;
        (of_year - MONTH_OFFSETS[month_index] + 1) as u8
    }

    pub fn is_month_start(self) -> bool {
        self.day() == 1
    }

    pub fn is_year_start(self) -> bool {
        self.0.rem_euclid(DAYS_PER_YEAR) == 0
    }

    pub fn add_days(self, days: i64) -> Self {
        Date(self.0 + days)
    }
}

impl std::ops::Add<Timespan> for Date {
    type Output = Date;
    fn add(self, rhs: Timespan) -> Date {
        Date(self.0 + rhs.0)
    }
}

impl std::ops::Sub<Timespan> for Date {
    type Output = Date;
    fn sub(self, rhs: Timespan) -> Date {
        Date(self.0 - rhs.0)
    }
}

impl std::ops::Sub for Date {
    type Output = Timespan;
    fn sub(self, rhs: Date) -> Timespan {
        Timespan(self.0 - rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDateError {
    #[error("date must have the form Y.M.D")]
    BadShape,
    #[error("date component is not a number")]
    BadNumber,
    #[error("month {0} out of range 1-12")]
    BadMonth(i64),
    #[error("day {0} out of range for the month")]
    BadDay(i64),
}

impl FromStr for Date {
    type Err = ParseDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let (year, month, day) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(y), Some(m), Some(d), None) => (y, m, d),
            _ => return Err(ParseDateError::BadShape),
        };
        let year: i64 = year.parse().map_err(|_| ParseDateError::BadNumber)?;
        let month: i64 = month.parse().map_err(|_| ParseDateError::BadNumber)?;
        let day: i64 = day.parse().map_err(|_| ParseDateError::BadNumber)?;
        if !(1..=12).contains(&month) {
            return Err(ParseDateError::BadMonth(month));
        }
        let max_day = MONTH_LENGTHS[(month - 1) as usize] as i64;
        if !(1..=max_day).contains(&day) {
            return Err(ParseDateError::BadDay(day));
        }
        Ok(Date::from_ymd(year, month as u8, day as u8))
    }
}

impl std::fmt::Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.year(), self.month(), self.day())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ymd_round_trip() {
        let date = Date::from_ymd(1836, 1, 1);
        assert_eq!(date.year(), 1836);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 1);
    }

    #[test]
    fn add_days_crosses_months_and_years() {
        let date = Date::from_ymd(1836, 12, 31).add_days(1);
        assert_eq!((date.year(), date.month(), date.day()), (1837, 1, 1));

        let feb = Date::from_ymd(1837, 2, 28).add_days(1);
        assert_eq!((feb.month(), feb.day()), (3, 1)); // no leap years
    }

    #[test]
    fn parse_and_display_round_trip() {
        for text in ["1836.1.1", "1861.7.14", "1935.12.31"] {
            let date: Date = text.parse().unwrap();
            assert_eq!(date.to_string(), text);
        }
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!("1836".parse::<Date>().is_err());
        assert!("1836.13.1".parse::<Date>().is_err());
        assert!("1836.2.30".parse::<Date>().is_err());
        assert!("1836.x.1".parse::<Date>().is_err());
        assert!("1836.1.1.5".parse::<Date>().is_err());
    }

    #[test]
    fn timespans() {
        let a = Date::from_ymd(1836, 1, 1);
        let b = Date::from_ymd(1837, 1, 1);
        assert_eq!(b - a, Timespan(365));
        assert_eq!(a + Timespan(365), b);
        assert_eq!(b - Timespan(365), a);
    }

    #[test]
    fn month_boundaries() {
        let start = Date::from_ymd(1840, 1, 1);
        assert!(start.is_month_start());
        assert!(start.is_year_start());
        assert!(!start.add_days(1).is_month_start());
        assert!(Date::from_ymd(1840, 6, 1).is_month_start());
    }
}
