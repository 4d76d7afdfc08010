//! Calendars and day numbering

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{TimeError, TimeResult};

/// Offset between chrono's day-of-common-era and the Julian Day Number.
const CE_TO_JDN: i64 = 1_721_425;

/// JDN of 1582-10-15, the first Gregorian day of the standard calendar.
const GREGORIAN_SWITCH_JDN: i64 = 2_299_161;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Largest day number accepted on any calendar's scale, about 270 000 years
/// either side of day zero. Covers every date chrono can represent.
const MAX_DAY_NUMBER: i64 = 100_000_000;

const CUM_DAYS_365: [u32; 13] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334, 365];
const CUM_DAYS_366: [u32; 13] = [0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335, 366];

/// Calendar of a time axis
///
/// Two axes with different calendars cannot be compared point for point;
/// `gregorian` and `standard` are the same calendar, as are `noleap` and
/// `365_day`, `all_leap` and `366_day`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Calendar {
    /// Mixed Julian/Gregorian, switching on 1582-10-15
    #[serde(rename = "standard", alias = "gregorian")]
    Standard,
    #[serde(rename = "proleptic_gregorian")]
    ProlepticGregorian,
    #[serde(rename = "noleap", alias = "365_day")]
    NoLeap,
    #[serde(rename = "all_leap", alias = "366_day")]
    AllLeap,
    #[serde(rename = "360_day")]
    Day360,
    #[serde(rename = "julian")]
    Julian,
}

impl Calendar {
    /// Canonical CF name of the calendar
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::ProlepticGregorian => "proleptic_gregorian",
            Self::NoLeap => "noleap",
            Self::AllLeap => "all_leap",
            Self::Day360 => "360_day",
            Self::Julian => "julian",
        }
    }

    pub fn is_leap_year(&self, year: i32) -> bool {
        match self {
            Self::Standard if year > 1582 => gregorian_leap(year),
            Self::Standard | Self::Julian => year.rem_euclid(4) == 0,
            Self::ProlepticGregorian => gregorian_leap(year),
            Self::NoLeap | Self::Day360 => false,
            Self::AllLeap => true,
        }
    }

    pub fn days_in_month(&self, year: i32, month: u32) -> u32 {
        if *self == Self::Day360 {
            return 30;
        }
        let table = if self.is_leap_year(year) { &CUM_DAYS_366 } else { &CUM_DAYS_365 };
        let m = month.clamp(1, 12) as usize;
        table[m] - table[m - 1]
    }

    /// Check that a date exists in this calendar.
    pub fn validate(&self, date: &CalendarDateTime) -> TimeResult<()> {
        let invalid = || TimeError::InvalidDate {
            calendar: *self,
            date: date.to_string(),
        };
        if !(1..=12).contains(&date.month) || date.day == 0 {
            return Err(invalid());
        }
        if date.day > self.days_in_month(date.year, date.month) {
            return Err(invalid());
        }
        if date.hour > 23 || date.minute > 59 || !(0.0..60.0).contains(&date.second) {
            return Err(invalid());
        }
        // Ten days were dropped when the standard calendar switched over
        if *self == Self::Standard
            && date.year == 1582
            && date.month == 10
            && (5..=14).contains(&date.day)
        {
            return Err(invalid());
        }
        Ok(())
    }

    /// Count of days on a calendar-specific linear scale.
    ///
    /// Only differences between day numbers of the same calendar are
    /// meaningful. The Gregorian and Julian calendars use the Julian Day
    /// Number so that the standard calendar can mix them.
    pub fn day_number(&self, year: i32, month: u32, day: u32) -> TimeResult<i64> {
        if !(1..=12).contains(&month) {
            return Err(TimeError::InvalidDate {
                calendar: *self,
                date: format!("{:04}-{:02}-{:02}", year, month, day),
            });
        }
        let y = year as i64;
        match self {
            Self::ProlepticGregorian => gregorian_jdn(year, month, day),
            Self::Julian => Ok(julian_jdn(year, month, day)),
            Self::Standard => {
                if (year, month, day) >= (1582, 10, 15) {
                    gregorian_jdn(year, month, day)
                } else {
                    Ok(julian_jdn(year, month, day))
                }
            }
            Self::NoLeap => Ok(y * 365 + CUM_DAYS_365[month as usize - 1] as i64 + day as i64 - 1),
            Self::AllLeap => Ok(y * 366 + CUM_DAYS_366[month as usize - 1] as i64 + day as i64 - 1),
            Self::Day360 => Ok(y * 360 + (month as i64 - 1) * 30 + day as i64 - 1),
        }
    }

    /// Inverse of [`Calendar::day_number`]: `(year, month, day)`.
    pub fn from_day_number(&self, n: i64) -> TimeResult<(i32, u32, u32)> {
        if !(-MAX_DAY_NUMBER..=MAX_DAY_NUMBER).contains(&n) {
            return Err(TimeError::OutOfRange(n));
        }
        match self {
            Self::ProlepticGregorian => gregorian_from_jdn(n),
            Self::Julian => julian_from_jdn(n),
            Self::Standard => {
                if n >= GREGORIAN_SWITCH_JDN {
                    gregorian_from_jdn(n)
                } else {
                    julian_from_jdn(n)
                }
            }
            Self::NoLeap => fixed_year_from_day_number(n, &CUM_DAYS_365),
            Self::AllLeap => fixed_year_from_day_number(n, &CUM_DAYS_366),
            Self::Day360 => {
                let year = i32::try_from(n.div_euclid(360)).map_err(|_| TimeError::OutOfRange(n))?;
                let rem = n.rem_euclid(360);
                Ok((year, (rem / 30 + 1) as u32, (rem % 30 + 1) as u32))
            }
        }
    }

    /// Seconds elapsed since the calendar's day zero.
    pub fn to_seconds(&self, date: &CalendarDateTime) -> TimeResult<f64> {
        self.validate(date)?;
        let days = self.day_number(date.year, date.month, date.day)?;
        Ok(days as f64 * SECONDS_PER_DAY + date.seconds_of_day())
    }

    /// Inverse of [`Calendar::to_seconds`], rounded to the microsecond.
    ///
    /// Non-finite values and values beyond the supported day range (such as
    /// a `1e20` fill value) are rejected rather than saturated.
    pub fn from_seconds(&self, seconds: f64) -> TimeResult<CalendarDateTime> {
        let whole_days = (seconds / SECONDS_PER_DAY).floor();
        if !whole_days.is_finite() || whole_days.abs() > MAX_DAY_NUMBER as f64 {
            return Err(TimeError::NotRepresentable(seconds));
        }
        let mut days = whole_days as i64;
        let mut sod = ((seconds - days as f64 * SECONDS_PER_DAY) * 1e6).round() / 1e6;
        if sod >= SECONDS_PER_DAY {
            days += 1;
            sod -= SECONDS_PER_DAY;
        }
        let (year, month, day) = self.from_day_number(days)?;
        let hour = (sod / 3600.0).floor() as u32;
        let minute = ((sod - hour as f64 * 3600.0) / 60.0).floor() as u32;
        let second = sod - hour as f64 * 3600.0 - minute as f64 * 60.0;
        Ok(CalendarDateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Calendar {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "gregorian" => Ok(Self::Standard),
            "proleptic_gregorian" => Ok(Self::ProlepticGregorian),
            "noleap" | "365_day" => Ok(Self::NoLeap),
            "all_leap" | "366_day" => Ok(Self::AllLeap),
            "360_day" => Ok(Self::Day360),
            "julian" => Ok(Self::Julian),
            other => Err(TimeError::UnknownCalendar(other.to_string())),
        }
    }
}

/// A date and time of day in some calendar
///
/// Field order makes the derived ordering chronological for valid dates.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct CalendarDateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: f64,
}

impl CalendarDateTime {
    /// Midnight on the given day
    pub fn ymd(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
            second: 0.0,
        }
    }

    pub fn with_time(mut self, hour: u32, minute: u32, second: f64) -> Self {
        self.hour = hour;
        self.minute = minute;
        self.second = second;
        self
    }

    pub fn seconds_of_day(&self) -> f64 {
        self.hour as f64 * 3600.0 + self.minute as f64 * 60.0 + self.second
    }
}

impl fmt::Display for CalendarDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:",
            self.year, self.month, self.day, self.hour, self.minute
        )?;
        if self.second.fract() == 0.0 {
            write!(f, "{:02}", self.second as u32)
        } else {
            write!(f, "{:09.6}", self.second)
        }
    }
}

fn gregorian_leap(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn gregorian_jdn(year: i32, month: u32, day: u32) -> TimeResult<i64> {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|d| d.num_days_from_ce() as i64 + CE_TO_JDN)
        .ok_or(TimeError::InvalidDate {
            calendar: Calendar::ProlepticGregorian,
            date: format!("{:04}-{:02}-{:02}", year, month, day),
        })
}

fn gregorian_from_jdn(n: i64) -> TimeResult<(i32, u32, u32)> {
    let ce = i32::try_from(n - CE_TO_JDN).map_err(|_| TimeError::OutOfRange(n))?;
    NaiveDate::from_num_days_from_ce_opt(ce)
        .map(|d| (d.year(), d.month(), d.day()))
        .ok_or(TimeError::OutOfRange(n))
}

fn julian_jdn(year: i32, month: u32, day: u32) -> i64 {
    let a = (14 - month as i64) / 12;
    let y = year as i64 + 4800 - a;
    let m = month as i64 + 12 * a - 3;
    day as i64 + (153 * m + 2) / 5 + 365 * y + y.div_euclid(4) - 32083
}

fn julian_from_jdn(n: i64) -> TimeResult<(i32, u32, u32)> {
    let c = n.checked_add(32082).ok_or(TimeError::OutOfRange(n))?;
    let d = (4 * c + 3).div_euclid(1461);
    let e = c - (1461 * d).div_euclid(4);
    let m = (5 * e + 2) / 153;
    let day = e - (153 * m + 2) / 5 + 1;
    let month = m + 3 - 12 * (m / 10);
    let year = i32::try_from(d - 4800 + m / 10).map_err(|_| TimeError::OutOfRange(n))?;
    Ok((year, month as u32, day as u32))
}

fn fixed_year_from_day_number(n: i64, table: &[u32; 13]) -> TimeResult<(i32, u32, u32)> {
    let len = table[12] as i64;
    let year = i32::try_from(n.div_euclid(len)).map_err(|_| TimeError::OutOfRange(n))?;
    let rem = n.rem_euclid(len) as u32;
    let month = (1..=12).find(|&m| rem < table[m]).unwrap_or(12);
    Ok((year, month as u32, rem - table[month - 1] + 1))
}
