//! CF time units: `"<step> since <reference date>"`

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Calendar, CalendarDateTime, TimeError, TimeResult};

/// Length of one unit of a time coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeStep {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeStep {
    pub fn seconds(&self) -> f64 {
        match self {
            Self::Days => 86_400.0,
            Self::Hours => 3_600.0,
            Self::Minutes => 60.0,
            Self::Seconds => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Days => "days",
            Self::Hours => "hours",
            Self::Minutes => "minutes",
            Self::Seconds => "seconds",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "days" | "day" | "d" => Some(Self::Days),
            "hours" | "hour" | "hrs" | "hr" | "h" => Some(Self::Hours),
            "minutes" | "minute" | "mins" | "min" => Some(Self::Minutes),
            "seconds" | "second" | "secs" | "sec" | "s" => Some(Self::Seconds),
            _ => None,
        }
    }
}

/// Units of a time coordinate
///
/// Calendar independent: the same units can be read in any calendar in
/// which the reference date exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeUnits {
    pub step: TimeStep,
    pub reference: CalendarDateTime,
}

impl TimeUnits {
    pub fn new(step: TimeStep, reference: CalendarDateTime) -> Self {
        Self { step, reference }
    }

    /// `days since <reference>`
    pub fn days_since(reference: CalendarDateTime) -> Self {
        Self::new(TimeStep::Days, reference)
    }

    /// Interpret a time coordinate value as a date.
    pub fn num2date(&self, value: f64, calendar: Calendar) -> TimeResult<CalendarDateTime> {
        let origin = calendar.to_seconds(&self.reference)?;
        calendar.from_seconds(origin + value * self.step.seconds())
    }

    /// Express a date as a time coordinate value.
    pub fn date2num(&self, date: &CalendarDateTime, calendar: Calendar) -> TimeResult<f64> {
        let origin = calendar.to_seconds(&self.reference)?;
        let target = calendar.to_seconds(date)?;
        Ok((target - origin) / self.step.seconds())
    }

    /// Linear map from values in these units to values in `other`:
    /// `other_value = value * scale + offset`.
    pub fn rebase(&self, other: &TimeUnits, calendar: Calendar) -> TimeResult<(f64, f64)> {
        let origin = calendar.to_seconds(&self.reference)?;
        let other_origin = calendar.to_seconds(&other.reference)?;
        let scale = self.step.seconds() / other.step.seconds();
        let offset = (origin - other_origin) / other.step.seconds();
        Ok((scale, offset))
    }
}

impl fmt::Display for TimeUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} since {}", self.step.as_str(), self.reference)
    }
}

impl std::str::FromStr for TimeUnits {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TimeError::InvalidUnits(s.to_string());
        let (step, reference) = s.trim().split_once(" since ").ok_or_else(invalid)?;
        let step = TimeStep::parse(step.trim()).ok_or_else(invalid)?;
        let reference = parse_reference(reference).ok_or_else(invalid)?;
        Ok(Self { step, reference })
    }
}

impl TryFrom<String> for TimeUnits {
    type Error = TimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeUnits> for String {
    fn from(units: TimeUnits) -> Self {
        units.to_string()
    }
}

/// Parse `1850-1-1`, `1850-01-01 00:00:00`, `1850-01-01T00:00:00Z` and
/// `1850-01-01 00:00:00 UTC`.
fn parse_reference(s: &str) -> Option<CalendarDateTime> {
    let s = s.trim();
    let s = s
        .strip_suffix("UTC")
        .or_else(|| s.strip_suffix("utc"))
        .or_else(|| s.strip_suffix('Z'))
        .unwrap_or(s)
        .trim();
    let normalized = s.replacen('T', " ", 1);
    let mut parts = normalized.split_whitespace();
    let date = parts.next()?;
    let time = parts.next();
    if parts.next().is_some() {
        return None;
    }

    let mut ymd = date.splitn(3, '-');
    let year = ymd.next()?.parse::<i32>().ok()?;
    let month = ymd.next()?.parse::<u32>().ok()?;
    let day = ymd.next()?.parse::<u32>().ok()?;
    let mut dt = CalendarDateTime::ymd(year, month, day);

    if let Some(time) = time {
        let mut hms = time.splitn(3, ':');
        let hour = hms.next()?.parse::<u32>().ok()?;
        let minute = hms.next().map(|m| m.parse::<u32>()).transpose().ok()?.unwrap_or(0);
        let second = hms.next().map(|s| s.parse::<f64>()).transpose().ok()?.unwrap_or(0.0);
        dt = dt.with_time(hour, minute, second);
    }
    Some(dt)
}
