//! Calendar-aware time handling for CF-style time axes
//!
//! Time coordinates are stored as numbers relative to a reference date
//! (`"days since 1850-01-01"`). Turning those numbers into dates and back
//! depends on the calendar the model ran with, so every conversion here
//! takes a [`Calendar`] explicitly.

mod calendar;
mod units;

pub use calendar::{Calendar, CalendarDateTime};
pub use units::{TimeStep, TimeUnits};

use thiserror::Error;

/// Errors raised while interpreting time axes
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimeError {
    #[error("Unknown calendar: {0}")]
    UnknownCalendar(String),

    #[error("Invalid time units '{0}': expected '<step> since <date>'")]
    InvalidUnits(String),

    #[error("Date {date} does not exist in the {calendar} calendar")]
    InvalidDate { calendar: Calendar, date: String },

    #[error("Day number {0} is outside the supported date range")]
    OutOfRange(i64),

    #[error("Time value {0} s cannot be expressed as a date")]
    NotRepresentable(f64),
}

/// Result type for time operations
pub type TimeResult<T> = Result<T, TimeError>;
