//! Time helpers
//!
//! Bookings store a calendar date plus an "HH:MM" time of day; every
//! comparison in the core happens on `i64` Unix millis.

use chrono::{NaiveDate, NaiveTime};

use crate::error::{CoreError, CoreResult};

/// Parse an "HH:MM" time-of-day string.
pub fn parse_time_hhmm(time: &str) -> CoreResult<NaiveTime> {
    NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| CoreError::Validation(format!("Invalid time format: {}", time)))
}

/// Combine a booking date and "HH:MM" time into Unix millis.
pub fn booking_datetime_millis(date: NaiveDate, time: &str) -> CoreResult<i64> {
    let time = parse_time_hhmm(time)?;
    Ok(date.and_time(time).and_utc().timestamp_millis())
}

/// Minutes-of-day distance between two "HH:MM" times.
pub fn minutes_apart(a: &str, b: &str) -> CoreResult<i64> {
    let a = parse_time_hhmm(a)?;
    let b = parse_time_hhmm(b)?;
    let a_minutes = i64::from(chrono::Timelike::hour(&a)) * 60 + i64::from(chrono::Timelike::minute(&a));
    let b_minutes = i64::from(chrono::Timelike::hour(&b)) * 60 + i64::from(chrono::Timelike::minute(&b));
    Ok((a_minutes - b_minutes).abs())
}

pub const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;
